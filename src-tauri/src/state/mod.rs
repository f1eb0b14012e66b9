use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::{AbortHandle, JoinHandle};

use crate::auth::CredentialStore;
use crate::config::AppConfig;
use crate::db::{DatabaseDriver, MockDriver};
use crate::error::{AppError, AppResult};
use crate::generator::{format_sql, MockGenerator, QueryGenerator};
use crate::history::HistoryLog;
use crate::models::{
    DbConfig, HistoryEntry, QueryOutcome, StatusUpdate, User, Workspace, WorkspaceId,
};
use crate::routes::Route;
use crate::storage::{FileStore, KeyValueStore};
use crate::workspace::WorkspaceRegistry;

struct Attempt {
    id: u64,
    abort: AbortHandle,
}

/// In-flight connection attempts, at most one per workspace.
pub struct ConnectionRegistry {
    attempts: Mutex<HashMap<WorkspaceId, Attempt>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn is_connecting(&self, workspace_id: WorkspaceId) -> AppResult<bool> {
        Ok(self.attempts.lock()?.contains_key(&workspace_id))
    }
}

/// Lives inside the attempt's task. If the task unwinds before
/// `finish_attempt` runs, the attempt is released and the workspace marked
/// failed so it can be retried.
struct AttemptGuard {
    registry: Arc<ConnectionRegistry>,
    workspaces: Arc<Mutex<WorkspaceRegistry>>,
    workspace_id: WorkspaceId,
    attempt_id: u64,
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        let Ok(mut attempts) = self.registry.attempts.lock() else {
            return;
        };
        if attempts.get(&self.workspace_id).map(|a| a.id) != Some(self.attempt_id) {
            return;
        }
        attempts.remove(&self.workspace_id);
        if let Ok(mut workspaces) = self.workspaces.lock() {
            let _ = workspaces.update_status(self.workspace_id, StatusUpdate::Failed);
        }
        tracing::error!(
            workspace_id = %self.workspace_id,
            attempt_id = self.attempt_id,
            "connection attempt ended abnormally"
        );
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A running connection attempt.
#[derive(Debug)]
pub struct ConnectionHandle {
    workspace_id: WorkspaceId,
    task: JoinHandle<AppResult<Workspace>>,
}

impl ConnectionHandle {
    pub fn workspace_id(&self) -> WorkspaceId {
        self.workspace_id
    }

    /// Waits for the attempt and returns the workspace as it was left.
    pub async fn outcome(self) -> AppResult<Workspace> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Err(AppError::Cancelled),
            Err(err) => Err(AppError::Internal(err.to_string())),
        }
    }
}

pub struct AppState {
    config: AppConfig,
    credentials: CredentialStore,
    workspaces: Arc<Mutex<WorkspaceRegistry>>,
    history: Mutex<HistoryLog>,
    registry: Arc<ConnectionRegistry>,
    driver: Arc<dyn DatabaseDriver>,
    generator: Arc<dyn QueryGenerator>,
}

impl AppState {
    /// Opens the state persisted under `dir`, reading `config.json` from it.
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        let config = AppConfig::load(&dir);
        let store = FileStore::open(&dir)?;
        tracing::info!(data_dir = %dir.display(), "opening application state");
        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: AppConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let driver = Arc::new(MockDriver::new(config.connect_delay(), config.connect_success_rate));
        let generator = Arc::new(MockGenerator::new(config.generate_delay()));
        Self::with_services(config, store, driver, generator)
    }

    pub fn with_services(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        driver: Arc<dyn DatabaseDriver>,
        generator: Arc<dyn QueryGenerator>,
    ) -> Self {
        let config = config.normalized();
        Self {
            credentials: CredentialStore::new(store.clone()),
            history: Mutex::new(HistoryLog::load(store, config.history_limit)),
            workspaces: Arc::new(Mutex::new(WorkspaceRegistry::new())),
            registry: Arc::new(ConnectionRegistry::new()),
            driver,
            generator,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // Auth

    pub fn sign_up(&self, email: &str, password: &str, name: &str) -> AppResult<User> {
        self.credentials.sign_up(email, password, name)
    }

    pub fn sign_in(&self, email: &str, password: &str) -> AppResult<User> {
        self.credentials.sign_in(email, password)
    }

    pub fn sign_out(&self) -> AppResult<()> {
        self.credentials.sign_out()
    }

    pub fn current_user(&self) -> Option<User> {
        self.credentials.current_user()
    }

    pub fn resolve_route(&self, path: &str) -> Route {
        Route::resolve(path, self.current_user().as_ref())
    }

    fn require_user(&self) -> AppResult<User> {
        self.current_user()
            .ok_or_else(|| AppError::Auth("Please sign in to continue".to_string()))
    }

    // Workspaces

    pub fn workspaces(&self) -> AppResult<Vec<Workspace>> {
        Ok(self.workspaces.lock()?.list().to_vec())
    }

    pub fn current_workspace(&self) -> AppResult<Option<Workspace>> {
        Ok(self.workspaces.lock()?.current().cloned())
    }

    pub fn add_workspace(&self, name: &str) -> AppResult<Option<Workspace>> {
        self.workspaces.lock()?.add_workspace(name)
    }

    pub fn select_workspace(&self, id: WorkspaceId) -> AppResult<Workspace> {
        self.workspaces.lock()?.set_current(id)
    }

    pub fn update_workspace_status(&self, id: WorkspaceId, update: StatusUpdate) -> AppResult<Workspace> {
        self.workspaces.lock()?.update_status(id, update)
    }

    // Connection lifecycle

    /// Starts connecting `workspace_id`. The workspace is forced back to
    /// pending first. A second attempt while one is in flight is rejected.
    pub fn begin_connect(&self, workspace_id: WorkspaceId, config: DbConfig) -> AppResult<ConnectionHandle> {
        config.validate()?;

        let mut attempts = self.registry.attempts.lock()?;
        if attempts.contains_key(&workspace_id) {
            return Err(AppError::ConnectionInProgress(workspace_id.to_string()));
        }
        self.workspaces
            .lock()?
            .update_status(workspace_id, StatusUpdate::Pending)?;

        let attempt_id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let driver = self.driver.clone();
        let registry = self.registry.clone();
        let workspaces = self.workspaces.clone();

        let task = tokio::spawn(async move {
            let _guard = AttemptGuard {
                registry: registry.clone(),
                workspaces: workspaces.clone(),
                workspace_id,
                attempt_id,
            };
            let result = driver.connect(&config).await;
            finish_attempt(&registry, &workspaces, workspace_id, attempt_id, result, config)
        });
        attempts.insert(
            workspace_id,
            Attempt {
                id: attempt_id,
                abort: task.abort_handle(),
            },
        );
        tracing::info!(workspace_id = %workspace_id, attempt_id, "connection attempt started");

        Ok(ConnectionHandle { workspace_id, task })
    }

    pub async fn connect_workspace(&self, workspace_id: WorkspaceId, config: DbConfig) -> AppResult<Workspace> {
        self.begin_connect(workspace_id, config)?.outcome().await
    }

    /// Aborts the in-flight attempt for `workspace_id` and marks it failed.
    pub fn cancel_connect(&self, workspace_id: WorkspaceId) -> AppResult<Workspace> {
        let (attempt, workspace) = {
            let mut attempts = self.registry.attempts.lock()?;
            let attempt = attempts
                .remove(&workspace_id)
                .ok_or_else(|| AppError::not_found(format!("connection attempt for workspace {workspace_id}")))?;
            let workspace = self
                .workspaces
                .lock()?
                .update_status(workspace_id, StatusUpdate::Failed)?;
            (attempt, workspace)
        };
        // The aborted task's guard takes both locks when it drops.
        attempt.abort.abort();
        tracing::info!(workspace_id = %workspace_id, attempt_id = attempt.id, "connection attempt cancelled");
        Ok(workspace)
    }

    pub fn is_connecting(&self, workspace_id: WorkspaceId) -> AppResult<bool> {
        self.registry.is_connecting(workspace_id)
    }

    // Questions and history

    /// Generates SQL for `question` against the current workspace and records it.
    pub async fn ask(&self, question: &str) -> AppResult<QueryOutcome> {
        self.require_user()?;
        let workspace = self
            .current_workspace()?
            .ok_or_else(|| AppError::validation("Select a workspace first"))?;
        if !workspace.is_connected() {
            return Err(AppError::Connection(format!(
                "Workspace {} is not connected to a database",
                workspace.name
            )));
        }

        let generated = self.generator.generate(question).await?;
        let entry = self
            .history
            .lock()?
            .append(workspace.id, question.trim(), &generated.sql);

        Ok(QueryOutcome {
            formatted_sql: format_sql(&generated.sql),
            sql: generated.sql,
            result: generated.result,
            entry,
        })
    }

    /// Records a question against the current workspace.
    pub fn record_history(&self, question: &str, sql: &str) -> AppResult<HistoryEntry> {
        let workspace_id = self
            .current_workspace()?
            .map(|ws| ws.id)
            .ok_or_else(|| AppError::validation("Select a workspace first"))?;
        Ok(self.history.lock()?.append(workspace_id, question, sql))
    }

    pub fn history(&self, workspace_id: WorkspaceId) -> AppResult<Vec<HistoryEntry>> {
        Ok(self.history.lock()?.list(workspace_id).cloned().collect())
    }
}

fn finish_attempt(
    registry: &ConnectionRegistry,
    workspaces: &Mutex<WorkspaceRegistry>,
    workspace_id: WorkspaceId,
    attempt_id: u64,
    result: AppResult<()>,
    config: DbConfig,
) -> AppResult<Workspace> {
    let mut attempts = registry.attempts.lock()?;
    if attempts.get(&workspace_id).map(|a| a.id) != Some(attempt_id) {
        return Err(AppError::Cancelled);
    }
    attempts.remove(&workspace_id);

    let mut workspaces = workspaces.lock()?;
    match result {
        Ok(()) => {
            let workspace = workspaces.update_status(workspace_id, StatusUpdate::Connected(config))?;
            tracing::info!(workspace_id = %workspace_id, attempt_id, "workspace connected");
            Ok(workspace)
        }
        Err(err) => {
            workspaces.update_status(workspace_id, StatusUpdate::Failed)?;
            tracing::warn!(workspace_id = %workspace_id, attempt_id, error = %err, "workspace connection failed");
            Err(err)
        }
    }
}
