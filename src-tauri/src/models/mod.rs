use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WorkspaceId(pub Uuid);

impl WorkspaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkspaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceStatus {
    Pending,
    Connected,
    Failed,
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Connected => write!(f, "connected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The only ways a workspace status may change. `Connected` always carries
/// the config it connected with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Pending,
    Connected(DbConfig),
    Failed,
}

impl StatusUpdate {
    pub fn status(&self) -> WorkspaceStatus {
        match self {
            Self::Pending => WorkspaceStatus::Pending,
            Self::Connected(_) => WorkspaceStatus::Connected,
            Self::Failed => WorkspaceStatus::Failed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    pub status: WorkspaceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_config: Option<DbConfig>,
}

impl Workspace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: WorkspaceId::new(),
            name: name.into(),
            status: WorkspaceStatus::Pending,
            db_config: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == WorkspaceStatus::Connected
    }

    pub(crate) fn apply(&mut self, update: StatusUpdate) {
        self.status = update.status();
        if let StatusUpdate::Connected(config) = update {
            self.db_config = Some(config);
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbKind {
    #[default]
    Mysql,
    Postgresql,
    Sqlite,
    #[serde(alias = "Oracle")]
    Oracle,
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mysql => write!(f, "mysql"),
            Self::Postgresql => write!(f, "postgresql"),
            Self::Sqlite => write!(f, "sqlite"),
            Self::Oracle => write!(f, "oracle"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DbConfig {
    #[serde(rename = "type", default)]
    pub kind: DbKind,
    pub host: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
}

impl DbConfig {
    pub fn validate(&self) -> AppResult<()> {
        let missing = [&self.host, &self.username, &self.database]
            .iter()
            .any(|field| field.trim().is_empty());
        if missing {
            return Err(AppError::validation("Please fill in all required fields."));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub question: String,
    pub sql: String,
    pub workspace_id: WorkspaceId,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuery {
    pub sql: String,
    pub result: QueryResult,
}

/// Everything the chat panel shows after a question is answered.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutcome {
    pub sql: String,
    pub formatted_sql: String,
    pub result: QueryResult,
    pub entry: HistoryEntry,
}
