use crate::error::{AppError, AppResult};
use crate::models::{StatusUpdate, Workspace, WorkspaceId};

/// Workspaces in creation order plus the current selection.
///
/// The selection is stored as an id, so `current()` always reflects the
/// latest status of the selected workspace.
#[derive(Debug, Default, Clone)]
pub struct WorkspaceRegistry {
    workspaces: Vec<Workspace>,
    current: Option<WorkspaceId>,
}

impl WorkspaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pending workspace and selects it. Returns `Ok(None)` when
    /// the name is already taken.
    pub fn add_workspace(&mut self, name: &str) -> AppResult<Option<Workspace>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Please enter a workspace name"));
        }
        if self.workspaces.iter().any(|ws| ws.name == name) {
            tracing::debug!(name, "workspace name already taken");
            return Ok(None);
        }

        let workspace = Workspace::new(name);
        self.current = Some(workspace.id);
        self.workspaces.push(workspace.clone());
        tracing::info!(workspace_id = %workspace.id, name, "workspace created");
        Ok(Some(workspace))
    }

    pub fn update_status(&mut self, id: WorkspaceId, update: StatusUpdate) -> AppResult<Workspace> {
        let workspace = self
            .workspaces
            .iter_mut()
            .find(|ws| ws.id == id)
            .ok_or_else(|| AppError::not_found(format!("workspace {id}")))?;
        workspace.apply(update);
        tracing::debug!(workspace_id = %id, status = %workspace.status, "workspace status updated");
        Ok(workspace.clone())
    }

    pub fn set_current(&mut self, id: WorkspaceId) -> AppResult<Workspace> {
        let workspace = self
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("workspace {id}")))?;
        self.current = Some(id);
        Ok(workspace)
    }

    pub fn current(&self) -> Option<&Workspace> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.iter().find(|ws| ws.id == id)
    }

    pub fn list(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }
}
