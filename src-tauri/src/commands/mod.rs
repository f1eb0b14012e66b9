use tauri::State;

use crate::error::AppError;
use crate::generator;
use crate::models::{DbConfig, HistoryEntry, QueryOutcome, User, Workspace, WorkspaceId};
use crate::routes::Route;
use crate::state::AppState;

#[tauri::command]
pub async fn sign_up(
    state: State<'_, AppState>,
    email: String,
    password: String,
    name: String,
) -> Result<User, AppError> {
    state.sign_up(&email, &password, &name)
}

#[tauri::command]
pub async fn sign_in(
    state: State<'_, AppState>,
    email: String,
    password: String,
) -> Result<User, AppError> {
    state.sign_in(&email, &password)
}

#[tauri::command]
pub async fn sign_out(state: State<'_, AppState>) -> Result<(), AppError> {
    state.sign_out()
}

#[tauri::command]
pub async fn get_current_user(state: State<'_, AppState>) -> Result<Option<User>, AppError> {
    Ok(state.current_user())
}

#[tauri::command]
pub async fn resolve_route(state: State<'_, AppState>, path: String) -> Result<Route, AppError> {
    Ok(state.resolve_route(&path))
}

#[tauri::command]
pub async fn list_workspaces(state: State<'_, AppState>) -> Result<Vec<Workspace>, AppError> {
    state.workspaces()
}

#[tauri::command]
pub async fn get_current_workspace(
    state: State<'_, AppState>,
) -> Result<Option<Workspace>, AppError> {
    state.current_workspace()
}

#[tauri::command]
pub async fn create_workspace(
    state: State<'_, AppState>,
    name: String,
) -> Result<Option<Workspace>, AppError> {
    state.add_workspace(&name)
}

#[tauri::command]
pub async fn select_workspace(
    state: State<'_, AppState>,
    workspace_id: WorkspaceId,
) -> Result<Workspace, AppError> {
    state.select_workspace(workspace_id)
}

#[tauri::command]
pub async fn connect_workspace(
    state: State<'_, AppState>,
    workspace_id: WorkspaceId,
    config: DbConfig,
) -> Result<Workspace, AppError> {
    state.connect_workspace(workspace_id, config).await
}

#[tauri::command]
pub async fn cancel_connection(
    state: State<'_, AppState>,
    workspace_id: WorkspaceId,
) -> Result<Workspace, AppError> {
    state.cancel_connect(workspace_id)
}

#[tauri::command]
pub async fn ask_question(
    state: State<'_, AppState>,
    question: String,
) -> Result<QueryOutcome, AppError> {
    state.ask(&question).await
}

#[tauri::command]
pub async fn list_history(
    state: State<'_, AppState>,
    workspace_id: WorkspaceId,
) -> Result<Vec<HistoryEntry>, AppError> {
    state.history(workspace_id)
}

#[tauri::command]
pub fn format_sql(sql: String) -> String {
    generator::format_sql(&sql)
}
