pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod history;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;
pub mod workspace;

#[cfg(feature = "desktop")]
mod commands;

pub use error::{AppError, AppResult, ErrorKind};
pub use state::{AppState, ConnectionHandle};

use tracing_subscriber::EnvFilter;

use crate::config::LOG_ENV_VAR;

/// Installs the global fmt subscriber. `QUERYMIND_LOG` wins over `default_filter`.
/// Later calls are no-ops.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let dir = app.path().app_data_dir()?;
            init_tracing(&config::AppConfig::load(&dir).log_filter);
            let state = AppState::open(dir)?;
            app.manage(state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::sign_up,
            commands::sign_in,
            commands::sign_out,
            commands::get_current_user,
            commands::resolve_route,
            commands::list_workspaces,
            commands::get_current_workspace,
            commands::create_workspace,
            commands::select_workspace,
            commands::connect_workspace,
            commands::cancel_connection,
            commands::ask_question,
            commands::list_history,
            commands::format_sql
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
