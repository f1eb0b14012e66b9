//! Shared setup for QueryMind integration tests.

use std::fs;
use std::path::PathBuf;

use querymind_lib::config::{AppConfig, CONFIG_FILE_NAME};
use querymind_lib::models::{DbConfig, DbKind};
use querymind_lib::AppState;
use tempfile::TempDir;

/// A data directory on disk plus helpers to (re)open state from it.
#[allow(dead_code)]
pub struct TestContext {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_config(&AppConfig::default())
    }

    pub fn with_config(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let data_dir = temp_dir.path().join("querymind");
        fs::create_dir_all(&data_dir)?;
        fs::write(data_dir.join(CONFIG_FILE_NAME), serde_json::to_string(config)?)?;
        Ok(Self { temp_dir, data_dir })
    }

    pub fn open(&self) -> AppState {
        AppState::open(&self.data_dir).expect("open application state")
    }
}

#[allow(dead_code)]
pub fn sales_config() -> DbConfig {
    DbConfig {
        kind: DbKind::Mysql,
        host: "localhost".to_string(),
        username: "root".to_string(),
        password: String::new(),
        database: "sales_db".to_string(),
    }
}
