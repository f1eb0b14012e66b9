use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::DbConfig;

pub mod mock;

pub use mock::MockDriver;

#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    async fn connect(&self, config: &DbConfig) -> AppResult<()>;
}
