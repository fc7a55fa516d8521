pub mod memory;
pub mod model_repo;
pub mod tick_repo;
pub mod user_repo;

pub use memory::MemoryStore;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::models::{ModelEntry, TickDocument, UserDocument};

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Result of appending to a user's model switch history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Appended,
    /// Another entry already uses this key; nothing was written.
    KeyTaken,
    UserNotFound,
}

/// Read access to the user store, model registry and event store, plus the
/// one write this service performs (appending a model switch).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ping(&self) -> anyhow::Result<()>;

    async fn find_user(&self, username: &str) -> anyhow::Result<Option<UserDocument>>;

    async fn append_model_switch(
        &self,
        username: &str,
        key: &str,
        model: &str,
    ) -> anyhow::Result<SwitchOutcome>;

    async fn list_models(&self) -> anyhow::Result<Vec<ModelEntry>>;

    /// Every document in one tick collection, in no particular order.
    async fn fetch_ticks(&self, collection: &str) -> anyhow::Result<Vec<TickDocument>>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user(&self, username: &str) -> anyhow::Result<Option<UserDocument>> {
        user_repo::get_user(&self.pool, username).await
    }

    async fn append_model_switch(
        &self,
        username: &str,
        key: &str,
        model: &str,
    ) -> anyhow::Result<SwitchOutcome> {
        user_repo::append_active_model(&self.pool, username, key, model).await
    }

    async fn list_models(&self) -> anyhow::Result<Vec<ModelEntry>> {
        model_repo::list_models(&self.pool).await
    }

    async fn fetch_ticks(&self, collection: &str) -> anyhow::Result<Vec<TickDocument>> {
        tick_repo::get_ticks(&self.pool, collection).await
    }
}
