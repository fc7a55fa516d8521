use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, SwitchOutcome};
use crate::models::{ModelEntry, TickDocument, UserDocument};

/// In-process store with the same semantics as [`super::PgStore`].
///
/// Collections can be marked as failing to exercise the degraded read path.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: HashMap<String, UserDocument>,
    models: Vec<ModelEntry>,
    ticks: HashMap<String, Vec<TickDocument>>,
    failing_collections: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: UserDocument) {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.username.clone(), user);
    }

    pub async fn insert_model(&self, model_name: &str, ticks_ref: &str) -> ModelEntry {
        let mut inner = self.inner.write().await;
        inner.models.retain(|m| m.model_name != model_name);
        let entry = ModelEntry {
            id: Uuid::new_v4(),
            model_name: model_name.into(),
            ticks_ref: ticks_ref.into(),
        };
        inner.models.push(entry.clone());
        entry
    }

    pub async fn insert_tick(&self, collection: &str, doc: serde_json::Value) -> TickDocument {
        let mut inner = self.inner.write().await;
        let tick = TickDocument {
            id: Uuid::new_v4().to_string(),
            collection: collection.into(),
            doc,
        };
        inner
            .ticks
            .entry(collection.to_string())
            .or_default()
            .push(tick.clone());
        tick
    }

    /// Make every read of `collection` fail.
    pub async fn fail_collection(&self, collection: &str) {
        let mut inner = self.inner.write().await;
        inner.failing_collections.insert(collection.to_string());
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn find_user(&self, username: &str) -> anyhow::Result<Option<UserDocument>> {
        Ok(self.inner.read().await.users.get(username).cloned())
    }

    async fn append_model_switch(
        &self,
        username: &str,
        key: &str,
        model: &str,
    ) -> anyhow::Result<SwitchOutcome> {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.get_mut(username) else {
            return Ok(SwitchOutcome::UserNotFound);
        };
        if user.active_models.contains_key(key) {
            return Ok(SwitchOutcome::KeyTaken);
        }
        user.active_models.insert(key.to_string(), model.to_string());
        Ok(SwitchOutcome::Appended)
    }

    async fn list_models(&self) -> anyhow::Result<Vec<ModelEntry>> {
        let mut models = self.inner.read().await.models.clone();
        models.sort_by(|a, b| a.model_name.cmp(&b.model_name));
        Ok(models)
    }

    async fn fetch_ticks(&self, collection: &str) -> anyhow::Result<Vec<TickDocument>> {
        let inner = self.inner.read().await;
        if inner.failing_collections.contains(collection) {
            anyhow::bail!("collection {collection} is unavailable");
        }
        Ok(inner.ticks.get(collection).cloned().unwrap_or_default())
    }
}
