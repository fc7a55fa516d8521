use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::db::{DocumentStore, SwitchOutcome};
use crate::errors::AppError;
use crate::models::{UserDocument, NO_MODEL};
use crate::portfolio::active_model::next_history_key;
use crate::portfolio::resolve_current_model;

const MAX_SWITCH_ATTEMPTS: u32 = 3;

/// A user document plus the model derived from its switch history.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    #[serde(flatten)]
    pub user: UserDocument,
    pub current_model: Option<String>,
}

impl From<UserDocument> for UserView {
    fn from(user: UserDocument) -> Self {
        let current_model = resolve_current_model(&user.active_models);
        Self { user, current_model }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelSwitch {
    pub message: String,
    pub user: UserView,
    /// History key the switch was recorded under.
    pub timestamp: String,
}

pub async fn get_user(store: &dyn DocumentStore, username: &str) -> Result<UserView, AppError> {
    store
        .find_user(username)
        .await?
        .map(UserView::from)
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Record a model selection, or a deselection when `model_name` is empty.
///
/// Appends a new history entry; earlier entries are never touched. A key
/// collision with a concurrent switch is retried with a fresh key.
pub async fn switch_model(
    store: &dyn DocumentStore,
    username: &str,
    model_name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<ModelSwitch, AppError> {
    let model_name = model_name.map(str::trim).filter(|m| !m.is_empty());
    let stored_name = model_name.unwrap_or(NO_MODEL);

    for attempt in 1..=MAX_SWITCH_ATTEMPTS {
        let user = store
            .find_user(username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        let key = next_history_key(&user.active_models, now);

        match store.append_model_switch(username, &key, stored_name).await? {
            SwitchOutcome::Appended => {
                counter!("model_switches_total").increment(1);
                tracing::info!(
                    username = %username,
                    model = %stored_name,
                    key = %key,
                    "Model switch recorded"
                );

                let user = get_user(store, username).await?;
                let message = match model_name {
                    Some(name) => format!("Model set to {name}"),
                    None => "Model deselected".to_string(),
                };
                return Ok(ModelSwitch {
                    message,
                    user,
                    timestamp: key,
                });
            }
            SwitchOutcome::KeyTaken => {
                tracing::debug!(username = %username, key = %key, attempt, "History key taken, retrying");
            }
            SwitchOutcome::UserNotFound => {
                return Err(AppError::NotFound("User not found".into()));
            }
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "Failed to update user model after {MAX_SWITCH_ATTEMPTS} attempts"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::TimeZone;

    async fn store_with_demo() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_user(UserDocument::new("demo")).await;
        store
    }

    #[tokio::test]
    async fn test_switch_then_deselect() {
        let store = store_with_demo().await;
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

        let first = switch_model(&store, "demo", Some("momentum"), now).await.unwrap();
        assert_eq!(first.message, "Model set to momentum");
        assert_eq!(first.timestamp, "1700000000000");
        assert_eq!(first.user.current_model.as_deref(), Some("momentum"));

        // Same instant: the second entry must not overwrite the first.
        let second = switch_model(&store, "demo", None, now).await.unwrap();
        assert_eq!(second.message, "Model deselected");
        assert_eq!(second.timestamp, "1700000000001");
        assert_eq!(second.user.current_model, None);
        assert_eq!(second.user.user.active_models.len(), 2);
        assert_eq!(
            second.user.user.active_models.get("1700000000000").map(String::as_str),
            Some("momentum")
        );
        assert_eq!(
            second.user.user.active_models.get("1700000000001").map(String::as_str),
            Some(NO_MODEL)
        );
    }

    #[tokio::test]
    async fn test_blank_model_name_deselects() {
        let store = store_with_demo().await;
        let switch = switch_model(&store, "demo", Some("  "), Utc::now()).await.unwrap();
        assert_eq!(switch.message, "Model deselected");
    }

    #[tokio::test]
    async fn test_switch_for_unknown_user() {
        let store = MemoryStore::new();
        let err = switch_model(&store, "ghost", Some("momentum"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_user_view_carries_current_model() {
        let store = MemoryStore::new();
        let mut user = UserDocument::new("demo");
        user.active_models
            .insert("2024-01-01T00:00:00Z".into(), "a".into());
        user.active_models.insert("1700000000000".into(), "b".into());
        store.insert_user(user).await;

        let view = get_user(&store, "demo").await.unwrap();
        assert_eq!(view.current_model.as_deref(), Some("a"));
    }
}
