use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListBotsQuery {
    pub creator_username: Option<String>,
}

/// GET /api/bots[?creator_username=]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListBotsQuery>,
) -> Result<Json<Value>, AppError> {
    let creator = query.creator_username.as_deref().filter(|c| !c.is_empty());
    Ok(Json(state.backend.list_bots(creator).await?))
}

/// POST /api/bots
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.backend.create_bot(&body).await?))
}

/// GET /api/bots/:id
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(state.backend.get_bot(&id).await?))
}

/// DELETE /api/bots/:id
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.backend.delete_bot(&id).await?;
    tracing::info!(bot_id = %id, "Bot deleted");
    Ok(Json(deleted))
}

/// POST /api/bots/personalize: `botId` picks the target and is not forwarded.
pub async fn personalize(
    State(state): State<AppState>,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let bot_id = take_bot_id(&mut body);
    Ok(Json(state.backend.personalize(bot_id.as_deref(), &body).await?))
}

/// Remove `botId` from the body; empty, null and `false` ids count as absent.
fn take_bot_id(body: &mut Value) -> Option<String> {
    let raw = body.as_object_mut()?.remove("botId")?;
    match raw {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) if n.as_i64() != Some(0) => Some(n.to_string()),
        _ => None,
    }
}
