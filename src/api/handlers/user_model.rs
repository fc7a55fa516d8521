use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{success, Success, UsernameQuery};
use crate::errors::AppError;
use crate::services::user_service::{self, ModelSwitch, UserView};
use crate::AppState;

#[derive(Serialize)]
pub struct UserBody {
    user: UserView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetModelRequest {
    pub username: Option<String>,
    pub model_name: Option<String>,
}

/// GET /api/user/model?username=
pub async fn get_user_model(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<Success<UserBody>>, AppError> {
    let username = query.require()?;
    let user = user_service::get_user(state.store.as_ref(), &username).await?;
    Ok(success(UserBody { user }))
}

/// POST /api/user/model: select a model, or deselect without `modelName`.
pub async fn set_user_model(
    State(state): State<AppState>,
    Json(req): Json<SetModelRequest>,
) -> Result<Json<Success<ModelSwitch>>, AppError> {
    let username = UsernameQuery {
        username: req.username,
    }
    .require()?;

    let switch = user_service::switch_model(
        state.store.as_ref(),
        &username,
        req.model_name.as_deref(),
        Utc::now(),
    )
    .await?;
    Ok(success(switch))
}
