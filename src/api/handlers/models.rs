use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use super::{success, Success};
use crate::errors::AppError;
use crate::services::model_overview::{self, ModelOverview};
use crate::AppState;

#[derive(Serialize)]
pub struct ModelsBody {
    models: Vec<ModelOverview>,
    count: usize,
}

/// GET /api/models: registry entries with today's activity.
pub async fn list(State(state): State<AppState>) -> Result<Json<Success<ModelsBody>>, AppError> {
    let models = model_overview::list_model_overviews(state.store.as_ref(), Utc::now()).await?;
    Ok(success(ModelsBody {
        count: models.len(),
        models,
    }))
}
