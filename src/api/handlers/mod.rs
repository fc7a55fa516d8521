pub mod bots;
pub mod crypto;
pub mod models;
pub mod portfolio;
pub mod system;
pub mod user_model;

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// `{"success": true, ...body}`; `body` must serialize as a map.
#[derive(Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

pub fn success<T: Serialize>(body: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        body,
    })
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: Option<String>,
}

impl UsernameQuery {
    pub fn require(self) -> Result<String, AppError> {
        self.username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::BadRequest("Username is required".into()))
    }
}
