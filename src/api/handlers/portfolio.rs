use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;

use super::{success, Success, UsernameQuery};
use crate::errors::AppError;
use crate::portfolio::PortfolioReport;
use crate::services::portfolio_service;
use crate::AppState;

/// GET /api/user/portfolio?username=
pub async fn get_portfolio(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<Success<PortfolioReport>>, AppError> {
    let username = query.require()?;
    let report =
        portfolio_service::get_portfolio(state.store.as_ref(), &state.config, &username, Utc::now())
            .await?;
    Ok(success(report))
}
