use axum::extract::State;
use axum::Json;

use crate::clients::coingecko::{CryptoQuote, PriceClientError};
use crate::errors::AppError;
use crate::AppState;

/// GET /api/crypto: quotes for the tracked assets, as a bare array.
pub async fn quotes(State(state): State<AppState>) -> Result<Json<Vec<CryptoQuote>>, AppError> {
    match state.prices.quotes().await {
        Ok(quotes) => Ok(Json(quotes)),
        Err(PriceClientError::RateLimited) => Err(AppError::Upstream {
            status: 429,
            message: "Rate limited and no cached data available".into(),
        }),
        Err(e) => Err(AppError::Internal(anyhow::anyhow!(
            "Failed to fetch crypto data: {e}"
        ))),
    }
}
