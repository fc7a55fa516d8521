use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use metrics::counter;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::db::DocumentStore;
use crate::errors::AppError;
use crate::models::ModelEntry;
use crate::portfolio::fields::format_timestamp;
use crate::portfolio::performance::clamped_sum;
use crate::portfolio::{normalize_ticks, TickEvent};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayTick {
    pub action: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub timestamp: String,
    /// SOL held after the tick.
    #[serde(with = "rust_decimal::serde::float")]
    pub wallet_balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit_loss: Decimal,
}

impl From<&TickEvent> for TodayTick {
    fn from(tick: &TickEvent) -> Self {
        Self {
            action: tick.raw_action.clone(),
            price: tick.price_usd,
            timestamp: format_timestamp(tick.timestamp),
            wallet_balance: tick.wallet_balance_sol.unwrap_or(Decimal::ZERO),
            profit_loss: tick.profit_loss_usd,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOverview {
    pub id: Uuid,
    pub name: String,
    pub model_name: String,
    /// Newest first.
    pub todays_trades: Vec<TodayTick>,
    #[serde(rename = "todaysPL", with = "rust_decimal::serde::float")]
    pub todays_pl: Decimal,
}

/// Every registered model with the ticks it produced since UTC midnight.
pub async fn list_model_overviews(
    store: &dyn DocumentStore,
    now: DateTime<Utc>,
) -> Result<Vec<ModelOverview>, AppError> {
    let models = store.list_models().await?;
    let day_start = start_of_day(now);

    let overviews = models
        .iter()
        .map(|model| overview(store, model, day_start));

    Ok(join_all(overviews).await)
}

async fn overview(
    store: &dyn DocumentStore,
    model: &ModelEntry,
    day_start: DateTime<Utc>,
) -> ModelOverview {
    let documents = match store.fetch_ticks(&model.ticks_ref).await {
        Ok(docs) => docs,
        Err(e) => {
            counter!("source_fetch_failures_total").increment(1);
            tracing::warn!(
                model = %model.model_name,
                collection = %model.ticks_ref,
                error = %e,
                "Tick collection unavailable, showing no trades"
            );
            Vec::new()
        }
    };

    let batch = normalize_ticks(&documents);
    let todays_trades: Vec<TodayTick> = batch
        .events
        .iter()
        .rev()
        .filter(|tick| tick.timestamp >= day_start)
        .map(TodayTick::from)
        .collect();
    let todays_pl = clamped_sum(todays_trades.iter().map(|t| t.profit_loss));

    ModelOverview {
        id: model.id,
        name: model.display_name(),
        model_name: model.model_name.clone(),
        todays_trades,
        todays_pl,
    }
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}
