use std::collections::BTreeSet;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use metrics::{counter, histogram};

use crate::config::{AppConfig, PortfolioSources};
use crate::db::DocumentStore;
use crate::errors::AppError;
use crate::models::{ModelEntry, TickDocument, UserDocument, NO_MODEL};
use crate::portfolio::{
    build_portfolio, normalize_ticks, resolve_current_model, ModelLookup, PortfolioReport,
};

/// Reconstruct one user's portfolio from the event store.
///
/// Unreachable tick collections contribute no records; only a missing user or
/// a failing user read aborts the request.
pub async fn get_portfolio(
    store: &dyn DocumentStore,
    config: &AppConfig,
    username: &str,
    now: DateTime<Utc>,
) -> Result<PortfolioReport, AppError> {
    counter!("portfolio_requests_total").increment(1);

    let user = store
        .find_user(username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let registry = match store.list_models().await {
        Ok(models) => models,
        Err(e) => {
            counter!("source_fetch_failures_total").increment(1);
            tracing::warn!(error = %e, "Model registry unavailable, using default collection");
            Vec::new()
        }
    };

    let collections = source_collections(&user, &registry, config);
    let documents = fetch_collections(store, &collections).await;

    let started = Instant::now();
    let batch = normalize_ticks(&documents);
    if batch.dropped > 0 {
        counter!("ticks_dropped_total").increment(batch.dropped as u64);
    }

    let lookup = ModelLookup::from_registry(&registry, config.default_model_name.as_str());
    let report = build_portfolio(&user, &batch, &lookup, config.default_trade_size, now);
    histogram!("portfolio_build_seconds").record(started.elapsed().as_secs_f64());

    tracing::info!(
        username = %username,
        collections = ?collections,
        ticks = batch.events.len(),
        dropped = batch.dropped,
        trades = report.portfolio.total_trades,
        "Portfolio built"
    );

    Ok(report)
}

/// Tick collections that feed `user`'s portfolio, deduplicated and sorted.
pub fn source_collections(
    user: &UserDocument,
    registry: &[ModelEntry],
    config: &AppConfig,
) -> Vec<String> {
    let collection_for = |model: &str| {
        registry
            .iter()
            .find(|entry| entry.model_name == model)
            .map(|entry| entry.ticks_ref.clone())
            .unwrap_or_else(|| config.default_ticks_collection.clone())
    };

    let collections: BTreeSet<String> = match config.portfolio_sources {
        PortfolioSources::Current => {
            let current = resolve_current_model(&user.active_models);
            BTreeSet::from([match current {
                Some(model) => collection_for(&model),
                None => config.default_ticks_collection.clone(),
            }])
        }
        PortfolioSources::History => user
            .active_models
            .values()
            .filter(|model| model.as_str() != NO_MODEL)
            .map(|model| collection_for(model))
            .collect(),
    };

    if collections.is_empty() {
        return vec![config.default_ticks_collection.clone()];
    }
    collections.into_iter().collect()
}

async fn fetch_collections(store: &dyn DocumentStore, collections: &[String]) -> Vec<TickDocument> {
    let reads = collections.iter().map(|collection| async move {
        match store.fetch_ticks(collection).await {
            Ok(docs) => docs,
            Err(e) => {
                counter!("source_fetch_failures_total").increment(1);
                tracing::warn!(
                    collection = %collection,
                    error = %e,
                    "Tick collection unavailable, treating as empty"
                );
                Vec::new()
            }
        }
    });

    join_all(reads).await.into_iter().flatten().collect()
}
