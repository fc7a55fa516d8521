pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod portfolio;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use crate::clients::{BackendClient, CoinGeckoClient};
use crate::config::AppConfig;
use crate::db::DocumentStore;
use crate::services::PriceService;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: AppConfig,
    pub backend: BackendClient,
    pub prices: PriceService,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl AppState {
    /// Wire the upstream clients from `config` around an existing store.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        config: AppConfig,
        metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        let http = reqwest::Client::new();
        let backend = BackendClient::new(http.clone(), config.backend_api_url.as_str());
        let prices = PriceService::new(
            CoinGeckoClient::new(http, config.coingecko_api_url.as_str()),
            Duration::from_secs(config.price_cache_ttl_secs),
        );

        Self {
            store,
            config,
            backend,
            prices,
            metrics_handle,
        }
    }
}
