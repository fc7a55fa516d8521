use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

use crate::portfolio::DEFAULT_TRADE_SIZE;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

/// Which tick collections feed a user's portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortfolioSources {
    /// Only the currently selected model's collection.
    Current,
    /// Every model named anywhere in the user's switch history.
    History,
}

impl PortfolioSources {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "history" => PortfolioSources::History,
            _ => PortfolioSources::Current,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Bearer token for /api routes; empty disables auth
    pub api_token: Option<String>,
    pub log_format: String,

    // Upstreams
    pub backend_api_url: String,
    pub coingecko_api_url: String,
    pub price_cache_ttl_secs: u64,

    // Portfolio
    pub default_ticks_collection: String,
    pub default_model_name: String,
    pub default_trade_size: Decimal,
    pub portfolio_sources: PortfolioSources,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            api_token: env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),

            backend_api_url: env::var("BACKEND_API_URL")
                .unwrap_or_else(|_| DEFAULT_BACKEND_URL.into()),
            coingecko_api_url: env::var("COINGECKO_API_URL")
                .unwrap_or_else(|_| DEFAULT_COINGECKO_URL.into()),
            price_cache_ttl_secs: env::var("PRICE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".into())
                .parse()
                .unwrap_or(300),

            default_ticks_collection: env::var("DEFAULT_TICKS_COLLECTION")
                .unwrap_or_else(|_| "ticks".into()),
            default_model_name: env::var("DEFAULT_MODEL_NAME")
                .unwrap_or_else(|_| "default".into()),
            default_trade_size: env::var("DEFAULT_TRADE_SIZE")
                .ok()
                .and_then(|v| Decimal::from_str(&v).ok())
                .filter(|d| *d > Decimal::ZERO)
                .unwrap_or(DEFAULT_TRADE_SIZE),
            portfolio_sources: PortfolioSources::from_str(
                &env::var("PORTFOLIO_SOURCES").unwrap_or_else(|_| "current".into()),
            ),
        })
    }

    /// Settings for tests and local tooling: no auth, local upstreams.
    pub fn for_tests(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".into(),
            port: 0,
            api_token: None,
            log_format: "text".into(),
            backend_api_url: DEFAULT_BACKEND_URL.into(),
            coingecko_api_url: DEFAULT_COINGECKO_URL.into(),
            price_cache_ttl_secs: 300,
            default_ticks_collection: "ticks".into(),
            default_model_name: "default".into(),
            default_trade_size: DEFAULT_TRADE_SIZE,
            portfolio_sources: PortfolioSources::Current,
        }
    }

    pub fn wants_json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
