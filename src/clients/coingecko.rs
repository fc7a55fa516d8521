use std::collections::HashMap;

use reqwest::{Client, StatusCode, Url};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tracked assets: (symbol, CoinGecko id, display name). SUI leads as sponsor.
pub const TRACKED_ASSETS: &[(&str, &str, &str)] = &[
    ("SUI", "sui", "Sui"),
    ("BTC", "bitcoin", "Bitcoin"),
    ("ETH", "ethereum", "Ethereum"),
    ("SOL", "solana", "Solana"),
    ("XRP", "ripple", "Ripple"),
];

#[derive(Debug, Error)]
pub enum PriceClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by CoinGecko")]
    RateLimited,

    #[error("CoinGecko API error: {0}")]
    Status(u16),

    #[error("invalid CoinGecko URL: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, Deserialize)]
struct SimplePrice {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    usd: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    usd_24h_change: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoQuote {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_price: Decimal,
    /// Percent change over 24h.
    #[serde(with = "rust_decimal::serde::float")]
    pub price_change_24h: Decimal,
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Current USD price and 24h change for every tracked asset.
    /// Assets missing from the response are left out.
    pub async fn get_quotes(&self) -> Result<Vec<CryptoQuote>, PriceClientError> {
        let ids = TRACKED_ASSETS
            .iter()
            .map(|(_, id, _)| *id)
            .collect::<Vec<_>>()
            .join(",");
        let url = Url::parse_with_params(
            &format!("{}/simple/price", self.base_url),
            &[
                ("ids", ids.as_str()),
                ("vs_currencies", "usd"),
                ("include_24hr_change", "true"),
            ],
        )
        .map_err(|e| PriceClientError::InvalidUrl(e.to_string()))?;

        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .header("User-Agent", "QuantBase/1.0")
            .send()
            .await?;

        match resp.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(PriceClientError::RateLimited),
            s if !s.is_success() => return Err(PriceClientError::Status(s.as_u16())),
            _ => {}
        }

        let prices: HashMap<String, SimplePrice> = resp.json().await?;
        Ok(quotes_from(&prices))
    }
}

fn quotes_from(prices: &HashMap<String, SimplePrice>) -> Vec<CryptoQuote> {
    TRACKED_ASSETS
        .iter()
        .filter_map(|(symbol, id, name)| {
            let price = prices.get(*id)?;
            Some(CryptoQuote {
                id: id.to_string(),
                name: name.to_string(),
                symbol: symbol.to_string(),
                current_price: price.usd.unwrap_or(Decimal::ZERO),
                price_change_24h: price.usd_24h_change.unwrap_or(Decimal::ZERO),
            })
        })
        .collect()
}
