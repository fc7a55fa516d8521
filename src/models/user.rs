use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user account as held by the user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    pub username: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sol_bal: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub usd_bal: Option<Decimal>,
    /// Switch history: time key -> model name or `"no_model"`. Append-only.
    #[serde(default)]
    pub active_models: BTreeMap<String, String>,
    #[serde(default)]
    pub owned_models: Vec<String>,
    /// Precomputed history written by the backend, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_history: Option<Vec<serde_json::Value>>,
}

impl UserDocument {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            sol_bal: None,
            usd_bal: None,
            active_models: BTreeMap::new(),
            owned_models: Vec::new(),
            portfolio_history: None,
        }
    }

    pub fn sol_balance(&self) -> Decimal {
        self.sol_bal.unwrap_or(Decimal::ZERO)
    }

    pub fn usd_balance(&self) -> Decimal {
        self.usd_bal.unwrap_or(Decimal::ZERO)
    }
}
