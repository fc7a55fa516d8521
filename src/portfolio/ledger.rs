use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::tick::TickEvent;
use crate::models::{ModelEntry, Side};

/// A normalized ledger entry. `action` is always BUY or SELL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: Side,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub wallet_balance_sol: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub profit_loss_usd: Decimal,
    /// Price quoted in the action text (`BUY 1 SOL @ $150`), if any.
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub quoted_price_usd: Option<Decimal>,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ledger {
    /// Most recent first.
    pub trades: Vec<Trade>,
    pub total_trades: usize,
}

/// Source collection -> model name, with a fallback name for untagged or
/// unknown collections.
#[derive(Debug, Clone)]
pub struct ModelLookup {
    by_collection: HashMap<String, String>,
    default_model: String,
}

impl ModelLookup {
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            by_collection: HashMap::new(),
            default_model: default_model.into(),
        }
    }

    pub fn from_registry(entries: &[ModelEntry], default_model: impl Into<String>) -> Self {
        let mut lookup = Self::new(default_model);
        for entry in entries {
            lookup.insert(entry.ticks_ref.clone(), entry.model_name.clone());
        }
        lookup
    }

    pub fn insert(&mut self, collection: impl Into<String>, model: impl Into<String>) {
        self.by_collection.insert(collection.into(), model.into());
    }

    pub fn model_for(&self, collection: Option<&str>) -> &str {
        collection
            .and_then(|c| self.by_collection.get(c))
            .map(String::as_str)
            .unwrap_or(&self.default_model)
    }
}

/// Build the trade ledger from validated ticks.
///
/// Non-trade ticks are dropped. Trades are sorted ascending by timestamp
/// (stable) and then reversed, so index 0 is the latest trade.
pub fn assemble_ledger(ticks: &[TickEvent], lookup: &ModelLookup, default_size: Decimal) -> Ledger {
    let mut trades: Vec<Trade> = ticks
        .iter()
        .filter_map(|tick| {
            let trade = tick.action.as_trade()?;
            Some(Trade {
                id: tick.id.clone(),
                timestamp: tick.timestamp,
                action: trade.kind,
                amount: trade.amount_or(default_size),
                price_usd: tick.price_usd,
                wallet_balance_sol: tick.wallet_balance_sol.unwrap_or(Decimal::ZERO),
                profit_loss_usd: tick.profit_loss_usd,
                quoted_price_usd: trade.quoted_price(),
                model: lookup.model_for(tick.source_collection.as_deref()).to_string(),
            })
        })
        .collect();

    trades.sort_by_key(|trade| trade.timestamp);
    trades.reverse();

    Ledger {
        total_trades: trades.len(),
        trades,
    }
}
