use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use super::action::{classify_action, TickAction};
use super::fields;
use crate::models::TickDocument;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TickError {
    #[error("tick document is not an object")]
    NotAnObject,

    #[error("tick has no timestamp")]
    MissingTimestamp,

    #[error("unparseable timestamp: {0}")]
    InvalidTimestamp(String),
}

/// One evaluation cycle of a trading model, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct TickEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub raw_action: Option<String>,
    pub action: TickAction,
    pub price_usd: Decimal,
    pub wallet_balance_sol: Option<Decimal>,
    pub wallet_balance_usd: Option<Decimal>,
    pub profit_loss_usd: Decimal,
    /// Collection the record was read from; drives model attribution.
    pub source_collection: Option<String>,
}

impl TickEvent {
    /// Validate a raw store document.
    ///
    /// Only the timestamp is mandatory. Malformed numeric fields are treated
    /// as absent and fall back to their defaults.
    pub fn from_document(document: &TickDocument) -> Result<Self, TickError> {
        let doc = &document.doc;
        if !doc.is_object() {
            return Err(TickError::NotAnObject);
        }

        let raw_ts = doc
            .get("timestamp")
            .filter(|v| !v.is_null())
            .ok_or(TickError::MissingTimestamp)?;
        let timestamp = fields::timestamp(raw_ts)
            .ok_or_else(|| TickError::InvalidTimestamp(raw_ts.to_string()))?;

        let raw_action = doc.get("action").and_then(Value::as_str).map(str::to_string);
        let number = |key: &str| doc.get(key).and_then(fields::decimal);

        Ok(Self {
            id: document.id.clone(),
            timestamp,
            action: classify_action(raw_action.as_deref()),
            raw_action,
            price_usd: number("price_usd").unwrap_or(Decimal::ZERO),
            wallet_balance_sol: number("wallet_balance_sol"),
            wallet_balance_usd: number("wallet_balance_usd"),
            profit_loss_usd: number("profit_loss_usd").unwrap_or(Decimal::ZERO),
            source_collection: Some(document.collection.clone()),
        })
    }
}

/// Validated ticks in ascending timestamp order, plus how many were rejected.
#[derive(Debug, Clone, Default)]
pub struct TickBatch {
    pub events: Vec<TickEvent>,
    pub dropped: usize,
}

impl TickBatch {
    pub fn latest(&self) -> Option<&TickEvent> {
        self.events.last()
    }
}

/// Validate every document, skipping the ones that fail, and sort the rest
/// ascending by timestamp. Ties keep their input order.
pub fn normalize_ticks<'a>(documents: impl IntoIterator<Item = &'a TickDocument>) -> TickBatch {
    let mut batch = TickBatch::default();

    for document in documents {
        match TickEvent::from_document(document) {
            Ok(event) => batch.events.push(event),
            Err(e) => {
                batch.dropped += 1;
                tracing::debug!(
                    id = %document.id,
                    collection = %document.collection,
                    error = %e,
                    "Skipping malformed tick"
                );
            }
        }
    }

    batch.events.sort_by_key(|event| event.timestamp);
    batch
}
