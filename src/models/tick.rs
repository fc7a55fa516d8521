use serde::{Deserialize, Serialize};

/// A tick record exactly as the event store returned it.
///
/// `doc` is untyped on purpose: collections written by different backend
/// versions disagree on field types. `portfolio::tick::TickEvent` is the
/// validated form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickDocument {
    pub id: String,
    pub collection: String,
    pub doc: serde_json::Value,
}
