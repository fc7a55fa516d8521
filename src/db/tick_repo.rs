use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::TickDocument;

#[derive(Debug, FromRow)]
struct TickRow {
    id: Uuid,
    collection: String,
    doc: Json<serde_json::Value>,
}

impl From<TickRow> for TickDocument {
    fn from(row: TickRow) -> Self {
        Self {
            id: row.id.to_string(),
            collection: row.collection,
            doc: row.doc.0,
        }
    }
}

/// Fetch every document in a tick collection.
///
/// Order is left to the caller: `timestamp` may be stored as a string or a
/// native date, so the database cannot sort it meaningfully.
pub async fn get_ticks(pool: &PgPool, collection: &str) -> anyhow::Result<Vec<TickDocument>> {
    let rows = sqlx::query_as::<_, TickRow>(
        "SELECT id, collection, doc FROM tick_documents WHERE collection = $1",
    )
    .bind(collection)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(TickDocument::from).collect())
}

/// Insert a raw tick document.
pub async fn insert_tick(
    pool: &PgPool,
    collection: &str,
    doc: &serde_json::Value,
) -> anyhow::Result<TickDocument> {
    let row = sqlx::query_as::<_, TickRow>(
        r#"
        INSERT INTO tick_documents (collection, doc)
        VALUES ($1, $2)
        RETURNING id, collection, doc
        "#,
    )
    .bind(collection)
    .bind(Json(doc))
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}
