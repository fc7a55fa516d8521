use sqlx::PgPool;

use crate::models::ModelEntry;

/// Fetch every registered model.
pub async fn list_models(pool: &PgPool) -> anyhow::Result<Vec<ModelEntry>> {
    let models = sqlx::query_as::<_, ModelEntry>(
        "SELECT id, model_name, ticks_ref FROM bots ORDER BY model_name",
    )
    .fetch_all(pool)
    .await?;

    Ok(models)
}

/// Register a model, or repoint an existing one at a new collection.
pub async fn upsert_model(pool: &PgPool, model_name: &str, ticks_ref: &str) -> anyhow::Result<ModelEntry> {
    let model = sqlx::query_as::<_, ModelEntry>(
        r#"
        INSERT INTO bots (model_name, ticks_ref)
        VALUES ($1, $2)
        ON CONFLICT (model_name) DO UPDATE SET ticks_ref = $2
        RETURNING id, model_name, ticks_ref
        "#,
    )
    .bind(model_name)
    .bind(ticks_ref)
    .fetch_one(pool)
    .await?;

    Ok(model)
}
