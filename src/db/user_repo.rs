use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use super::SwitchOutcome;
use crate::models::UserDocument;

#[derive(Debug, FromRow)]
struct UserRow {
    username: String,
    sol_bal: Option<Decimal>,
    usd_bal: Option<Decimal>,
    active_models: Json<BTreeMap<String, String>>,
    owned_models: Vec<String>,
    portfolio_history: Option<Json<Value>>,
}

impl From<UserRow> for UserDocument {
    fn from(row: UserRow) -> Self {
        let portfolio_history = history_entries(&row.username, row.portfolio_history.map(|h| h.0));
        Self {
            username: row.username,
            sol_bal: row.sol_bal,
            usd_bal: row.usd_bal,
            active_models: row.active_models.0,
            owned_models: row.owned_models,
            portfolio_history,
        }
    }
}

/// Keep a stored `portfolio_history` only when it is an array; anything else
/// is treated as absent so the history gets recomputed.
fn history_entries(username: &str, stored: Option<Value>) -> Option<Vec<Value>> {
    match stored? {
        Value::Array(entries) => Some(entries),
        Value::Null => None,
        other => {
            tracing::warn!(
                username = %username,
                kind = json_kind(&other),
                "Ignoring non-array portfolio_history"
            );
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fetch a user by username.
pub async fn get_user(pool: &PgPool, username: &str) -> anyhow::Result<Option<UserDocument>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT username, sol_bal, usd_bal, active_models, owned_models, portfolio_history
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(UserDocument::from))
}

/// Insert or replace a user document.
pub async fn upsert_user(pool: &PgPool, user: &UserDocument) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (username, sol_bal, usd_bal, active_models, owned_models, portfolio_history)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (username) DO UPDATE
            SET sol_bal = $2, usd_bal = $3, active_models = $4, owned_models = $5,
                portfolio_history = $6, updated_at = NOW()
        "#,
    )
    .bind(&user.username)
    .bind(user.sol_bal)
    .bind(user.usd_bal)
    .bind(Json(&user.active_models))
    .bind(&user.owned_models)
    .bind(user.portfolio_history.as_ref().map(Json))
    .execute(pool)
    .await?;

    Ok(())
}

/// Add one entry to a user's switch history.
///
/// The JSONB merge is a single atomic update and refuses to touch an
/// existing key, so history entries are never overwritten.
pub async fn append_active_model(
    pool: &PgPool,
    username: &str,
    key: &str,
    model: &str,
) -> anyhow::Result<SwitchOutcome> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET active_models = active_models || jsonb_build_object($2::text, $3::text),
            updated_at = NOW()
        WHERE username = $1 AND NOT (active_models ? $2)
        "#,
    )
    .bind(username)
    .bind(key)
    .bind(model)
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(SwitchOutcome::Appended);
    }

    let exists: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await?;

    Ok(if exists.0 {
        SwitchOutcome::KeyTaken
    } else {
        SwitchOutcome::UserNotFound
    })
}
