//! Transaction webhook records.

use sqlx::{FromRow, SqlitePool};

/// A webhook payload as it was received.
#[derive(Debug, Clone, FromRow)]
pub struct TransactionRecord {
    pub id: String,
    /// Compact JSON text; empty when the request body was not JSON
    pub payload: String,
    pub received_at: String,
}

pub async fn insert_transaction(
    db: &SqlitePool,
    payload: &str,
) -> Result<TransactionRecord, sqlx::Error> {
    let record = TransactionRecord {
        id: uuid::Uuid::new_v4().to_string(),
        payload: payload.to_string(),
        received_at: chrono::Utc::now().to_rfc3339(),
    };

    sqlx::query("INSERT INTO transactions (id, payload, received_at) VALUES (?, ?, ?)")
        .bind(&record.id)
        .bind(&record.payload)
        .bind(&record.received_at)
        .execute(db)
        .await?;

    tracing::debug!(id = %record.id, "Transaction recorded");

    Ok(record)
}

/// Most recent transactions first.
#[cfg(test)]
pub async fn recent_transactions(
    db: &SqlitePool,
    limit: i64,
) -> Result<Vec<TransactionRecord>, sqlx::Error> {
    sqlx::query_as::<_, TransactionRecord>(
        "SELECT * FROM transactions ORDER BY received_at DESC, rowid DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(db)
    .await
}
