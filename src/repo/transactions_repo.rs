use crate::domain::transaction::{TransactionOutcome, TransactionStats, TransactionStatus};
use crate::repo::transaction_store::TransactionStore;
use anyhow::Result;
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct TransactionsRepo {
    pub pool: PgPool,
}

#[async_trait::async_trait]
impl TransactionStore for TransactionsRepo {
    async fn fetch_recent_failures(&self, limit: i64) -> Result<Vec<TransactionOutcome>> {
        let rows = sqlx::query(
            r#"
            SELECT id, timestamp, bank, gateway, amount, status, error_code
            FROM transactions
            WHERE status = 'FAILED'
            ORDER BY timestamp DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TransactionOutcome {
                id: r.get("id"),
                timestamp: r.get("timestamp"),
                bank: r.get("bank"),
                gateway: r.get("gateway"),
                amount: r.get("amount"),
                status: TransactionStatus::parse(r.get::<&str, _>("status")),
                error_code: r.get("error_code"),
            })
            .collect())
    }

    async fn record(&self, outcome: &TransactionOutcome) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, timestamp, bank, gateway, amount, status, error_code)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&outcome.id)
        .bind(outcome.timestamp)
        .bind(&outcome.bank)
        .bind(&outcome.gateway)
        .bind(outcome.amount)
        .bind(outcome.status.as_str())
        .bind(&outcome.error_code)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn stats(&self) -> Result<TransactionStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'FAILED') AS failed
            FROM transactions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TransactionStats {
            total: row.get("total"),
            failed: row.get("failed"),
        })
    }
}
