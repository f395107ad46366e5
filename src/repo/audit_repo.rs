use crate::audit::AuditSink;
use crate::domain::audit::AuditEntry;
use anyhow::Result;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AuditRepo {
    pub pool: PgPool,
}

#[async_trait::async_trait]
impl AuditSink for AuditRepo {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO agent_logs (id, timestamp, log_text, action_type, metadata_json)
            VALUES ($1,$2,$3,$4,$5)
            "#,
        )
        .bind(entry.id)
        .bind(entry.timestamp)
        .bind(&entry.log_text)
        .bind(entry.action_type.as_str())
        .bind(&entry.metadata)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
