use crate::domain::audit::AuditEntry;
use anyhow::Result;

pub mod log;

/// Durable destination for audit entries.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<()>;
}
