use crate::domain::transaction::{TransactionOutcome, TransactionStats};
use anyhow::Result;

/// Source of recorded payment outcomes.
#[async_trait::async_trait]
pub trait TransactionStore: Send + Sync {
    /// Most recent `FAILED` outcomes, newest first.
    async fn fetch_recent_failures(&self, limit: i64) -> Result<Vec<TransactionOutcome>>;

    async fn record(&self, outcome: &TransactionOutcome) -> Result<()>;

    async fn stats(&self) -> Result<TransactionStats>;
}
