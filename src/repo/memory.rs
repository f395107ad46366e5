use crate::domain::transaction::{TransactionOutcome, TransactionStats};
use crate::repo::transaction_store::TransactionStore;
use anyhow::{bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-local transaction store for `STORE_BACKEND=memory` and tests.
#[derive(Clone, Default)]
pub struct MemoryTransactionStore {
    rows: Arc<RwLock<Vec<TransactionOutcome>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every read fails as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("transaction store unavailable");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn fetch_recent_failures(&self, limit: i64) -> Result<Vec<TransactionOutcome>> {
        self.check_available()?;
        let rows = self.rows.read().await;
        let mut failed: Vec<TransactionOutcome> =
            rows.iter().filter(|t| t.is_failed()).cloned().collect();
        // equal timestamps: last inserted first
        failed.reverse();
        failed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        failed.truncate(limit.max(0) as usize);
        Ok(failed)
    }

    async fn record(&self, outcome: &TransactionOutcome) -> Result<()> {
        self.check_available()?;
        let mut rows = self.rows.write().await;
        if rows.iter().any(|t| t.id == outcome.id) {
            return Ok(());
        }
        rows.push(outcome.clone());
        Ok(())
    }

    async fn stats(&self) -> Result<TransactionStats> {
        self.check_available()?;
        let rows = self.rows.read().await;
        Ok(TransactionStats {
            total: rows.len() as i64,
            failed: rows.iter().filter(|t| t.is_failed()).count() as i64,
        })
    }
}
