use crate::audit::AuditSink;
use crate::domain::audit::{AuditAction, AuditEntry};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Append-only decision log. Each append is a single write under the lock,
/// so readers never see a partial entry, and timestamps never go backwards.
#[derive(Clone)]
pub struct AuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
    sink: Option<Arc<dyn AuditSink>>,
}

impl AuditLog {
    pub fn new(sink: Option<Arc<dyn AuditSink>>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            sink,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub async fn append(
        &self,
        action_type: AuditAction,
        log_text: impl Into<String>,
        metadata: serde_json::Value,
    ) -> AuditEntry {
        self.append_at(action_type, log_text, metadata, Utc::now()).await
    }

    pub async fn append_at(
        &self,
        action_type: AuditAction,
        log_text: impl Into<String>,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> AuditEntry {
        let entry = {
            let mut entries = self.entries.write().await;
            let timestamp = match entries.last() {
                Some(last) if last.timestamp > now => last.timestamp,
                _ => now,
            };
            let entry = AuditEntry {
                id: Uuid::new_v4(),
                timestamp,
                action_type,
                log_text: log_text.into(),
                metadata,
            };
            entries.push(entry.clone());
            entry
        };

        tracing::info!(
            action = entry.action_type.as_str(),
            "audit: {}",
            entry.log_text
        );

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.append(&entry).await {
                tracing::warn!(entry_id = %entry.id, error = %e, "audit sink write failed");
            }
        }

        entry
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Newest first.
    pub async fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct BrokenSink;

    #[async_trait::async_trait]
    impl AuditSink for BrokenSink {
        async fn append(&self, _entry: &AuditEntry) -> anyhow::Result<()> {
            bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn timestamps_never_decrease() {
        let log = AuditLog::in_memory();
        let now = Utc::now();
        log.append_at(AuditAction::ShadowMode, "first", serde_json::json!({}), now)
            .await;
        let second = log
            .append_at(
                AuditAction::ShadowMode,
                "second",
                serde_json::json!({}),
                now - chrono::Duration::seconds(10),
            )
            .await;

        assert_eq!(second.timestamp, now);
        let all = log.entries().await;
        assert!(all.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn sink_failure_keeps_entry() {
        let log = AuditLog::new(Some(Arc::new(BrokenSink)));
        log.append(AuditAction::RerouteExecution, "switched", serde_json::json!({}))
            .await;
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn recent_is_newest_first() {
        let log = AuditLog::in_memory();
        for i in 0..3 {
            log.append(AuditAction::Other("TEST".to_string()), format!("e{}", i), serde_json::json!({}))
                .await;
        }
        let recent = log.recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].log_text, "e2");
        assert_eq!(recent[1].log_text, "e1");
    }
}
