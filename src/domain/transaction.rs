use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "SUCCESS" => TransactionStatus::Success,
            _ => TransactionStatus::Failed,
        }
    }
}

/// A single recorded payment attempt. Owned by the ingestion side; the agent
/// only ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub bank: String,
    pub gateway: String,
    pub amount: f64,
    pub status: TransactionStatus,
    pub error_code: Option<String>,
}

impl TransactionOutcome {
    pub fn is_failed(&self) -> bool {
        self.status == TransactionStatus::Failed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionStats {
    pub total: i64,
    pub failed: i64,
}

impl TransactionStats {
    /// Success rate as a percentage rounded to two decimals. An empty store
    /// reports 100.
    pub fn success_rate_pct(&self) -> f64 {
        if self.total <= 0 {
            return 100.0;
        }
        let rate = (self.total - self.failed) as f64 / self.total as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_rounds_to_two_decimals() {
        let stats = TransactionStats { total: 3, failed: 1 };
        assert_eq!(stats.success_rate_pct(), 66.67);
        assert_eq!(TransactionStats::default().success_rate_pct(), 100.0);
    }

    #[test]
    fn unknown_status_reads_as_failed() {
        assert_eq!(TransactionStatus::parse("SUCCESS"), TransactionStatus::Success);
        assert_eq!(TransactionStatus::parse("TIMEOUT"), TransactionStatus::Failed);
    }
}
