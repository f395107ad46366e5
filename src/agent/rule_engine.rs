use crate::domain::transaction::TransactionOutcome;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct RuleThresholds {
    pub failure_window: i64,
    pub cluster_threshold: usize,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            failure_window: 10,
            cluster_threshold: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCandidate {
    pub bank: String,
    pub failure_count: usize,
}

/// Failure counts per bank, in the order each bank was first seen.
pub fn failure_counts(recent_failures: &[TransactionOutcome]) -> Vec<(String, usize)> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for outcome in recent_failures.iter().filter(|t| t.is_failed()) {
        match index.get(outcome.bank.as_str()) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(outcome.bank.as_str(), order.len());
                order.push((outcome.bank.clone(), 1));
            }
        }
    }

    order
}

/// Picks the first bank, in scan order, whose failure count reaches the
/// threshold. At most one candidate per cycle.
pub fn detect_cluster(
    recent_failures: &[TransactionOutcome],
    thresholds: &RuleThresholds,
) -> Option<ClusterCandidate> {
    failure_counts(recent_failures)
        .into_iter()
        .find(|(_, count)| *count >= thresholds.cluster_threshold)
        .map(|(bank, failure_count)| ClusterCandidate { bank, failure_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::TransactionStatus;

    fn failed(bank: &str, seq: i64) -> TransactionOutcome {
        TransactionOutcome {
            id: format!("TXN_{}", seq),
            timestamp: chrono::Utc::now() - chrono::Duration::seconds(seq),
            bank: bank.to_string(),
            gateway: format!("{}_Gateway", bank),
            amount: 250.0,
            status: TransactionStatus::Failed,
            error_code: Some("TIMEOUT_504".to_string()),
        }
    }

    #[test]
    fn detects_bank_at_threshold() {
        let rows = vec![failed("HDFC", 1), failed("SBI", 2), failed("HDFC", 3), failed("HDFC", 4)];
        let out = detect_cluster(&rows, &RuleThresholds::default());
        assert_eq!(
            out,
            Some(ClusterCandidate {
                bank: "HDFC".to_string(),
                failure_count: 3
            })
        );
    }

    #[test]
    fn below_threshold_is_no_action() {
        let rows = vec![failed("HDFC", 1), failed("SBI", 2), failed("HDFC", 3), failed("ICICI", 4)];
        assert!(detect_cluster(&rows, &RuleThresholds::default()).is_none());
    }

    #[test]
    fn tie_break_follows_scan_order_not_magnitude() {
        let rows = vec![
            failed("SBI", 1),
            failed("HDFC", 2),
            failed("HDFC", 3),
            failed("HDFC", 4),
            failed("HDFC", 5),
            failed("SBI", 6),
            failed("SBI", 7),
        ];
        let out = detect_cluster(&rows, &RuleThresholds::default()).unwrap();
        assert_eq!(out.bank, "SBI");
        assert_eq!(out.failure_count, 3);
    }

    #[test]
    fn successes_are_not_counted() {
        let mut ok = failed("HDFC", 9);
        ok.status = TransactionStatus::Success;
        let rows = vec![failed("HDFC", 1), ok, failed("HDFC", 2)];
        assert_eq!(failure_counts(&rows), vec![("HDFC".to_string(), 2)]);
    }
}
