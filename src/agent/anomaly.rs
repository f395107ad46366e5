use anyhow::{anyhow, bail, Result};
use serde::Serialize;

/// Baseline of (failure flag, amount) pairs treated as normal variance. The
/// amounts span the range the outage simulator draws from (100..=5000), with
/// the last two rows as the contaminated tail.
pub const BASELINE: [(f64, f64); 20] = [
    (0.0, 120.0),
    (0.0, 420.0),
    (1.0, 650.0),
    (0.0, 900.0),
    (0.0, 1150.0),
    (0.0, 1400.0),
    (1.0, 1700.0),
    (0.0, 1950.0),
    (0.0, 2200.0),
    (0.0, 2450.0),
    (0.0, 2700.0),
    (1.0, 2950.0),
    (0.0, 3200.0),
    (0.0, 3450.0),
    (0.0, 3750.0),
    (1.0, 4000.0),
    (0.0, 4300.0),
    (0.0, 4600.0),
    (2.0, 4950.0),
    (3.0, 6400.0),
];

pub const DEFAULT_CONTAMINATION: f64 = 0.1;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Normal,
    Anomalous,
}

#[derive(Debug, Clone, Copy)]
struct FeatureStats {
    mean: f64,
    std_dev: f64,
}

impl FeatureStats {
    fn fit(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: var.sqrt(),
        }
    }

    fn z(&self, v: f64) -> f64 {
        if self.std_dev == 0.0 {
            if v == self.mean {
                0.0
            } else {
                f64::INFINITY
            }
        } else {
            (v - self.mean).abs() / self.std_dev
        }
    }
}

#[derive(Debug, Clone)]
struct Model {
    flag: FeatureStats,
    amount: FeatureStats,
    threshold: f64,
}

impl Model {
    fn score(&self, failure_flag: f64, amount: f64) -> f64 {
        self.flag.z(failure_flag).max(self.amount.z(amount))
    }
}

/// Secondary trigger: flags observations that sit outside the baseline's
/// spread. The score is the largest per-feature z-score; the cut-off is the
/// baseline score quantile at `1 - contamination`.
///
/// A gate without a model classifies everything as normal.
#[derive(Debug, Clone)]
pub struct AnomalyGate {
    model: Option<Model>,
}

impl AnomalyGate {
    pub fn train(baseline: &[(f64, f64)], contamination: f64) -> Result<Self> {
        if baseline.is_empty() {
            bail!("anomaly baseline is empty");
        }
        if !(0.0..0.5).contains(&contamination) {
            bail!("contamination must be in [0, 0.5), got {}", contamination);
        }
        if baseline.iter().any(|(f, a)| !f.is_finite() || !a.is_finite()) {
            bail!("anomaly baseline contains non-finite values");
        }

        let flags: Vec<f64> = baseline.iter().map(|(f, _)| *f).collect();
        let amounts: Vec<f64> = baseline.iter().map(|(_, a)| *a).collect();
        let mut model = Model {
            flag: FeatureStats::fit(&flags),
            amount: FeatureStats::fit(&amounts),
            threshold: 0.0,
        };

        let mut scores: Vec<f64> = baseline.iter().map(|(f, a)| model.score(*f, *a)).collect();
        scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        model.threshold = quantile(&scores, 1.0 - contamination);

        Ok(Self { model: Some(model) })
    }

    pub fn with_default_baseline() -> Result<Self> {
        Self::train(&BASELINE, DEFAULT_CONTAMINATION)
    }

    pub fn disabled() -> Self {
        Self { model: None }
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    pub fn try_classify(&self, failed: bool, amount: f64) -> Result<Verdict> {
        let model = self.model.as_ref().ok_or_else(|| anyhow!("anomaly gate is not trained"))?;
        if !amount.is_finite() {
            bail!("amount {} is not finite", amount);
        }
        let flag = if failed { 1.0 } else { 0.0 };
        if model.score(flag, amount) > model.threshold {
            Ok(Verdict::Anomalous)
        } else {
            Ok(Verdict::Normal)
        }
    }

    /// Classifier errors degrade to `Normal` so the rule path is never blocked.
    pub fn classify(&self, failed: bool, amount: f64) -> Verdict {
        match self.try_classify(failed, amount) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "anomaly classification failed, treating as normal");
                Verdict::Normal
            }
        }
    }
}

fn quantile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_like_observation_is_normal() {
        let gate = AnomalyGate::with_default_baseline().unwrap();
        assert_eq!(gate.classify(false, 2_500.0), Verdict::Normal);
        assert_eq!(gate.classify(true, 900.0), Verdict::Normal);
    }

    #[test]
    fn successful_simulator_traffic_is_mostly_normal() {
        let gate = AnomalyGate::with_default_baseline().unwrap();
        for amount in [250.0, 1_000.0, 2_500.0, 4_500.0, 5_000.0] {
            assert_eq!(gate.classify(false, amount), Verdict::Normal, "amount {}", amount);
        }

        let anomalous = (100..=5000)
            .filter(|a| gate.classify(false, *a as f64) == Verdict::Anomalous)
            .count();
        assert!(anomalous <= 49, "{} of 4901 flagged", anomalous);
    }

    #[test]
    fn threshold_honours_contamination() {
        let gate = AnomalyGate::with_default_baseline().unwrap();
        let model = gate.model.as_ref().unwrap();
        let above = BASELINE
            .iter()
            .filter(|(f, a)| model.score(*f, *a) > model.threshold)
            .count();
        assert_eq!(above, 2);
    }

    #[test]
    fn far_outlier_is_anomalous() {
        let gate = AnomalyGate::with_default_baseline().unwrap();
        assert_eq!(gate.classify(true, 50_000.0), Verdict::Anomalous);
        assert_eq!(gate.classify(false, 9_000.0), Verdict::Anomalous);
    }

    #[test]
    fn failures_degrade_to_normal() {
        let gate = AnomalyGate::disabled();
        assert!(gate.try_classify(true, 50_000.0).is_err());
        assert_eq!(gate.classify(true, 50_000.0), Verdict::Normal);

        let trained = AnomalyGate::with_default_baseline().unwrap();
        assert_eq!(trained.classify(true, f64::NAN), Verdict::Normal);
    }

    #[test]
    fn rejects_bad_training_input() {
        assert!(AnomalyGate::train(&[], 0.1).is_err());
        assert!(AnomalyGate::train(&BASELINE, 0.9).is_err());
    }
}
