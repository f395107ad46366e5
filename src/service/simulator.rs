use crate::agent::anomaly::{AnomalyGate, Verdict};
use crate::agent::control_loop::LoopHandle;
use crate::agent::state::SharedState;
use crate::domain::routing::RoutingAssignment;
use crate::domain::transaction::{TransactionOutcome, TransactionStatus};
use crate::repo::transaction_store::TransactionStore;
use anyhow::Result;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Generates traffic for a bank while a simulated outage is active and wakes
/// the control loop when a failure or an anomaly is observed.
#[derive(Clone)]
pub struct OutageSimulator {
    pub state: SharedState,
    pub store: Arc<dyn TransactionStore>,
    pub gate: Arc<AnomalyGate>,
    pub handle: LoopHandle,
    pub tick: Duration,
}

impl OutageSimulator {
    pub async fn run(self) {
        loop {
            if let Err(err) = self.tick().await {
                tracing::error!("simulator error: {}", err);
            }
            tokio::time::sleep(self.tick).await;
        }
    }

    /// One simulated transaction, if an outage is active. Returns the
    /// recorded outcome.
    pub async fn tick(&self) -> Result<Option<TransactionOutcome>> {
        let (bank, assignment) = {
            let state = self.state.lock().await;
            let Some(bank) = state.simulation_mode.outage_bank().map(str::to_string) else {
                return Ok(None);
            };
            let assignment = state
                .routing_table
                .get(&bank)
                .cloned()
                .unwrap_or_else(|| RoutingAssignment::primary(&bank));
            (bank, assignment)
        };

        let outcome = simulated_outcome(&bank, &assignment, rand::thread_rng().gen_range(100..=5000) as f64);
        self.store.record(&outcome).await?;

        if let Some(trigger) = wake_trigger(&self.gate, &outcome) {
            tracing::debug!(bank = %bank, trigger, "waking agent");
            self.handle.signal(trigger);
        }

        Ok(Some(outcome))
    }
}

/// Which signal, if any, an observed transaction raises. An anomalous amount
/// outranks a plain failure.
pub fn wake_trigger(gate: &AnomalyGate, outcome: &TransactionOutcome) -> Option<&'static str> {
    if gate.classify(outcome.is_failed(), outcome.amount) == Verdict::Anomalous {
        Some("ML_Anomaly")
    } else if outcome.is_failed() {
        Some("Rule_Failure")
    } else {
        None
    }
}

/// Traffic on a rerouted bank succeeds; on its primary gateway it times out.
pub fn simulated_outcome(bank: &str, assignment: &RoutingAssignment, amount: f64) -> TransactionOutcome {
    let status = if assignment.is_rerouted() {
        TransactionStatus::Success
    } else {
        TransactionStatus::Failed
    };

    TransactionOutcome {
        id: format!("TXN_{}", uuid::Uuid::new_v4().simple()),
        timestamp: chrono::Utc::now(),
        bank: bank.to_string(),
        gateway: assignment.gateway.clone(),
        amount,
        status,
        error_code: match status {
            TransactionStatus::Failed => Some("TIMEOUT_504".to_string()),
            TransactionStatus::Success => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::routing_table::RoutingTable;
    use crate::agent::state::{AgentState, SimulationMode};
    use crate::repo::memory::MemoryTransactionStore;

    fn simulator(store: MemoryTransactionStore) -> (OutageSimulator, tokio::sync::mpsc::Receiver<crate::agent::control_loop::TriggerSignal>) {
        let state = AgentState::new(RoutingTable::seeded(["HDFC"]), false).shared();
        let (handle, rx) = LoopHandle::channel(8);
        let sim = OutageSimulator {
            state,
            store: Arc::new(store),
            gate: Arc::new(AnomalyGate::disabled()),
            handle,
            tick: Duration::from_millis(10),
        };
        (sim, rx)
    }

    #[tokio::test]
    async fn idle_without_outage() {
        let store = MemoryTransactionStore::new();
        let (sim, _rx) = simulator(store.clone());
        assert!(sim.tick().await.unwrap().is_none());
        assert_eq!(store.stats().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn outage_records_failure_and_signals() {
        let store = MemoryTransactionStore::new();
        let (sim, mut rx) = simulator(store.clone());
        sim.state.lock().await.simulation_mode = SimulationMode::Outage("HDFC".to_string());

        let outcome = sim.tick().await.unwrap().unwrap();
        assert!(outcome.is_failed());
        assert_eq!(outcome.gateway, "HDFC_Gateway");
        assert_eq!(store.stats().await.unwrap().failed, 1);
        assert_eq!(rx.try_recv().unwrap().source, "Rule_Failure");
    }

    #[test]
    fn rerouted_bank_succeeds() {
        let out = simulated_outcome("HDFC", &RoutingAssignment::rerouted("Razorpay"), 300.0);
        assert_eq!(out.status, TransactionStatus::Success);
        assert_eq!(out.gateway, "Razorpay");
        assert!(out.error_code.is_none());
    }

    #[test]
    fn healed_traffic_at_typical_amounts_stays_quiet() {
        let gate = AnomalyGate::with_default_baseline().unwrap();
        let rerouted = RoutingAssignment::rerouted("Razorpay");
        for amount in [300.0, 1_200.0, 2_500.0, 4_000.0, 5_000.0] {
            let out = simulated_outcome("HDFC", &rerouted, amount);
            assert_eq!(wake_trigger(&gate, &out), None, "amount {}", amount);
        }

        let failed = simulated_outcome("HDFC", &RoutingAssignment::primary("HDFC"), 2_500.0);
        assert_eq!(wake_trigger(&gate, &failed), Some("Rule_Failure"));
        let outlier = simulated_outcome("HDFC", &rerouted, 50_000.0);
        assert_eq!(wake_trigger(&gate, &outlier), Some("ML_Anomaly"));
    }
}
