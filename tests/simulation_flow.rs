use gateway_autopilot::agent::anomaly::AnomalyGate;
use gateway_autopilot::agent::control_loop::{ControlLoop, CycleOutcome, LoopConfig, LoopHandle};
use gateway_autopilot::agent::executor::RemediationExecutor;
use gateway_autopilot::agent::routing_table::RoutingTable;
use gateway_autopilot::agent::state::AgentState;
use gateway_autopilot::audit::log::AuditLog;
use gateway_autopilot::domain::transaction::TransactionStatus;
use gateway_autopilot::repo::memory::MemoryTransactionStore;
use gateway_autopilot::repo::transaction_store::TransactionStore;
use gateway_autopilot::service::simulator::OutageSimulator;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn simulated_outage_is_detected_and_healed() {
    let store = MemoryTransactionStore::new();
    let state = AgentState::new(RoutingTable::seeded(["HDFC", "SBI"]), false).shared();
    let gate = Arc::new(AnomalyGate::with_default_baseline().unwrap());
    let audit_log = AuditLog::in_memory();

    let agent = ControlLoop {
        state: state.clone(),
        store: Arc::new(store.clone()),
        gate: gate.clone(),
        executor: RemediationExecutor::new(state.clone(), audit_log.clone()),
        config: LoopConfig::default(),
    };
    let (handle, mut signals) = LoopHandle::channel(16);
    let simulator = OutageSimulator {
        state,
        store: Arc::new(store.clone()),
        gate,
        handle,
        tick: Duration::from_millis(10),
    };

    agent.request_incident("HDFC").await;
    for _ in 0..3 {
        let outcome = simulator.tick().await.unwrap().unwrap();
        assert_eq!(outcome.status, TransactionStatus::Failed);
    }
    assert!(signals.try_recv().is_ok());

    let outcome = agent.trigger_cycle("Rule_Failure").await;
    assert!(matches!(outcome, CycleOutcome::Remediated { .. }));

    let healed = simulator.tick().await.unwrap().unwrap();
    assert_eq!(healed.status, TransactionStatus::Success);
    assert_eq!(healed.gateway, "Razorpay");

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.success_rate_pct(), 25.0);
}
