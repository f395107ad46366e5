use crate::agent::anomaly::{AnomalyGate, Verdict};
use crate::agent::executor::{ExecutionResult, RemediationExecutor};
use crate::agent::rule_engine::{detect_cluster, ClusterCandidate, RuleThresholds};
use crate::agent::state::{LoopPhase, SharedState, SimulationMode, StateSnapshot};
use crate::domain::audit::AuditAction;
use crate::domain::routing::RoutingAssignment;
use crate::repo::transaction_store::TransactionStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub tick: Duration,
    pub cooldown: chrono::Duration,
    pub thresholds: RuleThresholds,
    pub default_gateway: String,
    pub signal_buffer: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            cooldown: chrono::Duration::seconds(5),
            thresholds: RuleThresholds::default(),
            default_gateway: "Razorpay".to_string(),
            signal_buffer: 64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriggerSignal {
    pub source: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub failures_seen: usize,
    pub latest_verdict: Verdict,
    pub candidate: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    CoolingDown { remaining_ms: i64 },
    Busy,
    FetchFailed { error: String },
    NoAction { report: CycleReport },
    /// The cluster's bank already routes to the gateway the loop would pick.
    AlreadyRemediated { report: CycleReport, gateway: String },
    Remediated { report: CycleReport, result: ExecutionResult },
}

impl CycleOutcome {
    pub fn ran(&self) -> bool {
        matches!(
            self,
            CycleOutcome::FetchFailed { .. }
                | CycleOutcome::NoAction { .. }
                | CycleOutcome::AlreadyRemediated { .. }
                | CycleOutcome::Remediated { .. }
        )
    }
}

/// observe -> decide -> act. Every trigger, ticker or signal, goes through
/// [`ControlLoop::trigger_cycle_at`].
pub struct ControlLoop {
    pub state: SharedState,
    pub store: Arc<dyn TransactionStore>,
    pub gate: Arc<AnomalyGate>,
    pub executor: RemediationExecutor,
    pub config: LoopConfig,
}

impl ControlLoop {
    pub async fn trigger_cycle(&self, source: &str) -> CycleOutcome {
        self.trigger_cycle_at(source, Utc::now()).await
    }

    pub async fn trigger_cycle_at(&self, source: &str, now: DateTime<Utc>) -> CycleOutcome {
        let guard = match self.enter_cycle(now).await {
            Ok(guard) => guard,
            Err(rejected) => return rejected,
        };

        tracing::info!(trigger = %source, "agent waking up");
        let outcome = self.run_cycle(source, now).await;

        guard.release().await;
        outcome
    }

    /// IDLE -> RUNNING-CYCLE. `last_run` is stamped here, before any I/O.
    async fn enter_cycle(&self, now: DateTime<Utc>) -> Result<CycleGuard, CycleOutcome> {
        let mut state = self.state.lock().await;
        if state.phase == LoopPhase::RunningCycle {
            tracing::debug!("cycle already running, trigger ignored");
            return Err(CycleOutcome::Busy);
        }
        if let Some(last) = state.last_run {
            let elapsed = now - last;
            if elapsed < self.config.cooldown {
                let remaining_ms = (self.config.cooldown - elapsed).num_milliseconds();
                tracing::debug!(remaining_ms, "cooling down, trigger ignored");
                return Err(CycleOutcome::CoolingDown { remaining_ms });
            }
        }
        state.last_run = Some(now);
        state.phase = LoopPhase::RunningCycle;
        Ok(CycleGuard {
            state: Some(self.state.clone()),
        })
    }

    async fn run_cycle(&self, source: &str, now: DateTime<Utc>) -> CycleOutcome {
        let failures = match self
            .store
            .fetch_recent_failures(self.config.thresholds.failure_window)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch recent failures, cycle aborted");
                return CycleOutcome::FetchFailed { error: e.to_string() };
            }
        };

        let latest_verdict = failures
            .first()
            .map(|t| self.gate.classify(t.is_failed(), t.amount))
            .unwrap_or(Verdict::Normal);
        let cluster = detect_cluster(&failures, &self.config.thresholds);

        let mut report = CycleReport {
            source: source.to_string(),
            started_at: now,
            failures_seen: failures.len(),
            latest_verdict,
            candidate: None,
        };

        let Some(ClusterCandidate { bank, failure_count }) = cluster else {
            tracing::debug!(failures = failures.len(), verdict = ?latest_verdict, "no failure cluster");
            return CycleOutcome::NoAction { report };
        };
        tracing::warn!(bank = %bank, failure_count, "rule engine detected failure cluster");

        let (target, remembered, already_routed) = {
            let state = self.state.lock().await;
            let target = state
                .fix_memory
                .resolve_target(&bank, &self.config.default_gateway);
            let already_routed = state
                .routing_table
                .get(&bank)
                .is_some_and(|a| a.is_rerouted() && a.gateway == target);
            (target, state.fix_memory.lookup(&bank).is_some(), already_routed)
        };

        // Failures stay in the window after a heal; re-applying the same route
        // would only grow the audit log.
        if already_routed {
            tracing::debug!(bank = %bank, gateway = %target, "cluster already rerouted, nothing to do");
            report.candidate = Some(bank);
            return CycleOutcome::AlreadyRemediated { report, gateway: target };
        }
        if remembered {
            tracing::info!(bank = %bank, gateway = %target, "memory recall: reusing previous fix");
        }

        let provenance = serde_json::json!({
            "trigger": source,
            "failure_count": failure_count,
            "latest_verdict": latest_verdict,
        });
        let result = self.executor.reroute_with(&bank, &target, provenance, now).await;
        report.candidate = Some(bank);

        CycleOutcome::Remediated { report, result }
    }

    pub async fn routing_table(&self) -> BTreeMap<String, RoutingAssignment> {
        self.state.lock().await.routing_table.snapshot()
    }

    pub async fn snapshot(&self) -> StateSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn set_shadow_mode(&self, enabled: bool) {
        let previous = {
            let mut state = self.state.lock().await;
            std::mem::replace(&mut state.shadow_mode, enabled)
        };
        if previous != enabled {
            self.executor
                .audit_log
                .append(
                    AuditAction::ShadowModeToggled,
                    format!("Shadow Mode is now {}", if enabled { "ON" } else { "OFF" }),
                    serde_json::json!({ "enabled": enabled }),
                )
                .await;
        }
    }

    /// Starts a simulated outage for `bank`; the simulator picks it up on its
    /// next tick.
    pub async fn request_incident(&self, bank: &str) -> String {
        let bank = bank.trim().to_uppercase();
        let label = {
            let mut state = self.state.lock().await;
            state.simulation_mode = SimulationMode::Outage(bank.clone());
            state.simulation_mode.label()
        };
        self.executor
            .audit_log
            .append(
                AuditAction::SimulationStarted,
                format!("Started outage for {}", bank),
                serde_json::json!({ "bank": bank, "mode": label }),
            )
            .await;
        label
    }

    pub async fn stop_incident(&self) {
        let previous = {
            let mut state = self.state.lock().await;
            std::mem::replace(&mut state.simulation_mode, SimulationMode::Normal)
        };
        if let SimulationMode::Outage(bank) = previous {
            self.executor
                .audit_log
                .append(
                    AuditAction::SimulationStopped,
                    format!("Stopped outage for {}", bank),
                    serde_json::json!({ "bank": bank }),
                )
                .await;
        }
    }

    /// Drives routine cycles from the ticker and anomaly cycles from
    /// `signals` until the signal channel closes.
    pub async fn run(self: Arc<Self>, mut signals: mpsc::Receiver<TriggerSignal>) {
        let mut ticker = tokio::time::interval(self.config.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.trigger_cycle("Ticker").await;
                }
                signal = signals.recv() => {
                    match signal {
                        Some(signal) => {
                            self.trigger_cycle(&signal.source).await;
                        }
                        None => {
                            tracing::info!("trigger channel closed, control loop stopping");
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Holds the loop in RUNNING-CYCLE. Dropping it without [`CycleGuard::release`]
/// (the triggering future was cancelled mid-cycle) still returns the loop to
/// IDLE.
struct CycleGuard {
    state: Option<SharedState>,
}

impl CycleGuard {
    async fn release(mut self) {
        if let Some(state) = &self.state {
            state.lock().await.phase = LoopPhase::Idle;
        }
        self.state = None;
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        tracing::warn!("cycle cancelled before completion");
        let released = match state.try_lock() {
            Ok(mut guard) => {
                guard.phase = LoopPhase::Idle;
                true
            }
            Err(_) => false,
        };
        if released {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                rt.spawn(async move {
                    state.lock().await.phase = LoopPhase::Idle;
                });
            }
            Err(e) => tracing::error!(error = %e, "cannot release cycle phase outside a runtime"),
        }
    }
}

/// Cloneable sender side of the anomaly signal channel.
#[derive(Clone)]
pub struct LoopHandle {
    tx: mpsc::Sender<TriggerSignal>,
}

impl LoopHandle {
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<TriggerSignal>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }

    /// Never blocks. A full channel drops the signal; a cycle is either
    /// already queued or the cooldown would reject it.
    pub fn signal(&self, source: &str) -> bool {
        match self.tx.try_send(TriggerSignal {
            source: source.to_string(),
        }) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "trigger signal dropped");
                false
            }
        }
    }
}
