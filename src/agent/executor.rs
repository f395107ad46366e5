use crate::agent::state::SharedState;
use crate::audit::log::AuditLog;
use crate::domain::audit::AuditAction;
use crate::domain::routing::RoutingAssignment;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_FEE_PCT: f64 = 1.5;

/// Simulated processing fee per gateway, in percent.
#[derive(Debug, Clone)]
pub struct FeeTable {
    fees: HashMap<String, f64>,
    default_fee_pct: f64,
}

impl Default for FeeTable {
    fn default() -> Self {
        let fees = [("Razorpay", 1.2), ("Stripe", 1.5), ("PayU", 1.1)]
            .into_iter()
            .map(|(g, f)| (g.to_string(), f))
            .collect();
        Self {
            fees,
            default_fee_pct: DEFAULT_FEE_PCT,
        }
    }
}

impl FeeTable {
    pub fn fee_for(&self, gateway: &str) -> f64 {
        self.fees.get(gateway).copied().unwrap_or(self.default_fee_pct)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Simulated,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub bank: String,
    pub gateway: String,
    pub fee_pct: f64,
    pub message: String,
}

#[derive(Clone)]
pub struct RemediationExecutor {
    pub state: SharedState,
    pub audit_log: AuditLog,
    pub fees: FeeTable,
}

impl RemediationExecutor {
    pub fn new(state: SharedState, audit_log: AuditLog) -> Self {
        Self {
            state,
            audit_log,
            fees: FeeTable::default(),
        }
    }

    pub async fn reroute(&self, bank: &str, target_gateway: &str) -> ExecutionResult {
        self.reroute_with(bank, target_gateway, serde_json::json!({}), Utc::now())
            .await
    }

    /// Applies the reroute, or only audits it when shadow mode is on.
    /// `provenance` is merged into the audit metadata as-is.
    pub async fn reroute_with(
        &self,
        bank: &str,
        target_gateway: &str,
        provenance: serde_json::Value,
        now: DateTime<Utc>,
    ) -> ExecutionResult {
        let fee_pct = self.fees.fee_for(target_gateway);

        // shadow check and mutation happen under one lock
        let shadow = {
            let mut state = self.state.lock().await;
            if state.shadow_mode {
                true
            } else {
                state
                    .routing_table
                    .set(bank, RoutingAssignment::rerouted(target_gateway));
                state.fix_memory.record(bank, target_gateway);
                false
            }
        };

        let mut metadata = serde_json::json!({
            "bank": bank,
            "gateway": target_gateway,
            "fee_pct": fee_pct,
            "shadow_mode": shadow,
        });
        if let (Some(meta), serde_json::Value::Object(extra)) = (metadata.as_object_mut(), provenance) {
            meta.extend(extra);
        }

        if shadow {
            let text = format!(
                "Predicted impact: Rerouting {} to {} increases fees by {}%",
                bank, target_gateway, fee_pct
            );
            self.audit_log
                .append_at(AuditAction::ShadowMode, text, metadata, now)
                .await;
            return ExecutionResult {
                status: ExecutionStatus::Simulated,
                bank: bank.to_string(),
                gateway: target_gateway.to_string(),
                fee_pct,
                message: format!("Simulated reroute of {}", bank),
            };
        }

        let text = format!("Switched {} traffic to {} (Fee: {}%)", bank, target_gateway, fee_pct);
        self.audit_log
            .append_at(AuditAction::RerouteExecution, text, metadata, now)
            .await;
        tracing::info!(bank = %bank, gateway = %target_gateway, fee_pct, "traffic rerouted");

        ExecutionResult {
            status: ExecutionStatus::Success,
            bank: bank.to_string(),
            gateway: target_gateway.to_string(),
            fee_pct,
            message: format!("Rerouted {} to {}", bank, target_gateway),
        }
    }
}
