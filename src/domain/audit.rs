use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditAction {
    RerouteExecution,
    ShadowMode,
    ShadowModeToggled,
    SimulationStarted,
    SimulationStopped,
    Other(String),
}

impl AuditAction {
    pub fn as_str(&self) -> &str {
        match self {
            AuditAction::RerouteExecution => "REROUTE_EXECUTION",
            AuditAction::ShadowMode => "SHADOW_MODE",
            AuditAction::ShadowModeToggled => "SHADOW_MODE_TOGGLED",
            AuditAction::SimulationStarted => "SIMULATION_STARTED",
            AuditAction::SimulationStopped => "SIMULATION_STOPPED",
            AuditAction::Other(s) => s.as_str(),
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "REROUTE_EXECUTION" => AuditAction::RerouteExecution,
            "SHADOW_MODE" => AuditAction::ShadowMode,
            "SHADOW_MODE_TOGGLED" => AuditAction::ShadowModeToggled,
            "SIMULATION_STARTED" => AuditAction::SimulationStarted,
            "SIMULATION_STOPPED" => AuditAction::SimulationStopped,
            other => AuditAction::Other(other.to_string()),
        }
    }
}

impl Serialize for AuditAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuditAction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(AuditAction::parse(&s))
    }
}

/// One immutable decision record. The field names match the `agent_logs`
/// table so the dashboard can read either source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub action_type: AuditAction,
    pub log_text: String,
    pub metadata: serde_json::Value,
}
