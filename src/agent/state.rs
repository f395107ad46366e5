use crate::agent::fix_memory::FixMemory;
use crate::agent::routing_table::RoutingTable;
use crate::domain::routing::RoutingAssignment;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoopPhase {
    Idle,
    RunningCycle,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub enum SimulationMode {
    Normal,
    Outage(String),
}

impl SimulationMode {
    pub fn label(&self) -> String {
        match self {
            SimulationMode::Normal => "NORMAL".to_string(),
            SimulationMode::Outage(bank) => format!("{}_OUTAGE", bank),
        }
    }

    pub fn outage_bank(&self) -> Option<&str> {
        match self {
            SimulationMode::Normal => None,
            SimulationMode::Outage(bank) => Some(bank.as_str()),
        }
    }
}

/// Everything the ticker and the request handlers both touch. Always accessed
/// through [`SharedState`].
#[derive(Debug)]
pub struct AgentState {
    pub routing_table: RoutingTable,
    pub fix_memory: FixMemory,
    pub last_run: Option<DateTime<Utc>>,
    pub phase: LoopPhase,
    pub shadow_mode: bool,
    pub simulation_mode: SimulationMode,
}

pub type SharedState = Arc<Mutex<AgentState>>;

impl AgentState {
    pub fn new(routing_table: RoutingTable, shadow_mode: bool) -> Self {
        Self {
            routing_table,
            fix_memory: FixMemory::default(),
            last_run: None,
            phase: LoopPhase::Idle,
            shadow_mode,
            simulation_mode: SimulationMode::Normal,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            routing_table: self.routing_table.snapshot(),
            simulation_mode: self.simulation_mode.label(),
            shadow_mode: self.shadow_mode,
            phase: self.phase,
            last_agent_run: self.last_run,
            remembered_fixes: self.fix_memory.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub routing_table: BTreeMap<String, RoutingAssignment>,
    pub simulation_mode: String,
    pub shadow_mode: bool,
    pub phase: LoopPhase,
    pub last_agent_run: Option<DateTime<Utc>>,
    pub remembered_fixes: usize,
}
