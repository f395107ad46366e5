use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteState {
    Primary,
    Rerouted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoutingAssignment {
    pub gateway: String,
    pub state: RouteState,
}

impl RoutingAssignment {
    pub fn primary(bank: &str) -> Self {
        Self {
            gateway: format!("{}_Gateway", bank),
            state: RouteState::Primary,
        }
    }

    pub fn rerouted(gateway: &str) -> Self {
        Self {
            gateway: gateway.to_string(),
            state: RouteState::Rerouted,
        }
    }

    pub fn is_rerouted(&self) -> bool {
        self.state == RouteState::Rerouted
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentClass {
    Outage,
}
