use crate::domain::routing::RoutingAssignment;
use std::collections::BTreeMap;

/// Live bank -> gateway assignments. Banks are only ever added or updated.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    assignments: BTreeMap<String, RoutingAssignment>,
}

impl RoutingTable {
    pub fn seeded<I, S>(banks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let assignments = banks
            .into_iter()
            .map(|b| {
                let bank = b.as_ref().to_uppercase();
                let assignment = RoutingAssignment::primary(&bank);
                (bank, assignment)
            })
            .collect();
        Self { assignments }
    }

    pub fn get(&self, bank: &str) -> Option<&RoutingAssignment> {
        self.assignments.get(bank)
    }

    pub fn set(&mut self, bank: &str, assignment: RoutingAssignment) {
        self.assignments.insert(bank.to_string(), assignment);
    }

    pub fn snapshot(&self) -> BTreeMap<String, RoutingAssignment> {
        self.assignments.clone()
    }

    pub fn rerouted_count(&self) -> usize {
        self.assignments.values().filter(|a| a.is_rerouted()).count()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::routing::RouteState;

    #[test]
    fn seeds_primary_assignment_per_bank() {
        let table = RoutingTable::seeded(["hdfc", "SBI"]);
        assert_eq!(table.len(), 2);
        let hdfc = table.get("HDFC").unwrap();
        assert_eq!(hdfc.state, RouteState::Primary);
        assert_eq!(hdfc.gateway, "HDFC_Gateway");
    }

    #[test]
    fn set_updates_in_place() {
        let mut table = RoutingTable::seeded(["HDFC"]);
        table.set("HDFC", RoutingAssignment::rerouted("Razorpay"));
        table.set("HDFC", RoutingAssignment::rerouted("Razorpay"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.rerouted_count(), 1);
        assert_eq!(table.get("HDFC").unwrap().gateway, "Razorpay");
    }
}
