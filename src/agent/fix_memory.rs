use crate::domain::routing::IncidentClass;
use std::collections::HashMap;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FixKey {
    pub bank: String,
    pub incident: IncidentClass,
}

/// Remembers, per bank and incident class, the gateway that last resolved it.
/// Entries are overwritten, never merged or expired.
#[derive(Debug, Default)]
pub struct FixMemory {
    entries: HashMap<FixKey, String>,
}

impl FixMemory {
    fn key(bank: &str) -> FixKey {
        FixKey {
            bank: bank.to_string(),
            incident: IncidentClass::Outage,
        }
    }

    pub fn lookup(&self, bank: &str) -> Option<&str> {
        self.entries.get(&Self::key(bank)).map(String::as_str)
    }

    pub fn record(&mut self, bank: &str, gateway: &str) {
        self.entries.insert(Self::key(bank), gateway.to_string());
    }

    /// Remembered gateway for `bank`, else `default_gateway`.
    pub fn resolve_target(&self, bank: &str, default_gateway: &str) -> String {
        self.lookup(bank).unwrap_or(default_gateway).to_string()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_overwrites_previous_fix() {
        let mut mem = FixMemory::default();
        assert_eq!(mem.lookup("HDFC"), None);

        mem.record("HDFC", "Razorpay");
        mem.record("HDFC", "PayU");
        assert_eq!(mem.lookup("HDFC"), Some("PayU"));
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn falls_back_to_default_gateway() {
        let mut mem = FixMemory::default();
        assert_eq!(mem.resolve_target("SBI", "Razorpay"), "Razorpay");
        mem.record("SBI", "Stripe");
        assert_eq!(mem.resolve_target("SBI", "Razorpay"), "Stripe");
    }
}
