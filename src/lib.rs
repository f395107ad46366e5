pub mod agent;
pub mod audit;
pub mod config;
pub mod domain {
    pub mod audit;
    pub mod routing;
    pub mod transaction;
}
pub mod http {
    pub mod handlers {
        pub mod agent;
        pub mod audit;
        pub mod ops;
        pub mod simulation;
    }
    pub mod middleware {
        pub mod admin_auth;
    }
}
pub mod repo {
    pub mod audit_repo;
    pub mod memory;
    pub mod transaction_store;
    pub mod transactions_repo;
}
pub mod service {
    pub mod simulator;
}

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub control_loop: Arc<agent::control_loop::ControlLoop>,
    pub audit_log: audit::log::AuditLog,
    pub store: Arc<dyn repo::transaction_store::TransactionStore>,
    pub pool: Option<sqlx::PgPool>,
}
