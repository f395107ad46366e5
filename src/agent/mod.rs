pub mod anomaly;
pub mod control_loop;
pub mod executor;
pub mod fix_memory;
pub mod routing_table;
pub mod rule_engine;
pub mod state;
