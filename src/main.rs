use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use gateway_autopilot::agent::anomaly::{AnomalyGate, BASELINE};
use gateway_autopilot::agent::control_loop::{ControlLoop, LoopHandle};
use gateway_autopilot::agent::executor::RemediationExecutor;
use gateway_autopilot::agent::routing_table::RoutingTable;
use gateway_autopilot::agent::state::AgentState;
use gateway_autopilot::audit::log::AuditLog;
use gateway_autopilot::audit::AuditSink;
use gateway_autopilot::config::{AppConfig, StoreBackend};
use gateway_autopilot::repo::audit_repo::AuditRepo;
use gateway_autopilot::repo::memory::MemoryTransactionStore;
use gateway_autopilot::repo::transaction_store::TransactionStore;
use gateway_autopilot::repo::transactions_repo::TransactionsRepo;
use gateway_autopilot::service::simulator::OutageSimulator;
use gateway_autopilot::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    let loop_config = cfg.loop_config();

    let (pool, store, sink): (
        Option<sqlx::PgPool>,
        Arc<dyn TransactionStore>,
        Option<Arc<dyn AuditSink>>,
    ) = match cfg.store_backend {
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(&cfg.database_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            let store: Arc<dyn TransactionStore> = Arc::new(TransactionsRepo { pool: pool.clone() });
            let sink: Arc<dyn AuditSink> = Arc::new(AuditRepo { pool: pool.clone() });
            (Some(pool), store, Some(sink))
        }
        StoreBackend::Memory => {
            tracing::info!("using in-memory transaction store");
            let store: Arc<dyn TransactionStore> = Arc::new(MemoryTransactionStore::new());
            (None, store, None)
        }
    };

    tracing::info!("training anomaly gate");
    let gate = match AnomalyGate::train(&BASELINE, cfg.anomaly_contamination) {
        Ok(gate) => gate,
        Err(e) => {
            tracing::warn!(error = %e, "anomaly gate training failed, gate disabled");
            AnomalyGate::disabled()
        }
    };
    let gate = Arc::new(gate);

    let audit_log = AuditLog::new(sink);
    let state = AgentState::new(RoutingTable::seeded(&cfg.known_banks), cfg.shadow_mode).shared();
    let executor = RemediationExecutor::new(state.clone(), audit_log.clone());

    let (handle, signals) = LoopHandle::channel(loop_config.signal_buffer);
    let control_loop = Arc::new(ControlLoop {
        state: state.clone(),
        store: store.clone(),
        gate: gate.clone(),
        executor,
        config: loop_config.clone(),
    });
    tokio::spawn(control_loop.clone().run(signals));

    let simulator = OutageSimulator {
        state,
        store: store.clone(),
        gate,
        handle,
        tick: loop_config.tick,
    };
    tokio::spawn(simulator.run());

    let app_state = AppState {
        control_loop,
        audit_log,
        store,
        pool,
    };

    let admin_routes = Router::new()
        .route(
            "/admin/toggle_shadow",
            post(gateway_autopilot::http::handlers::agent::toggle_shadow_mode),
        )
        .layer(from_fn_with_state(
            cfg.internal_api_key.clone(),
            gateway_autopilot::http::middleware::admin_auth::require_internal_api_key,
        ));

    let app = Router::new()
        .route("/", get(gateway_autopilot::http::handlers::agent::health))
        .route(
            "/routing-table",
            get(gateway_autopilot::http::handlers::agent::routing_table),
        )
        .route("/stats", get(gateway_autopilot::http::handlers::agent::stats))
        .route(
            "/agent/trigger",
            post(gateway_autopilot::http::handlers::agent::trigger_cycle),
        )
        .route(
            "/audit/logs",
            get(gateway_autopilot::http::handlers::audit::list_logs),
        )
        .route(
            "/simulation/trigger",
            post(gateway_autopilot::http::handlers::simulation::trigger_incident),
        )
        .route(
            "/simulation/stop",
            post(gateway_autopilot::http::handlers::simulation::stop_incident),
        )
        .route("/ops/readiness", get(gateway_autopilot::http::handlers::ops::readiness))
        .route("/ops/liveness", get(gateway_autopilot::http::handlers::ops::liveness))
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
