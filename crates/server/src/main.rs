//! Sauti Server Entry Point

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use sauti_config::{load_settings, Settings};
use sauti_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.toml > config/default.toml > defaults
    let env = std::env::var("SAUTI_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        // eprintln until the tracing subscriber is up
        Ok(settings) => {
            eprintln!(
                "Configuration loaded (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        },
        Err(e) => {
            eprintln!("Warning: config load failed ({}), falling back to defaults", e);
            Settings::default()
        },
    };

    init_tracing(&config);

    tracing::info!("Starting Sauti Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let _metrics_handle = init_metrics();
    tracing::info!("Prometheus metrics exposed at /metrics");

    // Optionally initialize ScyllaDB persistence
    let store = if config.store.enabled {
        tracing::info!("Initializing ScyllaDB record store...");
        match init_store(&config).await {
            Ok(persistence) => {
                tracing::info!(
                    hosts = ?config.store.hosts,
                    keyspace = %config.store.keyspace,
                    "ScyllaDB record store initialized"
                );
                persistence.grievances
            },
            Err(e) => {
                tracing::error!(
                    "ScyllaDB unavailable ({}), records will be kept in memory only",
                    e
                );
                sauti_persistence::init_in_memory().grievances
            },
        }
    } else {
        tracing::info!("Persistence disabled, using in-memory record store");
        sauti_persistence::init_in_memory().grievances
    };

    let state = AppState::with_store(config.clone(), store)?;

    // Background sweep that finalizes abandoned voice sessions
    let cleanup_shutdown = state.sessions.start_cleanup_task();

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = cleanup_shutdown.send(true);
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves when Ctrl+C or SIGTERM arrives
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, shutting down gracefully...");
        }
    }
}

/// Console tracing subscriber. RUST_LOG wins over the configured level.
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "sauti={},tower_http=debug",
            config.observability.log_level
        )
        .into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}

/// Initialize the ScyllaDB-backed record store
async fn init_store(
    config: &Settings,
) -> Result<sauti_persistence::PersistenceLayer, sauti_persistence::StoreError> {
    let scylla_config = sauti_persistence::ScyllaConfig {
        hosts: config.store.hosts.clone(),
        keyspace: config.store.keyspace.clone(),
        replication_factor: config.store.replication_factor,
    };
    sauti_persistence::init(scylla_config).await
}
