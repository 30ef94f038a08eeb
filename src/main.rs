use std::sync::OnceLock;

use anyhow::Context;
use chat_server::config::Config;
use chat_server::store::Store;
use chat_server::{db, server, AppState};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, warnings) = Config::load();

    initialize_logging(&config);
    tracing::info!("Logging system initialized.");
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    let db_pool = db::create_db_pool(&config.database_url, config.db_max_connections)
        .await
        .context("Failed to create database pool")?;
    tracing::info!("Database pool created successfully.");

    let state = AppState::new(Store::new(db_pool.clone()), config.bcrypt_cost);

    server::serve(state, config.grpc_addr(), server::shutdown_signal())
        .await
        .context("gRPC server failed")?;

    db_pool.close().await;
    tracing::info!("Server stopped.");
    Ok(())
}

/// Log su console e su file giornaliero. Il livello si imposta con
/// `RUST_LOG` (default `info`).
fn initialize_logging(config: &Config) {
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "chat_server.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Il guard deve vivere quanto il processo, altrimenti il file resta vuoto
    LOG_GUARD.set(guard).ok();

    let console_layer = fmt::Layer::new()
        .with_writer(std::io::stdout)
        .with_filter(env_filter());

    let file_layer = fmt::Layer::new()
        .with_writer(non_blocking_writer)
        .with_ansi(false)
        .with_filter(env_filter());

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
