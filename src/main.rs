use std::sync::Arc;

use bankledger::{
    api::{self, AppState},
    config::{CliArgs, Config, LoggingConfig},
    service::AccountService,
};
use bankledger_memory::{InMemoryAccountStore, InMemoryTransactionStore};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();
    let config = Config::load(&cli);
    init_tracing(&config.logging);

    let metrics = if config.metrics.enabled {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Prometheus recorder not installed");
                None
            }
        }
    } else {
        tracing::info!("Metrics disabled by configuration");
        None
    };

    let transactions = Arc::new(InMemoryTransactionStore::new());
    let accounts = Arc::new(InMemoryAccountStore::new(transactions.clone()));
    let service = Arc::new(AccountService::new(accounts, transactions));

    let app = api::router(AppState { service, metrics });
    let addr = config.listen_addr()?;

    tracing::info!(%addr, "API listening");

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
