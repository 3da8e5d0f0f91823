use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use merx_api::{app, AppState};
use merx_order::OrderOrchestrator;
use merx_store::{Config, DbClient, HttpCatalogClient, HttpPaymentSessionClient, PgOrderRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merx_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Merx API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections).await?;
    db.migrate().await?;

    let catalog = HttpCatalogClient::new(
        &config.catalog.base_url,
        Duration::from_secs(config.catalog.timeout_seconds),
    )?;
    let payments = HttpPaymentSessionClient::new(
        &config.payments.base_url,
        Duration::from_secs(config.payments.timeout_seconds),
    )?;

    let orchestrator = OrderOrchestrator::new(
        Arc::new(PgOrderRepository::new(db.pool.clone())),
        Arc::new(catalog),
        Arc::new(payments),
        config.orders.settlement_currency.clone(),
    );

    let app = app(AppState {
        orchestrator: Arc::new(orchestrator),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
