use std::sync::Arc;

use anyhow::{Context, Result};
use backend::{axum_http::http_serve, config::config_loader};
use crates::infra::db::postgres::postgres_connection;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = ?err, "backend: exited with error");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let config = config_loader::load().context("loading backend configuration")?;
    info!(
        port = config.backend_server.port,
        currency = %config.stripe.currency,
        push_enabled = config.push.fcm_server_key.is_some(),
        "backend: configuration loaded"
    );

    let db_pool = postgres_connection::establish_connection(
        &config.database.url,
        config.database.max_pool_size,
    )
    .context("connecting to postgres")?;
    info!(
        max_pool_size = config.database.max_pool_size,
        "backend: postgres pool ready"
    );

    http_serve::start(Arc::new(config), Arc::new(db_pool)).await
}
