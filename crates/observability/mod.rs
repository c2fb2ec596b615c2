mod alerts;
mod config;
mod discord;
mod layer;

use alerts::AlertDispatcher;
use anyhow::Result;
use config::ObservabilityConfig;
use discord::DiscordAlertSink;
use layer::ErrorAlertLayer;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Installs the global subscriber: RFC3339 local-time console output filtered
/// by `RUST_LOG` (default `info`), plus Discord alerts when configured.
///
/// Must run inside a tokio runtime because the alert dispatcher spawns a task.
pub fn init_observability(component: &str) -> Result<()> {
    let config = ObservabilityConfig::from_env(component);

    let alert_layer = match config.discord.as_ref() {
        Some(discord) => {
            let sink = DiscordAlertSink::new(discord.webhook_url.clone())?;
            let dispatcher = AlertDispatcher::spawn(vec![Arc::new(sink)]);
            Some(
                ErrorAlertLayer::new(dispatcher, config.service_context.clone(), discord.min_level)
                    .with_filter(LevelFilter::from_level(discord.min_level)),
            )
        }
        None => None,
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(alert_layer)
        .with(env_filter)
        .try_init()?;

    let ctx = &config.service_context;
    for warning in &config.warnings {
        warn!(
            service = %ctx.service_name,
            environment = %ctx.environment,
            warning = %warning,
            "observability: config warning"
        );
    }

    info!(
        service = %ctx.service_name,
        environment = %ctx.environment,
        component = %ctx.component,
        discord_alerts = config.discord.is_some(),
        "observability: initialized"
    );

    Ok(())
}
