use std::str::FromStr;

use anyhow::{Context, Result, anyhow};

use super::config_model::{
    AuthSecret, BackendServer, BookingPolicy, Database, DotEnvyConfig, Push, Stripe,
};

const DEFAULT_MAX_POOL_SIZE: u32 = 10;
const DEFAULT_CURRENCY: &str = "egp";
/// 50.00 in the platform currency.
const DEFAULT_MIN_PRICE_MINOR: i64 = 5_000;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    load_from(|key| std::env::var(key).ok())
}

pub fn get_auth_secret() -> Result<AuthSecret> {
    dotenvy::dotenv().ok();

    Ok(AuthSecret {
        jwt_secret: required(&|key| std::env::var(key).ok(), "JWT_SECRET")?,
    })
}

pub(crate) fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let backend_server = BackendServer {
        port: parsed(&lookup, "SERVER_PORT_BACKEND")?,
        body_limit: parsed(&lookup, "SERVER_BODY_LIMIT")?,
        timeout: parsed(&lookup, "SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required(&lookup, "DATABASE_URL")?,
        max_pool_size: parsed_or(&lookup, "DATABASE_MAX_POOL_SIZE", DEFAULT_MAX_POOL_SIZE)?,
    };

    let stripe = Stripe {
        secret_key: required(&lookup, "STRIPE_SECRET_KEY")?,
        webhook_secret: required(&lookup, "STRIPE_WEBHOOK_SECRET")?,
        publishable_key: required(&lookup, "STRIPE_PUBLISHABLE_KEY")?,
        currency: optional(&lookup, "STRIPE_CURRENCY")
            .map(|c| c.to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
    };

    let push = Push {
        fcm_server_key: optional(&lookup, "FCM_SERVER_KEY"),
    };

    let booking = BookingPolicy {
        min_price_minor: parsed_or(&lookup, "BOOKING_MIN_PRICE_MINOR", DEFAULT_MIN_PRICE_MINOR)?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        stripe,
        push,
        booking,
    })
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| anyhow!("{key} is not set"))
}

fn parsed<F, T>(lookup: &F, key: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(lookup, key)?
        .parse()
        .with_context(|| format!("{key} is invalid"))
}

fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(lookup, key) {
        Some(raw) => raw.parse().with_context(|| format!("{key} is invalid")),
        None => Ok(default),
    }
}
