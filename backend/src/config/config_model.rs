#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub stripe: Stripe,
    pub push: Push,
    pub booking: BookingPolicy,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB
    pub body_limit: u64,
    /// Seconds
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_pool_size: u32,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    pub secret_key: String,
    pub webhook_secret: String,
    pub publishable_key: String,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct Push {
    pub fcm_server_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BookingPolicy {
    pub min_price_minor: i64,
}

#[derive(Debug, Clone)]
pub struct AuthSecret {
    pub jwt_secret: String,
}
