use crate::{
    axum_http::{default_routers, routers},
    config::config_model::DotEnvyConfig,
    usecases::{
        payment_events::PaymentEventUseCase, payment_sheets::PaymentSheetUseCase,
        settlement::SettlementUseCase,
    },
};
use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, settlement::SettlementPostgres,
            transactions::TransactionPostgres, users::UserPostgres,
        },
    },
    notifications::{DisabledNotifier, FcmNotifier, NotificationSender},
    payments::stripe_client::StripeClient,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let notifier: Arc<dyn NotificationSender> = match &config.push.fcm_server_key {
        Some(server_key) => Arc::new(FcmNotifier::spawn(server_key.clone())?),
        None => {
            warn!("FCM_SERVER_KEY not set, push notifications are disabled");
            Arc::new(DisabledNotifier)
        }
    };
    let stripe = Arc::new(StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
    ));

    let booking_repo = Arc::new(BookingPostgres::new(Arc::clone(&db_pool)));
    let user_repo = Arc::new(UserPostgres::new(Arc::clone(&db_pool)));
    let settlement = Arc::new(SettlementUseCase::new(
        Arc::clone(&booking_repo),
        Arc::clone(&user_repo),
        Arc::new(TransactionPostgres::new(Arc::clone(&db_pool))),
        Arc::new(SettlementPostgres::new(Arc::clone(&db_pool))),
    ));
    let payment_sheets = Arc::new(PaymentSheetUseCase::new(
        booking_repo,
        user_repo,
        Arc::clone(&stripe),
        config.stripe.publishable_key.clone(),
        config.stripe.currency.clone(),
    ));
    let payment_events = Arc::new(PaymentEventUseCase::new(stripe, Arc::clone(&settlement)));

    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/bookings",
            routers::bookings::routes(
                Arc::clone(&db_pool),
                notifier,
                config.booking.min_price_minor,
            ),
        )
        .nest(
            "/api/v1/transactions",
            routers::transactions::routes(settlement, payment_sheets),
        )
        .nest(
            "/api/v1/payments",
            routers::payment_webhook::router(payment_events),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.backend_server.timeout,
        )))
        .layer(RequestBodyLimitLayer::new(
            (config.backend_server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any), // TODO Add the domain later
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
