use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use crates::domain::repositories::{
    bookings::BookingRepository, settlement::SettlementRepository,
    transactions::TransactionRepository, users::UserRepository,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::{
    axum_http::error_responses::error_response,
    usecases::payment_events::{PaymentEventUseCase, PaymentGateway},
};

const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router<G, B, U, T, S>(payment_events: Arc<PaymentEventUseCase<G, B, U, T, S>>) -> Router
where
    G: PaymentGateway + 'static,
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/webhook", post(webhook))
        .with_state(payment_events)
}

/// The body must stay raw: the signature covers its exact bytes.
pub async fn webhook<G, B, U, T, S>(
    State(payment_events): State<Arc<PaymentEventUseCase<G, B, U, T, S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    G: PaymentGateway + 'static,
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
{
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        warn!("payment_webhook: missing signature header");
        return error_response(StatusCode::BAD_REQUEST, "missing stripe-signature header");
    };

    match payment_events.handle(&body, signature).await {
        Ok(disposition) => {
            debug!(?disposition, "payment_webhook: event acknowledged");
            (StatusCode::OK, Json(json!({ "received": true }))).into_response()
        }
        Err(err) => err.into_response(),
    }
}
