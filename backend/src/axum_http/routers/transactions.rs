use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{
            bookings::BookingRepository, settlement::SettlementRepository,
            transactions::TransactionRepository, users::UserRepository,
        },
        value_objects::{
            enums::user_roles::UserRole,
            pagination::PageQuery,
            transactions::{FinePaymentModel, PayCommissionModel},
        },
    },
    infra::db::repositories::{
        bookings::BookingPostgres, settlement::SettlementPostgres,
        transactions::TransactionPostgres, users::UserPostgres,
    },
    payments::stripe_client::StripeClient,
};
use serde_json::json;
use uuid::Uuid;

use super::page_from;
use crate::{
    auth::AuthUser,
    usecases::{
        payment_sheets::{CheckoutGateway, PaymentSheetUseCase},
        settlement::SettlementUseCase,
    },
};

pub type PostgresSettlement =
    SettlementUseCase<BookingPostgres, UserPostgres, TransactionPostgres, SettlementPostgres>;

pub struct TransactionsState<B, U, T, S, G>
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
    G: CheckoutGateway + 'static,
{
    pub settlement: Arc<SettlementUseCase<B, U, T, S>>,
    pub payment_sheets: Arc<PaymentSheetUseCase<B, U, G>>,
}

pub fn routes(
    settlement: Arc<PostgresSettlement>,
    payment_sheets: Arc<PaymentSheetUseCase<BookingPostgres, UserPostgres, StripeClient>>,
) -> Router {
    router(Arc::new(TransactionsState {
        settlement,
        payment_sheets,
    }))
}

pub fn router<B, U, T, S, G>(state: Arc<TransactionsState<B, U, T, S, G>>) -> Router
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
    G: CheckoutGateway + 'static,
{
    Router::new()
        .route("/", get(list_own))
        .route("/all", get(list_all))
        .route("/totals", get(totals))
        .route("/booking/cash/:booking_id", post(settle_cash))
        .route("/payment-sheet/:booking_id", post(booking_payment_sheet))
        .route("/payment-fine", post(fine_payment_sheet))
        .route("/pay-commission", post(pay_commission))
        .with_state(state)
}

pub async fn settle_cash<B, U, T, S, G>(
    State(state): State<Arc<TransactionsState<B, U, T, S, G>>>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
    G: CheckoutGateway + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Provider]) {
        return err.into_response();
    }

    match state
        .settlement
        .settle_cash_payment(booking_id, auth.user_id)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "booking paid successfully" })),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn booking_payment_sheet<B, U, T, S, G>(
    State(state): State<Arc<TransactionsState<B, U, T, S, G>>>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
    G: CheckoutGateway + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Customer]) {
        return err.into_response();
    }

    match state
        .payment_sheets
        .booking_sheet(booking_id, auth.user_id)
        .await
    {
        Ok(sheet) => (StatusCode::OK, Json(sheet)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn fine_payment_sheet<B, U, T, S, G>(
    State(state): State<Arc<TransactionsState<B, U, T, S, G>>>,
    auth: AuthUser,
    Json(model): Json<FinePaymentModel>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
    G: CheckoutGateway + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Provider]) {
        return err.into_response();
    }

    match state.payment_sheets.fine_sheet(auth.user_id, model).await {
        Ok(sheet) => (StatusCode::OK, Json(sheet)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn pay_commission<B, U, T, S, G>(
    State(state): State<Arc<TransactionsState<B, U, T, S, G>>>,
    auth: AuthUser,
    Json(model): Json<PayCommissionModel>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
    G: CheckoutGateway + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Admin]) {
        return err.into_response();
    }

    match state.settlement.settle_commission_cash(model).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "commission paid successfully" })),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn totals<B, U, T, S, G>(
    State(state): State<Arc<TransactionsState<B, U, T, S, G>>>,
    auth: AuthUser,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
    G: CheckoutGateway + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Admin]) {
        return err.into_response();
    }

    match state.settlement.aggregate_totals().await {
        Ok(totals) => (StatusCode::OK, Json(totals)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn list_all<B, U, T, S, G>(
    State(state): State<Arc<TransactionsState<B, U, T, S, G>>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
    G: CheckoutGateway + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Admin]) {
        return err.into_response();
    }

    list(&state.settlement, None, query).await
}

pub async fn list_own<B, U, T, S, G>(
    State(state): State<Arc<TransactionsState<B, U, T, S, G>>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
    G: CheckoutGateway + 'static,
{
    list(&state.settlement, Some(auth.user_id), query).await
}

async fn list<B, U, T, S>(
    settlement: &SettlementUseCase<B, U, T, S>,
    user_id: Option<Uuid>,
    query: PageQuery,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
{
    let page = match page_from(query) {
        Ok(page) => page,
        Err(response) => return response,
    };

    match settlement.list_transactions(user_id, page).await {
        Ok(transactions) => (StatusCode::OK, Json(transactions)).into_response(),
        Err(err) => err.into_response(),
    }
}
