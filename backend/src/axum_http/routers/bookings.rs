use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use crates::{
    domain::{
        repositories::{
            bookings::BookingRepository, services::ServiceRepository, users::UserRepository,
        },
        value_objects::{
            bookings::{BookingScope, CancelBookingModel, RequestBookingModel, RespondBookingModel},
            enums::user_roles::UserRole,
            pagination::PageQuery,
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            bookings::BookingPostgres, services::ServicePostgres, users::UserPostgres,
        },
    },
    notifications::NotificationSender,
};
use uuid::Uuid;

use super::page_from;
use crate::{auth::AuthUser, usecases::bookings::BookingUseCase};

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    notifier: Arc<dyn NotificationSender>,
    min_price_minor: i64,
) -> Router {
    let booking_usecase = BookingUseCase::new(
        Arc::new(BookingPostgres::new(Arc::clone(&db_pool))),
        Arc::new(ServicePostgres::new(Arc::clone(&db_pool))),
        Arc::new(UserPostgres::new(Arc::clone(&db_pool))),
        notifier,
        min_price_minor,
    );

    router(Arc::new(booking_usecase))
}

pub fn router<B, S, U>(booking_usecase: Arc<BookingUseCase<B, S, U>>) -> Router
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list_all))
        .route("/booking-request", post(request_booking))
        .route("/booking-response/:id", post(respond_to_booking))
        .route("/cancel-booking/:id", put(cancel_booking))
        .route("/complete-booking/:id", put(complete_booking))
        .route("/my-bookings", get(list_as_customer))
        .route("/provider-bookings", get(list_as_provider))
        .route("/:id", get(get_booking))
        .with_state(booking_usecase)
}

pub async fn request_booking<B, S, U>(
    State(booking_usecase): State<Arc<BookingUseCase<B, S, U>>>,
    auth: AuthUser,
    Json(model): Json<RequestBookingModel>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Customer]) {
        return err.into_response();
    }

    match booking_usecase.request_booking(auth.user_id, model).await {
        Ok(booking) => (StatusCode::CREATED, Json(booking)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn respond_to_booking<B, S, U>(
    State(booking_usecase): State<Arc<BookingUseCase<B, S, U>>>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
    Json(model): Json<RespondBookingModel>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Provider]) {
        return err.into_response();
    }

    match booking_usecase
        .respond_to_booking(booking_id, auth.user_id, model)
        .await
    {
        Ok(booking) => (StatusCode::OK, Json(booking)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn cancel_booking<B, S, U>(
    State(booking_usecase): State<Arc<BookingUseCase<B, S, U>>>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
    model: Option<Json<CancelBookingModel>>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Customer, UserRole::Provider]) {
        return err.into_response();
    }

    let model = model.map(|Json(model)| model).unwrap_or_default();
    match booking_usecase
        .cancel_booking(booking_id, auth.user_id, model)
        .await
    {
        Ok(booking) => (StatusCode::OK, Json(booking)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn complete_booking<B, S, U>(
    State(booking_usecase): State<Arc<BookingUseCase<B, S, U>>>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Customer, UserRole::Provider]) {
        return err.into_response();
    }

    match booking_usecase.complete_booking(booking_id, auth.user_id).await {
        Ok(booking) => (StatusCode::OK, Json(booking)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn get_booking<B, S, U>(
    State(booking_usecase): State<Arc<BookingUseCase<B, S, U>>>,
    auth: AuthUser,
    Path(booking_id): Path<Uuid>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    match booking_usecase
        .get_booking(booking_id, auth.user_id, auth.role)
        .await
    {
        Ok(booking) => (StatusCode::OK, Json(booking)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn list_all<B, S, U>(
    State(booking_usecase): State<Arc<BookingUseCase<B, S, U>>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Admin]) {
        return err.into_response();
    }

    list(&booking_usecase, BookingScope::All, query).await
}

pub async fn list_as_customer<B, S, U>(
    State(booking_usecase): State<Arc<BookingUseCase<B, S, U>>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Customer]) {
        return err.into_response();
    }

    list(&booking_usecase, BookingScope::Customer(auth.user_id), query).await
}

pub async fn list_as_provider<B, S, U>(
    State(booking_usecase): State<Arc<BookingUseCase<B, S, U>>>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    if let Err(err) = auth.require_role(&[UserRole::Provider]) {
        return err.into_response();
    }

    list(&booking_usecase, BookingScope::Provider(auth.user_id), query).await
}

async fn list<B, S, U>(
    booking_usecase: &BookingUseCase<B, S, U>,
    scope: BookingScope,
    query: PageQuery,
) -> Response
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let page = match page_from(query) {
        Ok(page) => page,
        Err(response) => return response,
    };

    match booking_usecase.list_bookings(scope, page).await {
        Ok(bookings) => (StatusCode::OK, Json(bookings)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::AccessClaims,
        usecases::test_support::{InMemoryStore, RecordingNotifier, service, user},
    };
    use axum::{body::Body, http::Request};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use tower::ServiceExt;

    const SECRET: &str = "supersecretjwtsecretforunittesting123";

    fn token_for(user_id: Uuid, role: UserRole) -> String {
        unsafe {
            std::env::set_var("JWT_SECRET", SECRET);
        }
        let claims = AccessClaims {
            sub: user_id.to_string(),
            role: role.to_string(),
            email: None,
            exp: 9_999_999_999,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn app(store: &Arc<InMemoryStore>) -> Router {
        router(Arc::new(BookingUseCase::new(
            Arc::clone(store),
            Arc::clone(store),
            Arc::clone(store),
            Arc::new(RecordingNotifier::default()),
            5_000,
        )))
    }

    fn booking_request(service_id: Uuid, token: Option<&str>) -> Request<Body> {
        let body = serde_json::json!({
            "serviceId": service_id,
            "startDate": "2026-03-02T10:00:00Z",
            "endDate": "2026-03-02T12:00:00Z",
            "address": {
                "details": "12 Nile St",
                "phone": "+201000000000",
                "city": "Cairo",
                "postalCode": "11511"
            },
            "priceMinor": 10000,
            "description": "Fix the sink"
        });

        let mut builder = Request::post("/booking-request").header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let store = InMemoryStore::new();

        let response = app(&store)
            .oneshot(booking_request(Uuid::new_v4(), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn page_beyond_offset_range_is_unprocessable() {
        let store = InMemoryStore::new();
        let token = token_for(Uuid::new_v4(), UserRole::Customer);

        let response = app(&store)
            .oneshot(
                Request::get("/my-bookings?page=9223372036854775807&limit=100")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn providers_cannot_request_bookings() {
        let store = InMemoryStore::new();
        let token = token_for(Uuid::new_v4(), UserRole::Provider);

        let response = app(&store)
            .oneshot(booking_request(Uuid::new_v4(), Some(&token)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn overlapping_request_returns_conflict() {
        let store = InMemoryStore::new();
        let customer = user(UserRole::Customer, "Mona");
        let provider = user(UserRole::Provider, "Karim");
        let offered = service(provider.id);
        let (customer_id, service_id) = (customer.id, offered.id);
        store.put_user(customer);
        store.put_user(provider);
        store.put_service(offered);
        let token = token_for(customer_id, UserRole::Customer);
        let app = app(&store);

        let first = app
            .clone()
            .oneshot(booking_request(service_id, Some(&token)))
            .await
            .unwrap();
        let second = app
            .oneshot(booking_request(service_id, Some(&token)))
            .await
            .unwrap();

        assert_eq!(first.status(), StatusCode::CREATED);
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }
}
