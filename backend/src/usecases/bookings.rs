use std::sync::Arc;

use crates::{
    domain::{
        entities::bookings::{BookingEntity, InsertBookingEntity},
        repositories::{
            bookings::BookingRepository, services::ServiceRepository, users::UserRepository,
        },
        value_objects::{
            booking_window::BookingWindow,
            bookings::{
                BookingDto, BookingScope, CancelBookingModel, CreateBookingOutcome,
                RequestBookingModel, RespondBookingModel, StatusTransition,
            },
            enums::{
                booking_decisions::BookingDecision, booking_statuses::BookingStatus,
                notification_categories::NotificationCategory, user_roles::UserRole,
            },
            commission::BASIS_POINTS_PER_UNIT,
            pagination::{Page, Paginated},
        },
    },
    notifications::NotificationSender,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::availability::AvailabilityChecker;

const SLOT_TAKEN_MESSAGE: &str = "provider already has a booking during this time";
const FALLBACK_SUBJECT_NAME: &str = "Someone";

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("you are not allowed to perform this action")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("booking cannot move from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("booking must be paid to perform this action")]
    PaymentRequired,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BookingError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Unauthorized => StatusCode::FORBIDDEN,
            BookingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::Conflict(_) | BookingError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            BookingError::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BookingError>;

/// Highest price whose commission arithmetic stays within `i64`.
pub const MAX_PRICE_MINOR: i64 = i64::MAX / BASIS_POINTS_PER_UNIT;

/// Field-level checks on a booking request. Returns the validated window.
pub fn validate_request(
    model: &RequestBookingModel,
    min_price_minor: i64,
) -> UseCaseResult<BookingWindow> {
    let window = BookingWindow::new(model.start_date, model.end_date)
        .map_err(|_| BookingError::Validation("end date must be after start date".to_string()))?;

    if model.price_minor < min_price_minor {
        return Err(BookingError::Validation(format!(
            "price cannot be less than {min_price_minor}"
        )));
    }
    if model.price_minor > MAX_PRICE_MINOR {
        return Err(BookingError::Validation(format!(
            "price cannot be more than {MAX_PRICE_MINOR}"
        )));
    }

    let required = [
        (model.description.as_str(), "description is required"),
        (model.address.details.as_str(), "address details is required"),
        (model.address.city.as_str(), "address city is required"),
        (model.address.postal_code.as_str(), "address postal code is required"),
        (model.address.phone.as_str(), "address phone is required"),
    ];
    if let Some((_, message)) = required.iter().find(|(value, _)| value.trim().is_empty()) {
        return Err(BookingError::Validation(message.to_string()));
    }

    Ok(window)
}

/// The booking lifecycle: request, respond, cancel, complete, plus reads.
///
/// Every status write goes through `BookingRepository::transition_status`,
/// which only matches the row while it is still in the expected source
/// status.
pub struct BookingUseCase<B, S, U>
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
    service_repo: Arc<S>,
    user_repo: Arc<U>,
    availability: AvailabilityChecker<B>,
    notifier: Arc<dyn NotificationSender>,
    min_price_minor: i64,
}

impl<B, S, U> BookingUseCase<B, S, U>
where
    B: BookingRepository + Send + Sync + 'static,
    S: ServiceRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(
        booking_repo: Arc<B>,
        service_repo: Arc<S>,
        user_repo: Arc<U>,
        notifier: Arc<dyn NotificationSender>,
        min_price_minor: i64,
    ) -> Self {
        Self {
            availability: AvailabilityChecker::new(Arc::clone(&booking_repo)),
            booking_repo,
            service_repo,
            user_repo,
            notifier,
            min_price_minor,
        }
    }

    pub async fn request_booking(
        &self,
        customer_id: Uuid,
        model: RequestBookingModel,
    ) -> UseCaseResult<BookingDto> {
        info!(
            %customer_id,
            service_id = %model.service_id,
            "bookings: booking request received"
        );

        let window = validate_request(&model, self.min_price_minor).map_err(|err| {
            warn!(
                %customer_id,
                status = err.status_code().as_u16(),
                reason = %err,
                "bookings: invalid booking request"
            );
            err
        })?;

        let service = self
            .service_repo
            .find_by_id(model.service_id)
            .await
            .map_err(|err| {
                error!(
                    service_id = %model.service_id,
                    db_error = ?err,
                    "bookings: failed to load service"
                );
                BookingError::Internal(err)
            })?
            .filter(|service| service.is_active)
            .ok_or_else(|| {
                let err = BookingError::NotFound("service");
                warn!(
                    service_id = %model.service_id,
                    status = err.status_code().as_u16(),
                    "bookings: service not found"
                );
                err
            })?;
        let provider_id = service.provider_id;

        let available = self
            .availability
            .is_available(provider_id, window)
            .await
            .map_err(|err| {
                error!(%provider_id, db_error = ?err, "bookings: availability check failed");
                BookingError::Internal(err)
            })?;
        if !available {
            return Err(self.slot_taken(provider_id));
        }

        let insert = InsertBookingEntity {
            provider_id,
            customer_id,
            service_id: service.id,
            start_date: window.start(),
            end_date: window.end(),
            address_details: model.address.details,
            address_phone: model.address.phone,
            address_city: model.address.city,
            address_postal_code: model.address.postal_code,
            description: model.description,
            price_minor: model.price_minor,
            price_after_discount_minor: None,
            status: BookingStatus::Pending.to_string(),
            is_paid: false,
        };

        let created = match self.booking_repo.create_if_available(insert).await {
            Ok(CreateBookingOutcome::Created(created)) => created,
            Ok(CreateBookingOutcome::SlotTaken) => return Err(self.slot_taken(provider_id)),
            Err(err) => {
                error!(%provider_id, db_error = ?err, "bookings: failed to create booking");
                return Err(BookingError::Internal(err));
            }
        };

        info!(
            booking_id = %created.id,
            %provider_id,
            %customer_id,
            "bookings: booking request created"
        );
        self.notify(provider_id, NotificationCategory::BookingSent, customer_id)
            .await;

        Ok(created.into())
    }

    pub async fn respond_to_booking(
        &self,
        booking_id: Uuid,
        provider_id: Uuid,
        model: RespondBookingModel,
    ) -> UseCaseResult<BookingDto> {
        info!(
            %booking_id,
            %provider_id,
            response = %model.response,
            "bookings: booking response received"
        );

        let booking = self.load(booking_id).await?;
        if booking.provider_id != provider_id {
            return Err(self.unauthorized(booking_id, provider_id));
        }

        let reject_reason = model
            .reject_reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        if model.response == BookingDecision::Rejected && reject_reason.is_none() {
            let err = BookingError::Validation("reject reason is required".to_string());
            warn!(
                %booking_id,
                status = err.status_code().as_u16(),
                "bookings: rejection without reason"
            );
            return Err(err);
        }

        let target = model.response.target_status();
        let mut transition = self.checked_transition(&booking, target)?;
        if model.response == BookingDecision::Rejected {
            transition.reject_reason = reject_reason;
        }

        let updated = self.apply_transition(transition).await?;
        info!(%booking_id, status = %target, "bookings: booking responded");

        let category = match model.response {
            BookingDecision::Accepted => NotificationCategory::BookingAccepted,
            BookingDecision::Rejected => NotificationCategory::BookingRejected,
        };
        self.notify(updated.customer_id, category, provider_id).await;

        Ok(updated.into())
    }

    pub async fn cancel_booking(
        &self,
        booking_id: Uuid,
        caller_id: Uuid,
        model: CancelBookingModel,
    ) -> UseCaseResult<BookingDto> {
        info!(%booking_id, %caller_id, "bookings: cancel request received");

        let booking = self.load(booking_id).await?;
        if !booking.is_participant(caller_id) {
            return Err(self.unauthorized(booking_id, caller_id));
        }

        // A booking outside `accepted` is reported exactly like a missing one.
        let current = self.status_of(&booking)?;
        if !current.can_transition_to(BookingStatus::Canceled) {
            let err = BookingError::NotFound("booking");
            warn!(
                %booking_id,
                status = err.status_code().as_u16(),
                current = %current,
                "bookings: booking is not cancelable"
            );
            return Err(err);
        }

        let mut transition =
            StatusTransition::new(booking_id, BookingStatus::Accepted, BookingStatus::Canceled);
        transition.cancel_reason = model
            .cancel_reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());

        let updated = match self.booking_repo.transition_status(transition).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                let err = BookingError::NotFound("booking");
                warn!(
                    %booking_id,
                    status = err.status_code().as_u16(),
                    "bookings: booking left accepted before cancel applied"
                );
                return Err(err);
            }
            Err(err) => {
                error!(%booking_id, db_error = ?err, "bookings: failed to cancel booking");
                return Err(BookingError::Internal(err));
            }
        };
        info!(%booking_id, %caller_id, "bookings: booking canceled");

        let counterparty = if caller_id == updated.customer_id {
            updated.provider_id
        } else {
            updated.customer_id
        };
        self.notify(counterparty, NotificationCategory::BookingCanceled, caller_id)
            .await;

        Ok(updated.into())
    }

    /// Either participant may complete. The provider is notified.
    pub async fn complete_booking(
        &self,
        booking_id: Uuid,
        caller_id: Uuid,
    ) -> UseCaseResult<BookingDto> {
        info!(%booking_id, %caller_id, "bookings: complete request received");

        let booking = self.load(booking_id).await?;
        if !booking.is_participant(caller_id) {
            return Err(self.unauthorized(booking_id, caller_id));
        }

        let mut transition = self.checked_transition(&booking, BookingStatus::Completed)?;
        if !booking.is_paid {
            let err = BookingError::PaymentRequired;
            warn!(
                %booking_id,
                status = err.status_code().as_u16(),
                "bookings: completion attempted before payment"
            );
            return Err(err);
        }
        transition.require_paid = true;

        let updated = self.apply_transition(transition).await?;
        info!(%booking_id, "bookings: booking completed");

        // TODO: credit the provider balance with the settled amount once
        // completion payouts are defined; settlement currently owns balances.
        self.notify(
            updated.provider_id,
            NotificationCategory::BookingCompleted,
            updated.customer_id,
        )
        .await;

        Ok(updated.into())
    }

    /// Participants and admins may read a booking.
    pub async fn get_booking(
        &self,
        booking_id: Uuid,
        caller_id: Uuid,
        caller_role: UserRole,
    ) -> UseCaseResult<BookingDto> {
        let booking = self.load(booking_id).await?;
        if caller_role != UserRole::Admin && !booking.is_participant(caller_id) {
            return Err(self.unauthorized(booking_id, caller_id));
        }

        Ok(booking.into())
    }

    pub async fn list_bookings(
        &self,
        scope: BookingScope,
        page: Page,
    ) -> UseCaseResult<Paginated<BookingDto>> {
        debug!(?scope, page = page.page, limit = page.limit, "bookings: listing bookings");

        let rows = self.booking_repo.list(scope, page).await.map_err(|err| {
            error!(?scope, db_error = ?err, "bookings: failed to list bookings");
            BookingError::Internal(err)
        })?;

        Ok(Paginated {
            page: page.page,
            limit: page.limit,
            results: rows.into_iter().map(BookingDto::from).collect(),
        })
    }

    async fn load(&self, booking_id: Uuid) -> UseCaseResult<BookingEntity> {
        self.booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "bookings: failed to load booking");
                BookingError::Internal(err)
            })?
            .ok_or_else(|| {
                let err = BookingError::NotFound("booking");
                warn!(
                    %booking_id,
                    status = err.status_code().as_u16(),
                    "bookings: booking not found"
                );
                err
            })
    }

    fn status_of(&self, booking: &BookingEntity) -> UseCaseResult<BookingStatus> {
        booking.booking_status().map_err(|err| {
            error!(booking_id = %booking.id, error = ?err, "bookings: unreadable booking status");
            BookingError::Internal(err)
        })
    }

    /// Checks the transition table and builds the conditional write for it.
    fn checked_transition(
        &self,
        booking: &BookingEntity,
        to: BookingStatus,
    ) -> UseCaseResult<StatusTransition> {
        let from = self.status_of(booking)?;
        if !from.can_transition_to(to) {
            let err = BookingError::InvalidTransition { from, to };
            warn!(
                booking_id = %booking.id,
                status = err.status_code().as_u16(),
                %from,
                %to,
                "bookings: illegal status transition"
            );
            return Err(err);
        }

        Ok(StatusTransition::new(booking.id, from, to))
    }

    async fn apply_transition(&self, transition: StatusTransition) -> UseCaseResult<BookingEntity> {
        let booking_id = transition.booking_id;
        let (from, to) = (transition.from, transition.to);

        match self.booking_repo.transition_status(transition).await {
            Ok(Some(updated)) => Ok(updated),
            Ok(None) => {
                // Another request moved the booking first.
                let err = BookingError::InvalidTransition { from, to };
                warn!(
                    %booking_id,
                    status = err.status_code().as_u16(),
                    "bookings: booking changed concurrently"
                );
                Err(err)
            }
            Err(err) => {
                error!(%booking_id, %from, %to, db_error = ?err, "bookings: failed to update status");
                Err(BookingError::Internal(err))
            }
        }
    }

    fn slot_taken(&self, provider_id: Uuid) -> BookingError {
        let err = BookingError::Conflict(SLOT_TAKEN_MESSAGE.to_string());
        warn!(
            %provider_id,
            status = err.status_code().as_u16(),
            "bookings: provider window already booked"
        );
        err
    }

    fn unauthorized(&self, booking_id: Uuid, caller_id: Uuid) -> BookingError {
        let err = BookingError::Unauthorized;
        warn!(
            %booking_id,
            %caller_id,
            status = err.status_code().as_u16(),
            "bookings: caller is not a participant"
        );
        err
    }

    /// Best effort: lookup failures and missing device tokens only log.
    async fn notify(&self, recipient_id: Uuid, category: NotificationCategory, subject_id: Uuid) {
        let recipient = match self.user_repo.find_by_id(recipient_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(%recipient_id, %category, "bookings: notification recipient missing");
                return;
            }
            Err(err) => {
                warn!(%recipient_id, %category, db_error = ?err, "bookings: failed to load notification recipient");
                return;
            }
        };

        let Some(device_token) = recipient
            .device_token
            .as_deref()
            .filter(|token| !token.is_empty())
        else {
            debug!(%recipient_id, %category, "bookings: recipient has no device, skipping notification");
            return;
        };

        let subject_name = match self.user_repo.find_by_id(subject_id).await {
            Ok(Some(subject)) => subject.name,
            _ => FALLBACK_SUBJECT_NAME.to_string(),
        };

        self.notifier.notify(device_token, category, &subject_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::{
        InMemoryStore, RecordingNotifier, at, booking, service, user,
    };
    use crates::{
        domain::{
            repositories::{
                bookings::MockBookingRepository, services::MockServiceRepository,
                users::MockUserRepository,
            },
            value_objects::bookings::BookingAddress,
        },
        notifications::MockNotificationSender,
    };
    use mockall::predicate::eq;

    const MIN_PRICE: i64 = 5_000;

    struct Fixture {
        store: Arc<InMemoryStore>,
        notifier: Arc<RecordingNotifier>,
        usecase: BookingUseCase<InMemoryStore, InMemoryStore, InMemoryStore>,
        customer_id: Uuid,
        provider_id: Uuid,
        service_id: Uuid,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let notifier = Arc::new(RecordingNotifier::default());

        let customer = user(UserRole::Customer, "Mona");
        let provider = user(UserRole::Provider, "Karim");
        let offered = service(provider.id);
        let (customer_id, provider_id, service_id) = (customer.id, provider.id, offered.id);
        store.put_user(customer);
        store.put_user(provider);
        store.put_service(offered);

        let usecase = BookingUseCase::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&notifier) as Arc<dyn NotificationSender>,
            MIN_PRICE,
        );

        Fixture {
            store,
            notifier,
            usecase,
            customer_id,
            provider_id,
            service_id,
        }
    }

    fn request(service_id: Uuid, start: u32, end: u32) -> RequestBookingModel {
        RequestBookingModel {
            service_id,
            start_date: at(start),
            end_date: at(end),
            address: BookingAddress {
                details: "12 Nile St".to_string(),
                phone: "+201000000000".to_string(),
                city: "Cairo".to_string(),
                postal_code: "11511".to_string(),
            },
            price_minor: 10_000,
            description: "Fix the sink".to_string(),
        }
    }

    fn seeded(f: &Fixture, status: BookingStatus, is_paid: bool) -> Uuid {
        let mut row = booking(f.provider_id, f.customer_id, (10, 12), status, 10_000);
        row.is_paid = is_paid;
        let id = row.id;
        f.store.put_booking(row);
        id
    }

    fn respond(response: BookingDecision, reason: Option<&str>) -> RespondBookingModel {
        RespondBookingModel {
            response,
            reject_reason: reason.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn request_creates_pending_booking_and_notifies_provider() {
        let f = fixture();

        let created = f
            .usecase
            .request_booking(f.customer_id, request(f.service_id, 10, 12))
            .await
            .unwrap();

        assert_eq!(created.status, "pending");
        assert!(!created.is_paid);
        assert_eq!(created.provider_id, f.provider_id);
        assert_eq!(
            f.notifier.sent(),
            vec![(
                "karim-device".to_string(),
                NotificationCategory::BookingSent,
                "Mona".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn overlapping_request_is_a_conflict() {
        let f = fixture();
        f.usecase
            .request_booking(f.customer_id, request(f.service_id, 10, 12))
            .await
            .unwrap();

        let err = f
            .usecase
            .request_booking(f.customer_id, request(f.service_id, 11, 13))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::Conflict(_)));
    }

    #[tokio::test]
    async fn touching_request_succeeds() {
        let f = fixture();
        f.usecase
            .request_booking(f.customer_id, request(f.service_id, 10, 12))
            .await
            .unwrap();

        let created = f
            .usecase
            .request_booking(f.customer_id, request(f.service_id, 12, 14))
            .await;

        assert!(created.is_ok());
    }

    #[tokio::test]
    async fn canceled_booking_window_can_be_booked_again() {
        let f = fixture();
        seeded(&f, BookingStatus::Canceled, false);

        let created = f
            .usecase
            .request_booking(f.customer_id, request(f.service_id, 10, 12))
            .await;

        assert!(created.is_ok());
    }

    #[tokio::test]
    async fn unknown_service_is_not_found() {
        let f = fixture();

        let err = f
            .usecase
            .request_booking(f.customer_id, request(Uuid::new_v4(), 10, 12))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::NotFound("service")));
    }

    #[tokio::test]
    async fn lost_race_at_insert_is_a_conflict() {
        let provider_id = Uuid::new_v4();
        let offered = service(provider_id);
        let service_id = offered.id;

        let mut service_repo = MockServiceRepository::new();
        service_repo
            .expect_find_by_id()
            .with(eq(service_id))
            .returning(move |_| {
                let offered = offered.clone();
                Box::pin(async move { Ok(Some(offered)) })
            });

        let mut booking_repo = MockBookingRepository::new();
        booking_repo
            .expect_find_overlapping_active()
            .returning(|_, _| Box::pin(async { Ok(vec![]) }));
        booking_repo
            .expect_create_if_available()
            .times(1)
            .returning(|_| Box::pin(async { Ok(CreateBookingOutcome::SlotTaken) }));

        let mut notifier = MockNotificationSender::new();
        notifier.expect_notify().never();

        let usecase = BookingUseCase::new(
            Arc::new(booking_repo),
            Arc::new(service_repo),
            Arc::new(MockUserRepository::new()),
            Arc::new(notifier) as Arc<dyn NotificationSender>,
            MIN_PRICE,
        );

        let err = usecase
            .request_booking(Uuid::new_v4(), request(service_id, 10, 12))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));
    }

    #[test]
    fn request_validation_rules() {
        let service_id = Uuid::new_v4();

        let mut cheap = request(service_id, 10, 12);
        cheap.price_minor = MIN_PRICE - 1;
        assert!(matches!(validate_request(&cheap, MIN_PRICE), Err(BookingError::Validation(_))));

        let reversed = request(service_id, 12, 10);
        assert!(matches!(validate_request(&reversed, MIN_PRICE), Err(BookingError::Validation(_))));

        let mut no_city = request(service_id, 10, 12);
        no_city.address.city = "  ".to_string();
        let err = validate_request(&no_city, MIN_PRICE).unwrap_err();
        assert_eq!(err.to_string(), "address city is required");

        let mut exact_minimum = request(service_id, 10, 12);
        exact_minimum.price_minor = MIN_PRICE;
        assert!(validate_request(&exact_minimum, MIN_PRICE).is_ok());
    }

    #[test]
    fn price_is_capped_where_commission_math_stays_in_range() {
        let service_id = Uuid::new_v4();

        let mut ceiling = request(service_id, 10, 12);
        ceiling.price_minor = MAX_PRICE_MINOR;
        assert!(validate_request(&ceiling, MIN_PRICE).is_ok());

        let mut huge = request(service_id, 10, 12);
        huge.price_minor = i64::MAX / 100;
        let err = validate_request(&huge, MIN_PRICE).unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn rejection_requires_a_reason() {
        let f = fixture();
        let id = seeded(&f, BookingStatus::Pending, false);

        let err = f
            .usecase
            .respond_to_booking(id, f.provider_id, respond(BookingDecision::Rejected, None))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        let blank = f
            .usecase
            .respond_to_booking(id, f.provider_id, respond(BookingDecision::Rejected, Some(" ")))
            .await;
        assert!(matches!(blank, Err(BookingError::Validation(_))));
        assert_eq!(f.store.booking(id).unwrap().status, "pending");
    }

    #[tokio::test]
    async fn rejection_with_reason_records_it_and_notifies_customer() {
        let f = fixture();
        let id = seeded(&f, BookingStatus::Pending, false);

        let updated = f
            .usecase
            .respond_to_booking(
                id,
                f.provider_id,
                respond(BookingDecision::Rejected, Some("fully booked")),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, "rejected");
        assert_eq!(updated.reject_reason.as_deref(), Some("fully booked"));
        assert_eq!(
            f.notifier.sent(),
            vec![(
                "mona-device".to_string(),
                NotificationCategory::BookingRejected,
                "Karim".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn only_the_provider_may_respond() {
        let f = fixture();
        let id = seeded(&f, BookingStatus::Pending, false);

        let err = f
            .usecase
            .respond_to_booking(id, f.customer_id, respond(BookingDecision::Accepted, None))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::Unauthorized));
    }

    #[tokio::test]
    async fn responding_twice_is_an_invalid_transition() {
        let f = fixture();
        let id = seeded(&f, BookingStatus::Pending, false);

        f.usecase
            .respond_to_booking(id, f.provider_id, respond(BookingDecision::Accepted, None))
            .await
            .unwrap();
        let err = f
            .usecase
            .respond_to_booking(id, f.provider_id, respond(BookingDecision::Rejected, Some("no")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BookingError::InvalidTransition {
                from: BookingStatus::Accepted,
                to: BookingStatus::Rejected
            }
        ));
    }

    #[tokio::test]
    async fn responding_to_missing_booking_is_not_found() {
        let f = fixture();

        let err = f
            .usecase
            .respond_to_booking(Uuid::new_v4(), f.provider_id, respond(BookingDecision::Accepted, None))
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::NotFound("booking")));
    }

    #[tokio::test]
    async fn completing_pending_booking_is_a_transition_error_even_if_paid() {
        let f = fixture();
        let unpaid = seeded(&f, BookingStatus::Pending, false);
        let paid = seeded(&f, BookingStatus::Pending, true);

        for id in [unpaid, paid] {
            let err = f.usecase.complete_booking(id, f.provider_id).await.unwrap_err();
            assert!(matches!(err, BookingError::InvalidTransition { .. }));
        }
    }

    #[tokio::test]
    async fn completing_unpaid_accepted_booking_requires_payment() {
        let f = fixture();
        let id = seeded(&f, BookingStatus::Accepted, false);

        let err = f.usecase.complete_booking(id, f.customer_id).await.unwrap_err();

        assert!(matches!(err, BookingError::PaymentRequired));
        assert_eq!(f.store.booking(id).unwrap().status, "accepted");
    }

    #[tokio::test]
    async fn completing_paid_accepted_booking_succeeds() {
        let f = fixture();
        let id = seeded(&f, BookingStatus::Accepted, true);

        let updated = f.usecase.complete_booking(id, f.customer_id).await.unwrap();

        assert_eq!(updated.status, "completed");
        assert_eq!(
            f.notifier.sent(),
            vec![(
                "karim-device".to_string(),
                NotificationCategory::BookingCompleted,
                "Mona".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn outsiders_cannot_complete() {
        let f = fixture();
        let id = seeded(&f, BookingStatus::Accepted, true);

        let err = f.usecase.complete_booking(id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, BookingError::Unauthorized));
    }

    #[tokio::test]
    async fn cancel_notifies_the_other_party() {
        let f = fixture();
        let id = seeded(&f, BookingStatus::Accepted, false);

        let updated = f
            .usecase
            .cancel_booking(
                id,
                f.customer_id,
                CancelBookingModel {
                    cancel_reason: Some("changed plans".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, "canceled");
        assert_eq!(updated.cancel_reason.as_deref(), Some("changed plans"));
        assert_eq!(
            f.notifier.sent(),
            vec![(
                "karim-device".to_string(),
                NotificationCategory::BookingCanceled,
                "Mona".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn cancel_outside_accepted_is_not_found() {
        let f = fixture();
        let id = seeded(&f, BookingStatus::Pending, false);

        let err = f
            .usecase
            .cancel_booking(id, f.provider_id, CancelBookingModel::default())
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::NotFound("booking")));
    }

    #[tokio::test]
    async fn canceled_slot_is_released_for_new_requests() {
        let f = fixture();
        let id = seeded(&f, BookingStatus::Accepted, false);
        f.usecase
            .cancel_booking(id, f.provider_id, CancelBookingModel::default())
            .await
            .unwrap();

        let rebooked = f
            .usecase
            .request_booking(f.customer_id, request(f.service_id, 10, 12))
            .await;
        assert!(rebooked.is_ok());
    }

    #[tokio::test]
    async fn notification_is_skipped_without_device_token() {
        let f = fixture();
        let mut provider = user(UserRole::Provider, "Silent");
        provider.device_token = None;
        let offered = service(provider.id);
        let service_id = offered.id;
        f.store.put_user(provider);
        f.store.put_service(offered);

        f.usecase
            .request_booking(f.customer_id, request(service_id, 10, 12))
            .await
            .unwrap();

        assert!(f.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn admins_and_participants_can_read_bookings() {
        let f = fixture();
        let id = seeded(&f, BookingStatus::Pending, false);

        assert!(f.usecase.get_booking(id, f.customer_id, UserRole::Customer).await.is_ok());
        assert!(f.usecase.get_booking(id, Uuid::new_v4(), UserRole::Admin).await.is_ok());
        assert!(matches!(
            f.usecase.get_booking(id, Uuid::new_v4(), UserRole::Provider).await,
            Err(BookingError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_caller() {
        let f = fixture();
        seeded(&f, BookingStatus::Pending, false);
        f.store.put_booking(booking(
            Uuid::new_v4(),
            Uuid::new_v4(),
            (8, 9),
            BookingStatus::Pending,
            10_000,
        ));
        let page = Page { page: 1, limit: 20 };

        let mine = f
            .usecase
            .list_bookings(BookingScope::Customer(f.customer_id), page)
            .await
            .unwrap();
        let all = f.usecase.list_bookings(BookingScope::All, page).await.unwrap();

        assert_eq!(mine.results.len(), 1);
        assert_eq!(all.results.len(), 2);
    }

    #[test]
    fn error_status_codes() {
        use axum::http::StatusCode;

        assert_eq!(BookingError::NotFound("booking").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(BookingError::Unauthorized.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            BookingError::Validation(String::new()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(BookingError::Conflict(String::new()).status_code(), StatusCode::CONFLICT);
        assert_eq!(BookingError::PaymentRequired.status_code(), StatusCode::PAYMENT_REQUIRED);
    }
}
