use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    entities::{bookings::BookingEntity, users::UserEntity},
    repositories::{
        bookings::BookingRepository, settlement::SettlementRepository,
        transactions::TransactionRepository, users::UserRepository,
    },
    value_objects::{
        enums::booking_statuses::BookingStatus,
        pagination::{Page, Paginated},
        payment_events::PaymentEventTarget,
        settlement::{SettlementOutcome, SettlementPlan},
        transactions::{PayCommissionModel, SettlementTotals, TransactionDto},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("you are not allowed to perform this action")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotPayable(String),
    #[error("inconsistent payment data: {0}")]
    InternalData(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SettlementError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SettlementError::NotFound(_) => StatusCode::NOT_FOUND,
            SettlementError::Unauthorized => StatusCode::FORBIDDEN,
            SettlementError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SettlementError::NotPayable(_) => StatusCode::CONFLICT,
            SettlementError::InternalData(_) | SettlementError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SettlementError>;

/// Turns confirmed payments into ledger rows and balance changes. Each
/// settlement is handed to `SettlementRepository::apply` as one plan.
pub struct SettlementUseCase<B, U, T, S>
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
    user_repo: Arc<U>,
    transaction_repo: Arc<T>,
    settlement_repo: Arc<S>,
}

impl<B, U, T, S> SettlementUseCase<B, U, T, S>
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
{
    pub fn new(
        booking_repo: Arc<B>,
        user_repo: Arc<U>,
        transaction_repo: Arc<T>,
        settlement_repo: Arc<S>,
    ) -> Self {
        Self {
            booking_repo,
            user_repo,
            transaction_repo,
            settlement_repo,
        }
    }

    /// The provider confirms they collected cash for an accepted booking.
    pub async fn settle_cash_payment(
        &self,
        booking_id: Uuid,
        provider_id: Uuid,
    ) -> UseCaseResult<()> {
        info!(%booking_id, %provider_id, "settlement: cash payment received");

        let booking = self
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| self.caller_error(SettlementError::NotFound("booking"), booking_id))?;
        if booking.provider_id != provider_id {
            return Err(self.caller_error(SettlementError::Unauthorized, booking_id));
        }
        if !is_payable(&booking) {
            return Err(self.caller_error(
                SettlementError::NotPayable("booking must be accepted and unpaid".to_string()),
                booking_id,
            ));
        }

        let provider = self
            .find_user(provider_id)
            .await?
            .ok_or_else(|| self.caller_error(SettlementError::NotFound("provider"), booking_id))?;
        let rate = provider.commission_rate()?;

        let plan = SettlementPlan::cash_booking(&booking, rate, Utc::now())
            .map_err(|err| SettlementError::Validation(err.to_string()))?;

        match self.apply(plan).await? {
            SettlementOutcome::Applied => {
                info!(
                    %booking_id,
                    %provider_id,
                    price_minor = booking.payable_minor(),
                    commission_bps = rate.basis_points(),
                    "settlement: cash payment settled"
                );
                Ok(())
            }
            SettlementOutcome::BookingNotPayable => Err(self.caller_error(
                SettlementError::NotPayable("booking was settled concurrently".to_string()),
                booking_id,
            )),
            SettlementOutcome::AccountMissing(_) => {
                Err(self.caller_error(SettlementError::NotFound("provider"), booking_id))
            }
            SettlementOutcome::DuplicateEvent => Err(SettlementError::Internal(anyhow::anyhow!(
                "cash settlement reported a duplicate event for booking {booking_id}"
            ))),
        }
    }

    /// Card path, reached only from a verified gateway event. Duplicate
    /// deliveries resolve to `Ok(SettlementOutcome::DuplicateEvent)`.
    pub async fn settle_card_payment(
        &self,
        target: PaymentEventTarget,
        amount_received_minor: i64,
        idempotency_key: &str,
    ) -> UseCaseResult<SettlementOutcome> {
        info!(
            ?target,
            amount_received_minor,
            idempotency_key,
            "settlement: card payment received"
        );

        let plan = match target {
            PaymentEventTarget::Booking(booking_id) => {
                let booking = self.find_booking(booking_id).await?.ok_or_else(|| {
                    SettlementError::InternalData(format!(
                        "booking {booking_id} referenced by payment does not exist"
                    ))
                })?;
                let provider = self.find_user(booking.provider_id).await?.ok_or_else(|| {
                    SettlementError::InternalData(format!(
                        "provider {} of booking {booking_id} does not exist",
                        booking.provider_id
                    ))
                })?;

                if amount_received_minor != booking.payable_minor() {
                    warn!(
                        %booking_id,
                        amount_received_minor,
                        payable_minor = booking.payable_minor(),
                        "settlement: received amount differs from booking price"
                    );
                }

                SettlementPlan::card_booking(
                    &booking,
                    provider.commission_rate()?,
                    amount_received_minor,
                    idempotency_key,
                    Utc::now(),
                )
            }
            PaymentEventTarget::Fine(user_id) => {
                SettlementPlan::card_fine(user_id, amount_received_minor, idempotency_key, Utc::now())
            }
        }
        .map_err(|err| SettlementError::InternalData(err.to_string()))?;

        match self.apply(plan).await? {
            SettlementOutcome::Applied => {
                info!(?target, idempotency_key, "settlement: card payment settled");
                Ok(SettlementOutcome::Applied)
            }
            SettlementOutcome::DuplicateEvent => {
                info!(
                    ?target,
                    idempotency_key,
                    "settlement: payment already settled, skipping"
                );
                Ok(SettlementOutcome::DuplicateEvent)
            }
            SettlementOutcome::BookingNotPayable => Err(SettlementError::NotPayable(format!(
                "card payment {idempotency_key} targets a booking that is not accepted or already paid"
            ))),
            SettlementOutcome::AccountMissing(user_id) => Err(SettlementError::InternalData(
                format!("user {user_id} referenced by payment does not exist"),
            )),
        }
    }

    /// Admin records commission a user handed over in cash.
    pub async fn settle_commission_cash(&self, model: PayCommissionModel) -> UseCaseResult<()> {
        let (user_id, amount_minor) = validate_commission(&model).map_err(|err| {
            warn!(
                status = err.status_code().as_u16(),
                reason = %err,
                "settlement: invalid commission settlement"
            );
            err
        })?;
        info!(%user_id, amount_minor, "settlement: cash commission received");

        let plan = SettlementPlan::cash_commission(user_id, amount_minor, Utc::now())
            .map_err(|err| SettlementError::Validation(err.to_string()))?;

        match self.apply(plan).await? {
            SettlementOutcome::Applied => {
                info!(%user_id, amount_minor, "settlement: cash commission settled");
                Ok(())
            }
            SettlementOutcome::AccountMissing(_) => {
                let err = SettlementError::NotFound("user");
                warn!(%user_id, status = err.status_code().as_u16(), "settlement: commission payer not found");
                Err(err)
            }
            other => Err(SettlementError::Internal(anyhow::anyhow!(
                "unexpected commission settlement outcome {other:?} for user {user_id}"
            ))),
        }
    }

    pub async fn aggregate_totals(&self) -> UseCaseResult<SettlementTotals> {
        self.transaction_repo.aggregate_totals().await.map_err(|err| {
            error!(db_error = ?err, "settlement: failed to aggregate totals");
            SettlementError::Internal(err)
        })
    }

    /// `user_id = None` lists the whole ledger.
    pub async fn list_transactions(
        &self,
        user_id: Option<Uuid>,
        page: Page,
    ) -> UseCaseResult<Paginated<TransactionDto>> {
        let rows = self
            .transaction_repo
            .list(user_id, page)
            .await
            .map_err(|err| {
                error!(?user_id, db_error = ?err, "settlement: failed to list transactions");
                SettlementError::Internal(err)
            })?;

        Ok(Paginated {
            page: page.page,
            limit: page.limit,
            results: rows.into_iter().map(TransactionDto::from).collect(),
        })
    }

    async fn apply(&self, plan: SettlementPlan) -> UseCaseResult<SettlementOutcome> {
        self.settlement_repo.apply(plan).await.map_err(|err| {
            error!(db_error = ?err, "settlement: failed to apply settlement");
            SettlementError::Internal(err)
        })
    }

    async fn find_booking(&self, booking_id: Uuid) -> UseCaseResult<Option<BookingEntity>> {
        self.booking_repo.find_by_id(booking_id).await.map_err(|err| {
            error!(%booking_id, db_error = ?err, "settlement: failed to load booking");
            SettlementError::Internal(err)
        })
    }

    async fn find_user(&self, user_id: Uuid) -> UseCaseResult<Option<UserEntity>> {
        self.user_repo.find_by_id(user_id).await.map_err(|err| {
            error!(%user_id, db_error = ?err, "settlement: failed to load user");
            SettlementError::Internal(err)
        })
    }

    fn caller_error(&self, err: SettlementError, booking_id: Uuid) -> SettlementError {
        warn!(
            %booking_id,
            status = err.status_code().as_u16(),
            reason = %err,
            "settlement: cash settlement refused"
        );
        err
    }
}

fn is_payable(booking: &BookingEntity) -> bool {
    !booking.is_paid && booking.status == BookingStatus::Accepted.as_str()
}

fn validate_commission(model: &PayCommissionModel) -> UseCaseResult<(Uuid, i64)> {
    let raw_user_id = model
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| SettlementError::Validation("userId is required".to_string()))?;
    let user_id = Uuid::parse_str(raw_user_id)
        .map_err(|_| SettlementError::Validation("userId must be a valid id".to_string()))?;

    let amount_minor = model
        .amount_minor
        .ok_or_else(|| SettlementError::Validation("amount is required".to_string()))?;
    if amount_minor <= 0 {
        return Err(SettlementError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }

    Ok((user_id, amount_minor))
}
