use std::{collections::HashMap, sync::Arc};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use crates::{
    domain::{
        entities::users::UserEntity,
        repositories::{bookings::BookingRepository, users::UserRepository},
        value_objects::{
            enums::booking_statuses::BookingStatus,
            payment_events::{BOOKING_ID_METADATA_KEY, USER_ID_METADATA_KEY},
            transactions::{FinePaymentModel, PaymentSheetDto},
        },
    },
    payments::stripe_client::{PaymentIntentRequest, StripeClient},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::settlement::SettlementError;

/// The checkout calls a mobile payment sheet needs from the gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_customer(&self, email: String) -> Result<String>;

    async fn create_ephemeral_key(&self, customer_id: String) -> Result<String>;

    /// Returns the intent's client secret.
    async fn create_payment_intent(&self, request: PaymentIntentRequest) -> Result<String>;
}

#[async_trait]
impl CheckoutGateway for StripeClient {
    async fn create_customer(&self, email: String) -> Result<String> {
        StripeClient::create_customer(self, Some(&email)).await
    }

    async fn create_ephemeral_key(&self, customer_id: String) -> Result<String> {
        StripeClient::create_ephemeral_key(self, &customer_id).await
    }

    async fn create_payment_intent(&self, request: PaymentIntentRequest) -> Result<String> {
        let intent = StripeClient::create_payment_intent(self, request).await?;
        intent
            .client_secret
            .ok_or_else(|| anyhow!("payment intent {} has no client secret", intent.id))
    }
}

pub type UseCaseResult<T> = std::result::Result<T, SettlementError>;

pub struct PaymentSheetUseCase<B, U, G>
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    G: CheckoutGateway + 'static,
{
    booking_repo: Arc<B>,
    user_repo: Arc<U>,
    gateway: Arc<G>,
    publishable_key: String,
    currency: String,
}

impl<B, U, G> PaymentSheetUseCase<B, U, G>
where
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    G: CheckoutGateway + 'static,
{
    pub fn new(
        booking_repo: Arc<B>,
        user_repo: Arc<U>,
        gateway: Arc<G>,
        publishable_key: String,
        currency: String,
    ) -> Self {
        Self {
            booking_repo,
            user_repo,
            gateway,
            publishable_key,
            currency,
        }
    }

    /// Card checkout for an accepted, unpaid booking, requested by its customer.
    pub async fn booking_sheet(
        &self,
        booking_id: Uuid,
        customer_id: Uuid,
    ) -> UseCaseResult<PaymentSheetDto> {
        info!(%booking_id, %customer_id, "payment_sheets: booking sheet requested");

        let booking = self
            .booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "payment_sheets: failed to load booking");
                SettlementError::Internal(err)
            })?
            .ok_or_else(|| refuse(SettlementError::NotFound("booking")))?;

        if booking.customer_id != customer_id {
            return Err(refuse(SettlementError::Unauthorized));
        }
        if booking.is_paid || booking.status != BookingStatus::Accepted.as_str() {
            return Err(refuse(SettlementError::NotPayable(
                "booking must be accepted and unpaid".to_string(),
            )));
        }

        let customer = self.load_user(customer_id).await?;
        let metadata = HashMap::from([(BOOKING_ID_METADATA_KEY.to_string(), booking_id.to_string())]);

        self.build_sheet(&customer, booking.payable_minor(), metadata)
            .await
    }

    /// Card checkout for outstanding commission, requested by a provider.
    pub async fn fine_sheet(
        &self,
        user_id: Uuid,
        model: FinePaymentModel,
    ) -> UseCaseResult<PaymentSheetDto> {
        info!(%user_id, amount_minor = model.amount_minor, "payment_sheets: fine sheet requested");

        if model.amount_minor <= 0 {
            return Err(refuse(SettlementError::Validation(
                "amount must be greater than zero".to_string(),
            )));
        }

        let user = self.load_user(user_id).await?;
        let metadata = HashMap::from([(USER_ID_METADATA_KEY.to_string(), user_id.to_string())]);

        self.build_sheet(&user, model.amount_minor, metadata).await
    }

    async fn load_user(&self, user_id: Uuid) -> UseCaseResult<UserEntity> {
        self.user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "payment_sheets: failed to load user");
                SettlementError::Internal(err)
            })?
            .ok_or_else(|| refuse(SettlementError::NotFound("user")))
    }

    async fn build_sheet(
        &self,
        payer: &UserEntity,
        amount_minor: i64,
        metadata: HashMap<String, String>,
    ) -> UseCaseResult<PaymentSheetDto> {
        let user_id = payer.id;
        let gateway_error = |step: &'static str| {
            move |err: anyhow::Error| {
                error!(%user_id, step, error = ?err, "payment_sheets: gateway call failed");
                SettlementError::Internal(err)
            }
        };

        let customer = self
            .gateway
            .create_customer(payer.email.clone())
            .await
            .map_err(gateway_error("create_customer"))?;
        let ephemeral_key = self
            .gateway
            .create_ephemeral_key(customer.clone())
            .await
            .map_err(gateway_error("create_ephemeral_key"))?;
        let payment_intent = self
            .gateway
            .create_payment_intent(PaymentIntentRequest {
                amount_minor,
                currency: self.currency.clone(),
                customer_id: customer.clone(),
                receipt_email: Some(payer.email.clone()),
                metadata,
            })
            .await
            .map_err(gateway_error("create_payment_intent"))?;

        info!(%user_id, amount_minor, "payment_sheets: payment sheet created");
        Ok(PaymentSheetDto {
            payment_intent,
            ephemeral_key,
            customer,
            publishable_key: self.publishable_key.clone(),
        })
    }
}

fn refuse(err: SettlementError) -> SettlementError {
    warn!(
        status = err.status_code().as_u16(),
        reason = %err,
        "payment_sheets: payment sheet refused"
    );
    err
}
