use std::sync::Arc;

use anyhow::{Result, anyhow};
use crates::{
    domain::{
        repositories::{
            bookings::BookingRepository, settlement::SettlementRepository,
            transactions::TransactionRepository, users::UserRepository,
        },
        value_objects::{
            payment_events::{PaymentEvent, PaymentEventTarget},
            settlement::SettlementOutcome,
        },
    },
    payments::stripe_client::StripeClient,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::settlement::{SettlementError, SettlementUseCase};

/// Verifies a raw gateway delivery and reduces it to a `PaymentEvent`.
#[cfg_attr(test, mockall::automock)]
pub trait PaymentGateway: Send + Sync {
    fn verify_event(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent>;
}

impl PaymentGateway for StripeClient {
    fn verify_event(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent> {
        let event = self.verify_webhook_signature(payload, signature_header)?;
        let intent = StripeClient::extract_payment_intent(&event);

        // Redeliveries of one payment share the intent id; the event id is
        // only a fallback for objects that are not payment intents.
        let idempotency_key = intent
            .as_ref()
            .map(|intent| intent.id.clone())
            .or_else(|| event.id.clone())
            .ok_or_else(|| anyhow!("stripe event {:?} carries no identifier", event.type_))?;

        let (amount_received_minor, metadata) = intent
            .map(|intent| (intent.amount_received, intent.metadata))
            .unwrap_or_default();

        Ok(PaymentEvent {
            event_type: event.type_,
            amount_received_minor,
            metadata,
            idempotency_key,
        })
    }
}

#[derive(Debug, Error)]
pub enum PaymentEventError {
    #[error("invalid payment event signature: {0}")]
    InvalidSignature(String),
}

impl PaymentEventError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            PaymentEventError::InvalidSignature(_) => axum::http::StatusCode::BAD_REQUEST,
        }
    }
}

/// What happened to an acknowledged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Not a payment success; acknowledged without effects.
    Ignored,
    Settled,
    /// Already settled by an earlier delivery.
    Duplicate,
    /// Settlement refused or failed; logged at error level for operators.
    Dropped,
}

pub struct PaymentEventUseCase<G, B, U, T, S>
where
    G: PaymentGateway + 'static,
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
{
    gateway: Arc<G>,
    settlement: Arc<SettlementUseCase<B, U, T, S>>,
}

impl<G, B, U, T, S> PaymentEventUseCase<G, B, U, T, S>
where
    G: PaymentGateway + 'static,
    B: BookingRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    S: SettlementRepository + Send + Sync + 'static,
{
    pub fn new(gateway: Arc<G>, settlement: Arc<SettlementUseCase<B, U, T, S>>) -> Self {
        Self {
            gateway,
            settlement,
        }
    }

    /// Only a failed verification is reported back to the gateway. Anything
    /// after that is acknowledged so the gateway stops redelivering it.
    pub async fn handle(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> std::result::Result<EventDisposition, PaymentEventError> {
        let event = self
            .gateway
            .verify_event(payload, signature_header)
            .map_err(|err| {
                let err = PaymentEventError::InvalidSignature(err.to_string());
                warn!(
                    status = err.status_code().as_u16(),
                    reason = %err,
                    "payment_events: webhook verification failed"
                );
                err
            })?;

        Ok(self.handle_event(event).await)
    }

    pub async fn handle_event(&self, event: PaymentEvent) -> EventDisposition {
        let event_type = event.event_type.as_str();
        let idempotency_key = event.idempotency_key.as_str();

        if !event.is_payment_succeeded() {
            debug!(event_type, idempotency_key, "payment_events: ignoring event");
            return EventDisposition::Ignored;
        }
        info!(
            event_type,
            idempotency_key,
            amount_received_minor = event.amount_received_minor,
            "payment_events: payment succeeded"
        );

        let target = match PaymentEventTarget::from_metadata(&event.metadata) {
            Ok(target) => target,
            Err(reason) => {
                error!(
                    event_type,
                    idempotency_key,
                    %reason,
                    "payment_events: unusable payment metadata, event dropped"
                );
                return EventDisposition::Dropped;
            }
        };

        match self
            .settlement
            .settle_card_payment(target, event.amount_received_minor, idempotency_key)
            .await
        {
            Ok(SettlementOutcome::DuplicateEvent) => EventDisposition::Duplicate,
            Ok(_) => EventDisposition::Settled,
            Err(SettlementError::Internal(err)) => {
                error!(
                    event_type,
                    idempotency_key,
                    ?target,
                    db_error = ?err,
                    "payment_events: settlement failed, event dropped"
                );
                EventDisposition::Dropped
            }
            Err(err) => {
                error!(
                    event_type,
                    idempotency_key,
                    ?target,
                    reason = %err,
                    "payment_events: settlement refused, event dropped"
                );
                EventDisposition::Dropped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::usecases::test_support::{InMemoryStore, booking, user};
    use crates::domain::value_objects::{
        enums::{booking_statuses::BookingStatus, user_roles::UserRole},
        payment_events::{BOOKING_ID_METADATA_KEY, PAYMENT_SUCCEEDED, USER_ID_METADATA_KEY},
    };
    use uuid::Uuid;

    type StoreEvents =
        PaymentEventUseCase<MockPaymentGateway, InMemoryStore, InMemoryStore, InMemoryStore, InMemoryStore>;

    fn usecase(store: &Arc<InMemoryStore>, gateway: MockPaymentGateway) -> StoreEvents {
        let settlement = SettlementUseCase::new(
            Arc::clone(store),
            Arc::clone(store),
            Arc::clone(store),
            Arc::clone(store),
        );
        PaymentEventUseCase::new(Arc::new(gateway), Arc::new(settlement))
    }

    fn succeeded(key: &str, metadata: &[(&str, String)]) -> PaymentEvent {
        PaymentEvent {
            event_type: PAYMENT_SUCCEEDED.to_string(),
            amount_received_minor: 1000,
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            idempotency_key: key.to_string(),
        }
    }

    fn seeded_booking(store: &InMemoryStore) -> (Uuid, Uuid) {
        let customer = user(UserRole::Customer, "Mona");
        let provider = user(UserRole::Provider, "Karim");
        let row = booking(provider.id, customer.id, (10, 12), BookingStatus::Accepted, 1000);
        let ids = (row.id, provider.id);
        store.put_user(customer);
        store.put_user(provider);
        store.put_booking(row);
        ids
    }

    #[tokio::test]
    async fn duplicate_delivery_settles_once() {
        let store = InMemoryStore::new();
        let (booking_id, provider_id) = seeded_booking(&store);
        let event = succeeded("pi_1", &[(BOOKING_ID_METADATA_KEY, booking_id.to_string())]);

        let mut gateway = MockPaymentGateway::new();
        let delivered = event.clone();
        gateway
            .expect_verify_event()
            .times(2)
            .returning(move |_, _| Ok(delivered.clone()));
        let events = usecase(&store, gateway);

        let first = events.handle(b"{}", "t=1,v1=aa").await.unwrap();
        let second = events.handle(b"{}", "t=1,v1=aa").await.unwrap();

        assert_eq!(first, EventDisposition::Settled);
        assert_eq!(second, EventDisposition::Duplicate);
        assert_eq!(store.transactions().len(), 2);
        assert_eq!(store.balance(provider_id), 900);
    }

    #[tokio::test]
    async fn failed_verification_is_reported() {
        let store = InMemoryStore::new();
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_verify_event()
            .returning(|_, _| Err(anyhow!("no matching v1 signature")));
        let events = usecase(&store, gateway);

        let err = events.handle(b"{}", "bogus").await.unwrap_err();

        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert!(store.transactions().is_empty());
    }

    #[tokio::test]
    async fn other_event_types_are_acknowledged_without_effects() {
        let store = InMemoryStore::new();
        let (booking_id, _) = seeded_booking(&store);
        let mut event = succeeded("pi_2", &[(BOOKING_ID_METADATA_KEY, booking_id.to_string())]);
        event.event_type = "payment_intent.payment_failed".to_string();

        let disposition = usecase(&store, MockPaymentGateway::new())
            .handle_event(event)
            .await;

        assert_eq!(disposition, EventDisposition::Ignored);
        assert!(store.transactions().is_empty());
        assert!(!store.booking(booking_id).unwrap().is_paid);
    }

    #[tokio::test]
    async fn bad_metadata_is_acknowledged_and_dropped() {
        let store = InMemoryStore::new();
        let events = usecase(&store, MockPaymentGateway::new());

        let neither = events.handle_event(succeeded("pi_3", &[])).await;
        let malformed = events
            .handle_event(succeeded("pi_4", &[(BOOKING_ID_METADATA_KEY, "abc".to_string())]))
            .await;

        assert_eq!(neither, EventDisposition::Dropped);
        assert_eq!(malformed, EventDisposition::Dropped);
        assert!(store.transactions().is_empty());
    }

    #[tokio::test]
    async fn vanished_booking_is_dropped() {
        let store = InMemoryStore::new();
        let events = usecase(&store, MockPaymentGateway::new());

        let disposition = events
            .handle_event(succeeded(
                "pi_5",
                &[(BOOKING_ID_METADATA_KEY, Uuid::new_v4().to_string())],
            ))
            .await;

        assert_eq!(disposition, EventDisposition::Dropped);
    }

    #[tokio::test]
    async fn fine_payment_is_settled_against_the_user() {
        let store = InMemoryStore::new();
        let provider = user(UserRole::Provider, "Karim");
        let provider_id = provider.id;
        store.put_user(provider);

        let disposition = usecase(&store, MockPaymentGateway::new())
            .handle_event(succeeded(
                "pi_6",
                &[(USER_ID_METADATA_KEY, provider_id.to_string())],
            ))
            .await;

        assert_eq!(disposition, EventDisposition::Settled);
        assert_eq!(store.balance(provider_id), 1000);
    }

    #[test]
    fn stripe_event_maps_to_payment_event() {
        let client = StripeClient::new("sk_test".to_string(), "whsec_test".to_string());
        let payload = serde_json::json!({
            "id": "evt_1",
            "type": PAYMENT_SUCCEEDED,
            "data": { "object": {
                "id": "pi_9",
                "amount": 1000,
                "amount_received": 1000,
                "metadata": { "bookingId": "b-1" }
            }}
        })
        .to_string();
        let header = signed_header("whsec_test", payload.as_bytes());

        let event = client.verify_event(payload.as_bytes(), &header).unwrap();

        assert_eq!(event.idempotency_key, "pi_9");
        assert_eq!(event.amount_received_minor, 1000);
        assert_eq!(
            event.metadata,
            HashMap::from([("bookingId".to_string(), "b-1".to_string())])
        );
    }

    fn signed_header(secret: &str, payload: &[u8]) -> String {
        use hmac::{Hmac, Mac};

        let timestamp = chrono::Utc::now().timestamp();
        let mut mac = Hmac::<sha2::Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }
}
