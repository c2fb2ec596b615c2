use std::collections::HashMap;

use uuid::Uuid;

pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";

pub const BOOKING_ID_METADATA_KEY: &str = "bookingId";
pub const USER_ID_METADATA_KEY: &str = "userId";

/// A verified gateway event, reduced to what settlement consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub event_type: String,
    pub amount_received_minor: i64,
    pub metadata: HashMap<String, String>,
    /// Stable across redeliveries of the same underlying payment.
    pub idempotency_key: String,
}

impl PaymentEvent {
    pub fn is_payment_succeeded(&self) -> bool {
        self.event_type == PAYMENT_SUCCEEDED
    }
}

/// What a succeeded card payment pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventTarget {
    Booking(Uuid),
    Fine(Uuid),
}

impl PaymentEventTarget {
    /// Exactly one of `bookingId` / `userId` must be present and be a valid id.
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Result<Self, String> {
        let booking_id = non_empty(metadata, BOOKING_ID_METADATA_KEY);
        let user_id = non_empty(metadata, USER_ID_METADATA_KEY);

        match (booking_id, user_id) {
            (Some(raw), None) => Uuid::parse_str(raw)
                .map(PaymentEventTarget::Booking)
                .map_err(|_| format!("malformed {BOOKING_ID_METADATA_KEY}: {raw}")),
            (None, Some(raw)) => Uuid::parse_str(raw)
                .map(PaymentEventTarget::Fine)
                .map_err(|_| format!("malformed {USER_ID_METADATA_KEY}: {raw}")),
            (Some(_), Some(_)) => Err(format!(
                "metadata carries both {BOOKING_ID_METADATA_KEY} and {USER_ID_METADATA_KEY}"
            )),
            (None, None) => Err(format!(
                "metadata carries neither {BOOKING_ID_METADATA_KEY} nor {USER_ID_METADATA_KEY}"
            )),
        }
    }
}

fn non_empty<'a>(metadata: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn booking_id_selects_booking_target() {
        let id = Uuid::new_v4();
        let target =
            PaymentEventTarget::from_metadata(&metadata(&[("bookingId", &id.to_string())]));
        assert_eq!(target, Ok(PaymentEventTarget::Booking(id)));
    }

    #[test]
    fn user_id_selects_fine_target() {
        let id = Uuid::new_v4();
        let target = PaymentEventTarget::from_metadata(&metadata(&[("userId", &id.to_string())]));
        assert_eq!(target, Ok(PaymentEventTarget::Fine(id)));
    }

    #[test]
    fn both_or_neither_is_a_data_error() {
        let both = metadata(&[
            ("bookingId", &Uuid::new_v4().to_string()),
            ("userId", &Uuid::new_v4().to_string()),
        ]);
        assert!(PaymentEventTarget::from_metadata(&both).is_err());
        assert!(PaymentEventTarget::from_metadata(&HashMap::new()).is_err());
        assert!(PaymentEventTarget::from_metadata(&metadata(&[("bookingId", "  ")])).is_err());
    }

    #[test]
    fn malformed_ids_are_a_data_error() {
        let err = PaymentEventTarget::from_metadata(&metadata(&[("bookingId", "abc")]))
            .unwrap_err();
        assert!(err.contains("malformed"), "got: {err}");
    }
}
