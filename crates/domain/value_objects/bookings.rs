use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    entities::bookings::BookingEntity,
    value_objects::enums::{booking_decisions::BookingDecision, booking_statuses::BookingStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BookingAddress {
    pub details: String,
    pub phone: String,
    pub city: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBookingModel {
    pub service_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub address: BookingAddress,
    pub price_minor: i64,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RespondBookingModel {
    pub response: BookingDecision,
    pub reject_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CancelBookingModel {
    pub cancel_reason: Option<String>,
}

/// A conditional status write: applied only if the stored row still has
/// `from` (and is paid, when `require_paid` is set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub booking_id: Uuid,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub require_paid: bool,
    pub reject_reason: Option<String>,
    pub cancel_reason: Option<String>,
}

impl StatusTransition {
    pub fn new(booking_id: Uuid, from: BookingStatus, to: BookingStatus) -> Self {
        Self {
            booking_id,
            from,
            to,
            require_paid: false,
            reject_reason: None,
            cancel_reason: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub customer_id: Uuid,
    pub service_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub address: BookingAddress,
    pub description: String,
    pub price_minor: i64,
    pub price_after_discount_minor: Option<i64>,
    pub status: String,
    pub reject_reason: Option<String>,
    pub cancel_reason: Option<String>,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingEntity> for BookingDto {
    fn from(value: BookingEntity) -> Self {
        let address = value.address();
        Self {
            id: value.id,
            provider_id: value.provider_id,
            customer_id: value.customer_id,
            service_id: value.service_id,
            start_date: value.start_date,
            end_date: value.end_date,
            address,
            description: value.description,
            price_minor: value.price_minor,
            price_after_discount_minor: value.price_after_discount_minor,
            status: value.status,
            reject_reason: value.reject_reason,
            cancel_reason: value.cancel_reason,
            is_paid: value.is_paid,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// Which side of a booking a listing is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingScope {
    All,
    Customer(Uuid),
    Provider(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateBookingOutcome {
    Created(BookingEntity),
    /// An active booking for the provider overlaps the requested window.
    SlotTaken,
}
