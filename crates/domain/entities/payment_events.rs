use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::payment_events;

/// Dedup marker for a processed gateway payment. Its primary key is the
/// gateway idempotency key.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_events, primary_key(idempotency_key))]
pub struct PaymentEventEntity {
    pub idempotency_key: String,
    pub event_type: String,
    pub booking_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub amount_minor: i64,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payment_events)]
pub struct InsertPaymentEventEntity {
    pub idempotency_key: String,
    pub event_type: String,
    pub booking_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub amount_minor: i64,
}
