use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::transactions;

/// Append-only ledger row. There is no update path for it anywhere.
#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = transactions)]
pub struct TransactionEntity {
    pub id: Uuid,
    pub source: String,
    pub user_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount_minor: i64,
    pub transaction_type: String,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = transactions)]
pub struct InsertTransactionEntity {
    pub source: String,
    pub user_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount_minor: i64,
    pub transaction_type: String,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub occurred_at: DateTime<Utc>,
}
