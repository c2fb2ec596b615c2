use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::transactions::TransactionEntity;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: Uuid,
    pub source: String,
    pub user_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub amount_minor: i64,
    pub transaction_type: String,
    pub payment_method: String,
    pub occurred_at: DateTime<Utc>,
}

impl From<TransactionEntity> for TransactionDto {
    fn from(value: TransactionEntity) -> Self {
        Self {
            id: value.id,
            source: value.source,
            user_id: value.user_id,
            booking_id: value.booking_id,
            amount_minor: value.amount_minor,
            transaction_type: value.transaction_type,
            payment_method: value.payment_method,
            occurred_at: value.occurred_at,
        }
    }
}

/// Ledger sums per transaction type; types with no rows report zero.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettlementTotals {
    pub pay_booking: i64,
    pub pay_fine: i64,
    pub pay_worker: i64,
}

/// Administrative cash commission settlement. Both fields are optional on
/// the wire so that missing input is reported as a validation failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayCommissionModel {
    pub user_id: Option<String>,
    pub amount_minor: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinePaymentModel {
    pub amount_minor: i64,
}

/// Client-side bootstrap for a mobile card payment sheet.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSheetDto {
    pub payment_intent: String,
    pub ephemeral_key: String,
    pub customer: String,
    pub publishable_key: String,
}
