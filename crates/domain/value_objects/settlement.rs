use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    entities::{
        bookings::BookingEntity, payment_events::InsertPaymentEventEntity,
        transactions::InsertTransactionEntity,
    },
    value_objects::{
        commission::CommissionRate,
        enums::{
            payment_methods::PaymentMethod, transaction_sources::TransactionSource,
            transaction_types::TransactionType,
        },
    },
};

/// Signed change to a user's running balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAdjustment {
    pub user_id: Uuid,
    pub delta_minor: i64,
}

/// Everything one settlement writes. A `SettlementRepository` applies a plan
/// as a single unit or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPlan {
    /// Recorded first; a conflict on it means the payment was already settled.
    pub dedup_marker: Option<InsertPaymentEventEntity>,
    /// Booking whose `is_paid` flips; the flip requires `accepted` and unpaid.
    pub mark_booking_paid: Option<Uuid>,
    pub balance_adjustments: Vec<BalanceAdjustment>,
    pub ledger_entries: Vec<InsertTransactionEntity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    Applied,
    /// The dedup marker already existed; nothing was written.
    DuplicateEvent,
    /// The booking is not `accepted` or is already paid; rolled back.
    BookingNotPayable,
    /// A balance adjustment targeted a user that does not exist; rolled back.
    AccountMissing(Uuid),
}

impl SettlementPlan {
    /// Cash collected by the provider at the door. The provider already holds
    /// the money, so the platform fee is debited from their balance.
    pub fn cash_booking(
        booking: &BookingEntity,
        rate: CommissionRate,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let price_minor = booking.payable_minor();
        let split = rate.split(price_minor)?;

        Self::validated(Self {
            dedup_marker: None,
            mark_booking_paid: Some(booking.id),
            balance_adjustments: non_zero(vec![BalanceAdjustment {
                user_id: booking.provider_id,
                delta_minor: -split.admin_fee_minor,
            }]),
            ledger_entries: vec![
                ledger_entry(
                    TransactionSource::User,
                    booking.customer_id,
                    Some(booking.id),
                    price_minor,
                    TransactionType::PayBooking,
                    PaymentMethod::CashOnDelivery,
                    None,
                    now,
                ),
                ledger_entry(
                    TransactionSource::System,
                    booking.provider_id,
                    Some(booking.id),
                    split.provider_share_minor,
                    TransactionType::PayWorker,
                    PaymentMethod::CashOnDelivery,
                    None,
                    now,
                ),
            ],
        })
    }

    /// Card payment captured by the platform. The platform holds the funds,
    /// so the provider's net share is credited to their balance.
    pub fn card_booking(
        booking: &BookingEntity,
        rate: CommissionRate,
        amount_received_minor: i64,
        idempotency_key: &str,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let split = rate.split(booking.payable_minor())?;

        Self::validated(Self {
            dedup_marker: Some(InsertPaymentEventEntity {
                idempotency_key: idempotency_key.to_string(),
                event_type: TransactionType::PayBooking.to_string(),
                booking_id: Some(booking.id),
                user_id: None,
                amount_minor: amount_received_minor,
            }),
            mark_booking_paid: Some(booking.id),
            balance_adjustments: non_zero(vec![BalanceAdjustment {
                user_id: booking.provider_id,
                delta_minor: split.provider_share_minor,
            }]),
            ledger_entries: vec![
                ledger_entry(
                    TransactionSource::User,
                    booking.customer_id,
                    Some(booking.id),
                    amount_received_minor,
                    TransactionType::PayBooking,
                    PaymentMethod::Card,
                    Some(idempotency_key),
                    now,
                ),
                ledger_entry(
                    TransactionSource::System,
                    booking.provider_id,
                    Some(booking.id),
                    split.provider_share_minor,
                    TransactionType::PayWorker,
                    PaymentMethod::Card,
                    Some(idempotency_key),
                    now,
                ),
            ],
        })
    }

    /// Standalone card payment (a fine or outstanding commission); the full
    /// amount is credited to the payer's balance.
    pub fn card_fine(
        user_id: Uuid,
        amount_received_minor: i64,
        idempotency_key: &str,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        Self::validated(Self {
            dedup_marker: Some(InsertPaymentEventEntity {
                idempotency_key: idempotency_key.to_string(),
                event_type: TransactionType::PayFine.to_string(),
                booking_id: None,
                user_id: Some(user_id),
                amount_minor: amount_received_minor,
            }),
            mark_booking_paid: None,
            balance_adjustments: vec![BalanceAdjustment {
                user_id,
                delta_minor: amount_received_minor,
            }],
            ledger_entries: vec![ledger_entry(
                TransactionSource::User,
                user_id,
                None,
                amount_received_minor,
                TransactionType::PayFine,
                PaymentMethod::Card,
                Some(idempotency_key),
                now,
            )],
        })
    }

    /// Commission handed to an admin in cash.
    pub fn cash_commission(user_id: Uuid, amount_minor: i64, now: DateTime<Utc>) -> Result<Self> {
        Self::validated(Self {
            dedup_marker: None,
            mark_booking_paid: None,
            balance_adjustments: vec![BalanceAdjustment {
                user_id,
                delta_minor: amount_minor,
            }],
            ledger_entries: vec![ledger_entry(
                TransactionSource::User,
                user_id,
                None,
                amount_minor,
                TransactionType::PayFine,
                PaymentMethod::CashOnDelivery,
                None,
                now,
            )],
        })
    }

    fn validated(plan: Self) -> Result<Self> {
        if let Some(entry) = plan.ledger_entries.iter().find(|e| e.amount_minor <= 0) {
            bail!(
                "ledger amount must be positive: {} {} for user {}",
                entry.transaction_type,
                entry.amount_minor,
                entry.user_id
            );
        }
        Ok(plan)
    }
}

fn non_zero(adjustments: Vec<BalanceAdjustment>) -> Vec<BalanceAdjustment> {
    adjustments
        .into_iter()
        .filter(|adjustment| adjustment.delta_minor != 0)
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn ledger_entry(
    source: TransactionSource,
    user_id: Uuid,
    booking_id: Option<Uuid>,
    amount_minor: i64,
    transaction_type: TransactionType,
    payment_method: PaymentMethod,
    payment_reference: Option<&str>,
    occurred_at: DateTime<Utc>,
) -> InsertTransactionEntity {
    InsertTransactionEntity {
        source: source.to_string(),
        user_id,
        booking_id,
        amount_minor,
        transaction_type: transaction_type.to_string(),
        payment_method: payment_method.to_string(),
        payment_reference: payment_reference.map(str::to_string),
        occurred_at,
    }
}
