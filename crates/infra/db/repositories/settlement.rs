use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{PgConnection, RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use tracing::debug;

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{bookings, payment_events, transactions, users},
};
use domain::{
    repositories::settlement::SettlementRepository,
    value_objects::{
        enums::booking_statuses::BookingStatus,
        settlement::{SettlementOutcome, SettlementPlan},
    },
};

pub struct SettlementPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SettlementPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Aborts the surrounding transaction either because a guard did not hold
/// or because the database failed.
enum TxError {
    Rejected(SettlementOutcome),
    Db(diesel::result::Error),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Db(err)
    }
}

fn write_plan(conn: &mut PgConnection, plan: &SettlementPlan) -> Result<(), TxError> {
    let now = Utc::now();

    if let Some(marker) = &plan.dedup_marker {
        let inserted = insert_into(payment_events::table)
            .values(marker)
            .on_conflict_do_nothing()
            .execute(conn)?;
        if inserted == 0 {
            return Err(TxError::Rejected(SettlementOutcome::DuplicateEvent));
        }
    }

    if let Some(booking_id) = plan.mark_booking_paid {
        let flipped = update(
            bookings::table
                .filter(bookings::id.eq(booking_id))
                .filter(bookings::status.eq(BookingStatus::Accepted.to_string()))
                .filter(bookings::is_paid.eq(false)),
        )
        .set((bookings::is_paid.eq(true), bookings::updated_at.eq(now)))
        .execute(conn)?;
        if flipped == 0 {
            return Err(TxError::Rejected(SettlementOutcome::BookingNotPayable));
        }
    }

    for adjustment in &plan.balance_adjustments {
        let adjusted = update(users::table.filter(users::id.eq(adjustment.user_id)))
            .set((
                users::provider_balance_minor
                    .eq(users::provider_balance_minor + adjustment.delta_minor),
                users::updated_at.eq(now),
            ))
            .execute(conn)?;
        if adjusted == 0 {
            return Err(TxError::Rejected(SettlementOutcome::AccountMissing(
                adjustment.user_id,
            )));
        }
    }

    if !plan.ledger_entries.is_empty() {
        insert_into(transactions::table)
            .values(&plan.ledger_entries)
            .execute(conn)?;
    }

    Ok(())
}

#[async_trait]
impl SettlementRepository for SettlementPostgres {
    async fn apply(&self, plan: SettlementPlan) -> Result<SettlementOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        match conn.transaction::<_, TxError, _>(|conn| write_plan(conn, &plan)) {
            Ok(()) => Ok(SettlementOutcome::Applied),
            Err(TxError::Rejected(outcome)) => {
                debug!(?outcome, "settlement: plan rolled back");
                Ok(outcome)
            }
            Err(TxError::Db(err)) => Err(err.into()),
        }
    }
}
