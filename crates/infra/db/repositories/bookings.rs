use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    OptionalExtension, PgConnection, RunQueryDsl, insert_into,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
    sql_query,
    sql_types::BigInt,
    update,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::bookings},
};
use domain::{
    entities::bookings::{BookingEntity, InsertBookingEntity},
    repositories::bookings::BookingRepository,
    value_objects::{
        booking_window::BookingWindow,
        bookings::{BookingScope, CreateBookingOutcome, StatusTransition},
        enums::booking_statuses::BookingStatus,
        pagination::Page,
    },
};

/// Name of the exclusion constraint declared in the bookings migration.
const NO_OVERLAP_CONSTRAINT: &str = "bookings_no_overlap";

pub struct BookingPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl BookingPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = bookings)]
struct StatusChangeset {
    status: String,
    reject_reason: Option<String>,
    cancel_reason: Option<String>,
    updated_at: DateTime<Utc>,
}

fn overlapping_active(
    conn: &mut PgConnection,
    provider_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> QueryResult<Vec<BookingEntity>> {
    bookings::table
        .filter(bookings::provider_id.eq(provider_id))
        .filter(bookings::start_date.lt(end))
        .filter(bookings::end_date.gt(start))
        .filter(diesel::dsl::not(
            bookings::status.eq_any(BookingStatus::inactive_strs()),
        ))
        .select(BookingEntity::as_select())
        .load::<BookingEntity>(conn)
}

/// Folds the provider id into the 64-bit key space of Postgres advisory locks.
fn provider_lock_key(provider_id: Uuid) -> i64 {
    let raw = provider_id.as_u128();
    ((raw >> 64) as u64 ^ raw as u64) as i64
}

fn is_overlap_violation(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::Unknown, info) => {
            info.constraint_name() == Some(NO_OVERLAP_CONSTRAINT)
        }
        _ => false,
    }
}

#[async_trait]
impl BookingRepository for BookingPostgres {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let booking = bookings::table
            .filter(bookings::id.eq(booking_id))
            .select(BookingEntity::as_select())
            .first::<BookingEntity>(&mut conn)
            .optional()?;

        Ok(booking)
    }

    async fn find_overlapping_active(
        &self,
        provider_id: Uuid,
        window: BookingWindow,
    ) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let results = overlapping_active(&mut conn, provider_id, window.start(), window.end())?;

        Ok(results)
    }

    async fn create_if_available(
        &self,
        booking: InsertBookingEntity,
    ) -> Result<CreateBookingOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = conn.transaction::<_, DieselError, _>(|conn| {
            sql_query("SELECT pg_advisory_xact_lock($1)")
                .bind::<BigInt, _>(provider_lock_key(booking.provider_id))
                .execute(conn)?;

            let conflicts =
                overlapping_active(conn, booking.provider_id, booking.start_date, booking.end_date)?;
            if !conflicts.is_empty() {
                return Ok(CreateBookingOutcome::SlotTaken);
            }

            let created = insert_into(bookings::table)
                .values(&booking)
                .returning(BookingEntity::as_returning())
                .get_result::<BookingEntity>(conn)?;

            Ok(CreateBookingOutcome::Created(created))
        });

        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) if is_overlap_violation(&err) => Ok(CreateBookingOutcome::SlotTaken),
            Err(err) => Err(err.into()),
        }
    }

    async fn transition_status(
        &self,
        transition: StatusTransition,
    ) -> Result<Option<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let changeset = StatusChangeset {
            status: transition.to.to_string(),
            reject_reason: transition.reject_reason,
            cancel_reason: transition.cancel_reason,
            updated_at: Utc::now(),
        };

        let target = bookings::table
            .filter(bookings::id.eq(transition.booking_id))
            .filter(bookings::status.eq(transition.from.to_string()));

        let updated = if transition.require_paid {
            update(target.filter(bookings::is_paid.eq(true)))
                .set(&changeset)
                .returning(BookingEntity::as_returning())
                .get_result::<BookingEntity>(&mut conn)
                .optional()?
        } else {
            update(target)
                .set(&changeset)
                .returning(BookingEntity::as_returning())
                .get_result::<BookingEntity>(&mut conn)
                .optional()?
        };

        Ok(updated)
    }

    async fn list(&self, scope: BookingScope, page: Page) -> Result<Vec<BookingEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = bookings::table.into_boxed();
        query = match scope {
            BookingScope::All => query,
            BookingScope::Customer(customer_id) => {
                query.filter(bookings::customer_id.eq(customer_id))
            }
            BookingScope::Provider(provider_id) => {
                query.filter(bookings::provider_id.eq(provider_id))
            }
        };

        let results = query
            .order(bookings::created_at.desc())
            .limit(page.limit)
            .offset(page.offset())
            .select(BookingEntity::as_select())
            .load::<BookingEntity>(&mut conn)?;

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_key_is_stable_per_provider() {
        let provider_id = Uuid::new_v4();
        assert_eq!(provider_lock_key(provider_id), provider_lock_key(provider_id));
    }

    #[test]
    fn lock_key_folds_both_halves() {
        let low_only = Uuid::from_u128(0x0000_0000_0000_0000_0000_0000_0000_00ff);
        let high_only = Uuid::from_u128(0x0000_0000_0000_00ff_0000_0000_0000_0000);
        assert_eq!(provider_lock_key(low_only), provider_lock_key(high_only));
        assert_eq!(provider_lock_key(low_only), 0xff);
    }
}
