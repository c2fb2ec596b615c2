use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::bookings::{BookingEntity, InsertBookingEntity},
    value_objects::{
        booking_window::BookingWindow,
        bookings::{BookingScope, CreateBookingOutcome, StatusTransition},
        pagination::Page,
    },
};

#[async_trait]
#[automock]
pub trait BookingRepository {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<BookingEntity>>;

    /// Bookings of `provider_id` that overlap `window` and still hold the slot.
    async fn find_overlapping_active(
        &self,
        provider_id: Uuid,
        window: BookingWindow,
    ) -> Result<Vec<BookingEntity>>;

    /// Re-checks availability and inserts, serialized against other
    /// insertions for the same provider.
    async fn create_if_available(
        &self,
        booking: InsertBookingEntity,
    ) -> Result<CreateBookingOutcome>;

    /// Applies the transition only if the row still matches its source state.
    /// `None` means nothing matched.
    async fn transition_status(
        &self,
        transition: StatusTransition,
    ) -> Result<Option<BookingEntity>>;

    async fn list(&self, scope: BookingScope, page: Page) -> Result<Vec<BookingEntity>>;
}
