use std::sync::Arc;

use anyhow::Result;
use crates::domain::{
    entities::bookings::BookingEntity, repositories::bookings::BookingRepository,
    value_objects::booking_window::BookingWindow,
};
use tracing::debug;
use uuid::Uuid;

/// Whether `window` collides with any booking in `existing` that still holds
/// its slot. Rows with an unreadable status are treated as holding it.
pub fn has_conflict(existing: &[BookingEntity], window: &BookingWindow) -> bool {
    existing.iter().any(|booking| {
        let holds_slot = booking
            .booking_status()
            .map(|status| status.holds_slot())
            .unwrap_or(true);
        let overlaps = booking
            .window()
            .map(|other| other.overlaps(window))
            .unwrap_or(true);
        holds_slot && overlaps
    })
}

/// Answers "is this provider free for this window?". The answer is advisory:
/// `BookingRepository::create_if_available` re-checks under a lock.
pub struct AvailabilityChecker<B>
where
    B: BookingRepository + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
}

impl<B> AvailabilityChecker<B>
where
    B: BookingRepository + Send + Sync + 'static,
{
    pub fn new(booking_repo: Arc<B>) -> Self {
        Self { booking_repo }
    }

    pub async fn is_available(&self, provider_id: Uuid, window: BookingWindow) -> Result<bool> {
        let candidates = self
            .booking_repo
            .find_overlapping_active(provider_id, window)
            .await?;

        let available = !has_conflict(&candidates, &window);
        debug!(
            %provider_id,
            candidate_count = candidates.len(),
            available,
            "availability: provider window checked"
        );
        Ok(available)
    }
}
