//! Push notifications sent to booking participants.
//!
//! Delivery is fire-and-forget: callers hand over a message and move on, and
//! a failed push never undoes the booking change that triggered it.

mod fcm;

pub use fcm::FcmNotifier;

use mockall::automock;
use tracing::debug;

use crate::domain::value_objects::enums::notification_categories::NotificationCategory;

#[automock]
pub trait NotificationSender: Send + Sync {
    fn notify(&self, device_token: &str, category: NotificationCategory, subject_name: &str);
}

/// Used when no push credentials are configured.
pub struct DisabledNotifier;

impl NotificationSender for DisabledNotifier {
    fn notify(&self, _device_token: &str, category: NotificationCategory, _subject_name: &str) {
        debug!(%category, "notifications: push disabled, dropping notification");
    }
}
