use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    BookingSent,
    BookingAccepted,
    BookingRejected,
    BookingCanceled,
    BookingCompleted,
}

/// Rendered push notification text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::BookingSent => "booking_sent",
            NotificationCategory::BookingAccepted => "booking_accepted",
            NotificationCategory::BookingRejected => "booking_rejected",
            NotificationCategory::BookingCanceled => "booking_canceled",
            NotificationCategory::BookingCompleted => "booking_completed",
        }
    }

    pub fn render(&self, subject_name: &str) -> NotificationMessage {
        let (title, body) = match self {
            NotificationCategory::BookingSent => (
                "New booking request",
                format!("{subject_name} sent you a booking request"),
            ),
            NotificationCategory::BookingAccepted => (
                "Booking accepted",
                format!("{subject_name} accepted your booking request"),
            ),
            NotificationCategory::BookingRejected => (
                "Booking rejected",
                format!("{subject_name} rejected your booking request"),
            ),
            NotificationCategory::BookingCanceled => (
                "Booking canceled",
                format!("{subject_name} canceled the booking"),
            ),
            NotificationCategory::BookingCompleted => (
                "Booking completed",
                format!("Booking with {subject_name} was completed"),
            ),
        };

        NotificationMessage {
            title: title.to_string(),
            body,
        }
    }
}

impl Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
