use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::booking_statuses::BookingStatus;

/// A provider's answer to a pending booking request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingDecision {
    Accepted,
    Rejected,
}

impl BookingDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingDecision::Accepted => "accepted",
            BookingDecision::Rejected => "rejected",
        }
    }

    pub fn target_status(&self) -> BookingStatus {
        match self {
            BookingDecision::Accepted => BookingStatus::Accepted,
            BookingDecision::Rejected => BookingStatus::Rejected,
        }
    }
}

impl Display for BookingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
