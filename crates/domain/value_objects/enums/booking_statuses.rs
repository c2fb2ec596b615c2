use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Canceled,
    Completed,
}

impl BookingStatus {
    /// Statuses that release the provider's time slot.
    pub const INACTIVE: [BookingStatus; 2] = [BookingStatus::Canceled, BookingStatus::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Canceled => "canceled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "accepted" => Some(BookingStatus::Accepted),
            "rejected" => Some(BookingStatus::Rejected),
            "canceled" => Some(BookingStatus::Canceled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    /// The transition table. Every status mutation is checked against it
    /// before the conditional write reaches the store.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Accepted)
                | (BookingStatus::Pending, BookingStatus::Rejected)
                | (BookingStatus::Accepted, BookingStatus::Canceled)
                | (BookingStatus::Accepted, BookingStatus::Completed)
        )
    }

    /// No outgoing edges.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Canceled | BookingStatus::Completed
        )
    }

    /// Whether a booking in this status still holds the provider's slot.
    pub fn holds_slot(&self) -> bool {
        !Self::INACTIVE.contains(self)
    }

    pub fn inactive_strs() -> Vec<String> {
        Self::INACTIVE.iter().map(|s| s.to_string()).collect()
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
