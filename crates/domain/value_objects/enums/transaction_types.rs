use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    PayBooking,
    PayWorker,
    PayFine,
}

impl TransactionType {
    pub const ALL: [TransactionType; 3] = [
        TransactionType::PayBooking,
        TransactionType::PayWorker,
        TransactionType::PayFine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::PayBooking => "pay_booking",
            TransactionType::PayWorker => "pay_worker",
            TransactionType::PayFine => "pay_fine",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pay_booking" => Some(TransactionType::PayBooking),
            "pay_worker" => Some(TransactionType::PayWorker),
            "pay_fine" => Some(TransactionType::PayFine),
            _ => None,
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
