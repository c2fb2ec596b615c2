use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Which side money flows from: `User` means user -> platform, `System`
/// means platform -> user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionSource {
    User,
    System,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSource::User => "USER",
            TransactionSource::System => "SYSTEM",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "USER" => Some(TransactionSource::User),
            "SYSTEM" => Some(TransactionSource::System),
            _ => None,
        }
    }
}

impl Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
