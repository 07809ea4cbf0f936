use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

pub type MovementId = i64;

/// Why a movement was appended to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Seeded history, loaded together with the account
    Opening,
    /// Credit side of a transfer
    TransferIn,
    /// Debit side of a transfer
    TransferOut,
    /// Credit granted by the loan operation
    Loan,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Opening => "opening",
            MovementKind::TransferIn => "transfer_in",
            MovementKind::TransferOut => "transfer_out",
            MovementKind::Loan => "loan",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "opening" => Some(MovementKind::Opening),
            "transfer_in" => Some(MovementKind::TransferIn),
            "transfer_out" => Some(MovementKind::TransferOut),
            "loan" => Some(MovementKind::Loan),
            _ => None,
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display direction of a movement, derived from its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Deposit,
    Withdrawal,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Deposit => write!(f, "deposit"),
            Direction::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

/// One signed, append-only ledger entry.
/// Chronological order is the id order; `recorded_at` is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: MovementId,
    pub account_id: AccountId,
    /// Signed amount in cents: positive credits, negative debits
    #[serde(rename = "movement", with = "super::money_string")]
    pub amount_cents: Cents,
    pub kind: MovementKind,
    pub recorded_at: DateTime<Utc>,
}

impl Movement {
    pub fn direction(&self) -> Direction {
        if self.amount_cents > 0 {
            Direction::Deposit
        } else {
            Direction::Withdrawal
        }
    }
}
