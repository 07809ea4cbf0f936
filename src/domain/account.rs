use serde::{Deserialize, Serialize};

use super::Cents;

pub type AccountId = i64;

/// Highest value a 4-digit PIN can take.
pub const MAX_PIN: u16 = 9999;

/// An account as seen by the directory. `balance` is always the fold of the
/// account's movements at read time, never a stored column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub owner: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub pin: u16,
    /// Percentage, e.g. `1.2` for 1.2%.
    pub interest_rate: f64,
    #[serde(with = "super::money_string")]
    pub balance: Cents,
}

/// Account data before it is stored: the id is assigned by the repository
/// and the username is derived from the owner name.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub owner: String,
    pub pin: u16,
    pub interest_rate: f64,
}

impl NewAccount {
    pub fn new(owner: impl Into<String>, pin: u16, interest_rate: f64) -> Self {
        Self {
            owner: owner.into(),
            pin,
            interest_rate,
        }
    }

    pub fn username(&self) -> String {
        derive_username(&self.owner)
    }
}

/// Derive a username from an owner's display name: the lowercase initial of
/// each whitespace-separated token, concatenated in order.
///
/// "Jonas Schmedtmann" -> "js", "Steven Thomas Williams" -> "stw"
pub fn derive_username(owner: &str) -> String {
    owner
        .split_whitespace()
        .filter_map(|token| token.chars().next())
        .flat_map(char::to_lowercase)
        .collect()
}
