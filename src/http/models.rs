use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::AppError;
use crate::domain::{AccountId, Cents, cents_from_json};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    /// A JSON number or a decimal string
    pub amount: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub account_id: AccountId,
    /// A JSON number or a decimal string
    pub amount: Value,
}

/// Read a request amount, reporting malformed values as invalid input.
pub fn parse_amount(amount: &Value) -> Result<Cents, AppError> {
    cents_from_json(amount).map_err(|err| AppError::InvalidAmount(format!("{}: {}", amount, err)))
}

/// Success body: a human-readable message next to the operation's receipt.
#[derive(Debug, Serialize)]
pub struct OperationResponse<T> {
    pub message: &'static str,
    #[serde(flatten)]
    pub receipt: T,
}
