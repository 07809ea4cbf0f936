use thiserror::Error;

use crate::domain::{AccountId, Cents, RuleViolation, format_cents};

/// Coarse error classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    PolicyViolation,
    PersistenceFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::PolicyViolation => "policy_violation",
            ErrorKind::PersistenceFailure => "persistence_failure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("No account with username: {0}")]
    UsernameNotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid PIN: must be 4 digits")]
    InvalidPin,

    #[error("Invalid owner name: {0:?}")]
    InvalidOwner(String),

    #[error("Invalid interest rate: {0}")]
    InvalidInterestRate(f64),

    #[error("Cannot transfer from account {0} to itself")]
    SameAccountTransfer(AccountId),

    #[error(
        "Insufficient balance in account {account_id}: balance {}, required {}",
        money(.balance),
        money(.required)
    )]
    InsufficientBalance {
        account_id: AccountId,
        balance: Cents,
        required: Cents,
    },

    #[error(
        "Loan of {} exceeds 10% of the balance of account {account_id} (at most {})",
        money(.requested),
        money(.ceiling)
    )]
    LoanExceedsPolicy {
        account_id: AccountId,
        requested: Cents,
        ceiling: Cents,
    },

    #[error(
        "Crediting {} would exceed the largest balance account {account_id} can hold",
        money(.amount)
    )]
    BalanceLimitExceeded { account_id: AccountId, amount: Cents },

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::AccountNotFound(_) | AppError::UsernameNotFound(_) => ErrorKind::NotFound,
            AppError::InvalidAmount(_)
            | AppError::InvalidPin
            | AppError::InvalidOwner(_)
            | AppError::InvalidInterestRate(_) => ErrorKind::InvalidInput,
            AppError::SameAccountTransfer(_)
            | AppError::InsufficientBalance { .. }
            | AppError::LoanExceedsPolicy { .. }
            | AppError::BalanceLimitExceeded { .. }
            | AppError::UsernameTaken(_) => ErrorKind::PolicyViolation,
            AppError::Database(_) => ErrorKind::PersistenceFailure,
        }
    }
}

impl From<RuleViolation> for AppError {
    fn from(violation: RuleViolation) -> Self {
        match violation {
            RuleViolation::InvalidAmount(amount) => AppError::InvalidAmount(format!(
                "amount must be positive, got {}",
                format_cents(amount)
            )),
            RuleViolation::SameAccountTransfer(id) => AppError::SameAccountTransfer(id),
            RuleViolation::InsufficientBalance {
                account_id,
                balance,
                required,
            } => AppError::InsufficientBalance {
                account_id,
                balance,
                required,
            },
            RuleViolation::LoanExceedsPolicy {
                account_id,
                requested,
                ceiling,
            } => AppError::LoanExceedsPolicy {
                account_id,
                requested,
                ceiling,
            },
            RuleViolation::BalanceLimitExceeded { account_id, amount } => {
                AppError::BalanceLimitExceeded { account_id, amount }
            }
        }
    }
}

fn money(cents: &Cents) -> String {
    format_cents(*cents)
}
