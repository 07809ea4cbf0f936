use serde::Serialize;
use thiserror::Error;

use super::{AccountId, Cents, Movement, format_cents};

/// A loan may be at most `1 / LOAN_POLICY_DIVISOR` of the current balance.
pub const LOAN_POLICY_DIVISOR: i64 = 10;

/// Per-deposit interest below one unit (100 cents) is not paid out.
const MIN_INTEREST_CENTS: f64 = 100.0;

/// Compute an account's balance from its movements.
/// Balance = sum of all signed movement amounts.
pub fn compute_balance(movements: &[Movement]) -> Cents {
    saturate(movements.iter().map(|m| i128::from(m.amount_cents)).sum())
}

/// Balance after applying `amounts` in order, or `None` if any running total
/// leaves the `Cents` range. SQLite's `SUM` fails on the same ledgers.
pub fn running_balance(amounts: &[Cents]) -> Option<Cents> {
    amounts
        .iter()
        .try_fold(0, |balance: Cents, amount| balance.checked_add(*amount))
}

fn saturate(total: i128) -> Cents {
    Cents::try_from(total).unwrap_or(if total < 0 { Cents::MIN } else { Cents::MAX })
}

/// Figures shown next to an account's movement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    #[serde(with = "super::money_string")]
    pub balance: Cents,
    #[serde(with = "super::money_string")]
    pub incomes: Cents,
    #[serde(with = "super::money_string")]
    pub outgoings: Cents,
    #[serde(with = "super::money_string")]
    pub interest: Cents,
}

/// Summarize movements: credits in, debits out (as a positive figure) and the
/// interest earned on every deposit at `interest_rate` percent.
///
/// Totals are accumulated in `i128`. Incomes and outgoings keep growing while
/// money moves back and forth, so a figure past `Cents::MAX` is reported as
/// `Cents::MAX`.
pub fn summarize(movements: &[Movement], interest_rate: f64) -> AccountSummary {
    let amounts = || movements.iter().map(|m| i128::from(m.amount_cents));

    let incomes = amounts().filter(|amount| *amount > 0).sum();
    let outgoings = amounts().filter(|amount| *amount < 0).map(i128::abs).sum();

    let interest = amounts()
        .filter(|amount| *amount > 0)
        .map(|deposit| deposit as f64 * interest_rate / 100.0)
        .filter(|interest| *interest >= MIN_INTEREST_CENTS)
        .map(|interest| interest.round() as i128)
        .sum();

    AccountSummary {
        balance: compute_balance(movements),
        incomes: saturate(incomes),
        outgoings: saturate(outgoings),
        interest: saturate(interest),
    }
}

/// The largest loan the policy grants against `balance`.
pub fn loan_ceiling(balance: Cents) -> Cents {
    if balance <= 0 {
        0
    } else {
        balance / LOAN_POLICY_DIVISOR
    }
}

/// Reject zero and negative amounts.
pub fn validate_amount(amount: Cents) -> Result<(), RuleViolation> {
    if amount <= 0 {
        return Err(RuleViolation::InvalidAmount(amount));
    }
    Ok(())
}

/// A transfer must move value between two different accounts.
pub fn check_distinct(sender: AccountId, receiver: AccountId) -> Result<(), RuleViolation> {
    if sender == receiver {
        return Err(RuleViolation::SameAccountTransfer(sender));
    }
    Ok(())
}

/// The sender must hold at least the transferred amount.
pub fn check_funds(
    account_id: AccountId,
    balance: Cents,
    amount: Cents,
) -> Result<(), RuleViolation> {
    if balance < amount {
        return Err(RuleViolation::InsufficientBalance {
            account_id,
            balance,
            required: amount,
        });
    }
    Ok(())
}

/// Crediting `amount` must leave a balance that still fits in `Cents`.
/// Returns the new balance.
pub fn check_credit(
    account_id: AccountId,
    balance: Cents,
    amount: Cents,
) -> Result<Cents, RuleViolation> {
    balance
        .checked_add(amount)
        .ok_or(RuleViolation::BalanceLimitExceeded { account_id, amount })
}

/// A loan is granted iff `0 < amount <= 10% of balance`, evaluated exactly
/// on integer cents.
pub fn check_loan(account_id: AccountId, balance: Cents, amount: Cents) -> Result<(), RuleViolation> {
    validate_amount(amount)?;
    if i128::from(amount) * i128::from(LOAN_POLICY_DIVISOR) > i128::from(balance) {
        return Err(RuleViolation::LoanExceedsPolicy {
            account_id,
            requested: amount,
            ceiling: loan_ceiling(balance),
        });
    }
    Ok(())
}

/// A ledger rule that rejects an operation before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("amount must be positive, got {}", money(.0))]
    InvalidAmount(Cents),

    #[error("cannot transfer from account {0} to itself")]
    SameAccountTransfer(AccountId),

    #[error(
        "insufficient balance in account {account_id}: balance {}, required {}",
        money(.balance),
        money(.required)
    )]
    InsufficientBalance {
        account_id: AccountId,
        balance: Cents,
        required: Cents,
    },

    #[error(
        "loan of {} for account {account_id} exceeds 10% of balance (at most {})",
        money(.requested),
        money(.ceiling)
    )]
    LoanExceedsPolicy {
        account_id: AccountId,
        requested: Cents,
        ceiling: Cents,
    },

    #[error("crediting {} would overflow the balance of account {account_id}", money(.amount))]
    BalanceLimitExceeded { account_id: AccountId, amount: Cents },
}

fn money(cents: &Cents) -> String {
    format_cents(*cents)
}
