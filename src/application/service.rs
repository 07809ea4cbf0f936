use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::domain::{
    Account, AccountId, AccountSummary, Cents, MAX_PIN, Movement, MovementId, MovementKind,
    NewAccount, check_credit, check_distinct, check_funds, check_loan, format_cents,
    running_balance, summarize, validate_amount,
};
use crate::storage::{LedgerTx, Repository};

use super::AppError;

/// Application service providing the banking operations.
/// This is the interface shared by the HTTP API and the CLI.
pub struct BankService {
    repo: Repository,
}

/// Result of a committed transfer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    #[serde(rename = "amount", with = "crate::domain::money_string")]
    pub amount_cents: Cents,
    pub debit_movement_id: MovementId,
    pub credit_movement_id: MovementId,
}

/// Result of a granted loan
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanReceipt {
    pub account_id: AccountId,
    #[serde(rename = "amount", with = "crate::domain::money_string")]
    pub amount_cents: Cents,
    pub movement_id: MovementId,
}

/// An account with its movements and the figures derived from them
pub struct AccountStatement {
    pub account: Account,
    pub movements: Vec<Movement>,
    pub summary: AccountSummary,
}

impl BankService {
    /// Create a new bank service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Create (if needed) and migrate the configured database.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, AppError> {
        let repo = Repository::init(config).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let repo = Repository::connect(config, false).await?;
        Ok(Self::new(repo))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Check that storage is reachable.
    pub async fn health(&self) -> Result<(), AppError> {
        Ok(self.repo.ping().await?)
    }

    // ========================
    // Account directory
    // ========================

    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AppError> {
        Ok(self.repo.get_account(id).await?)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Account>, AppError> {
        Ok(self.repo.get_account_by_username(username).await?)
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::AccountNotFound(id))
    }

    /// Get an account by username.
    pub async fn get_account_by_username(&self, username: &str) -> Result<Account, AppError> {
        self.find_by_username(username)
            .await?
            .ok_or_else(|| AppError::UsernameNotFound(username.to_string()))
    }

    /// Resolve a numeric id or a username.
    pub async fn resolve_account(&self, key: &str) -> Result<Account, AppError> {
        match key.parse::<AccountId>() {
            Ok(id) => self.get_account(id).await,
            Err(_) => self.get_account_by_username(key).await,
        }
    }

    /// Create an account together with its opening movements, in one
    /// transaction. The username is derived from the owner name and must be
    /// free.
    #[tracing::instrument(skip(self, account), fields(owner = %account.owner))]
    pub async fn create_account(
        &self,
        account: NewAccount,
        opening: &[Cents],
    ) -> Result<Account, AppError> {
        let username = account.username();
        if account.owner.trim().is_empty() || username.is_empty() {
            return Err(AppError::InvalidOwner(account.owner));
        }
        if account.pin > MAX_PIN {
            return Err(AppError::InvalidPin);
        }
        if !account.interest_rate.is_finite() || account.interest_rate < 0.0 {
            return Err(AppError::InvalidInterestRate(account.interest_rate));
        }
        if let Some(zero) = opening.iter().find(|amount| **amount == 0) {
            return Err(AppError::InvalidAmount(format!(
                "opening movements must be non-zero, got {}",
                format_cents(*zero)
            )));
        }
        if running_balance(opening).is_none() {
            return Err(AppError::InvalidAmount(
                "opening movements exceed the largest balance an account can hold".to_string(),
            ));
        }

        let mut tx = self.repo.begin().await?;
        let id = match Self::insert_account(&mut tx, &account, &username, opening).await {
            Ok(id) => id,
            Err(err) => {
                discard(tx).await;
                return Err(err);
            }
        };
        tx.commit().await?;

        info!(id, %username, movements = opening.len(), "account created");
        self.get_account(id).await
    }

    async fn insert_account(
        tx: &mut LedgerTx<'_>,
        account: &NewAccount,
        username: &str,
        opening: &[Cents],
    ) -> Result<AccountId, AppError> {
        if tx.username_exists(username).await? {
            return Err(AppError::UsernameTaken(username.to_string()));
        }

        let id = tx.insert_account(account).await?;
        for amount in opening {
            append(tx, id, *amount, MovementKind::Opening).await?;
        }
        Ok(id)
    }

    // ========================
    // Ledger reads
    // ========================

    /// An account's movements in chronological order.
    pub async fn movements_of(&self, account_id: AccountId) -> Result<Vec<Movement>, AppError> {
        self.get_account(account_id).await?;
        Ok(self.repo.list_movements(account_id).await?)
    }

    /// Current balance: the sum of the account's movements.
    pub async fn balance_of(&self, account_id: AccountId) -> Result<Cents, AppError> {
        self.get_account(account_id).await?;
        Ok(self.repo.compute_balance(account_id).await?)
    }

    /// Incomes, outgoings, interest and balance of an account.
    pub async fn summary(&self, account_id: AccountId) -> Result<AccountSummary, AppError> {
        Ok(self.statement(account_id).await?.summary)
    }

    /// An account with its movements and summary.
    pub async fn statement(&self, account_id: AccountId) -> Result<AccountStatement, AppError> {
        let account = self.get_account(account_id).await?;
        let movements = self.repo.list_movements(account_id).await?;
        let summary = summarize(&movements, account.interest_rate);

        Ok(AccountStatement {
            account,
            movements,
            summary,
        })
    }

    // ========================
    // Ledger writes
    // ========================

    /// Move `amount_cents` from `sender_id` to `receiver_id`.
    ///
    /// The sender's balance is checked inside the same transaction that
    /// appends the debit and the credit, so concurrent transfers cannot both
    /// spend the same funds. On any failure neither movement persists.
    #[tracing::instrument(skip(self), fields(amount = %format_cents(amount_cents)))]
    pub async fn transfer(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount_cents: Cents,
    ) -> Result<TransferReceipt, AppError> {
        let checked =
            validate_amount(amount_cents).and_then(|_| check_distinct(sender_id, receiver_id));
        if let Err(violation) = checked {
            warn!(%violation, "transfer rejected");
            return Err(violation.into());
        }

        let mut tx = self.repo.begin().await?;
        let applied = Self::apply_transfer(&mut tx, sender_id, receiver_id, amount_cents).await;
        let receipt = match applied {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(error = %err, kind = %err.kind(), "transfer rejected");
                discard(tx).await;
                return Err(err);
            }
        };
        tx.commit().await?;

        info!(
            debit = receipt.debit_movement_id,
            credit = receipt.credit_movement_id,
            "transfer committed"
        );
        Ok(receipt)
    }

    async fn apply_transfer(
        tx: &mut LedgerTx<'_>,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount_cents: Cents,
    ) -> Result<TransferReceipt, AppError> {
        for id in [sender_id, receiver_id] {
            if !tx.account_exists(id).await? {
                return Err(AppError::AccountNotFound(id));
            }
        }

        let balance = tx.balance_of(sender_id).await?;
        check_funds(sender_id, balance, amount_cents)?;
        let receiver_balance = tx.balance_of(receiver_id).await?;
        check_credit(receiver_id, receiver_balance, amount_cents)?;

        let debit_movement_id =
            append(tx, sender_id, -amount_cents, MovementKind::TransferOut).await?;
        let credit_movement_id =
            append(tx, receiver_id, amount_cents, MovementKind::TransferIn).await?;

        Ok(TransferReceipt {
            sender_id,
            receiver_id,
            amount_cents,
            debit_movement_id,
            credit_movement_id,
        })
    }

    /// Grant a loan of `amount_cents`, allowed up to 10% of the current
    /// balance (boundary included).
    #[tracing::instrument(skip(self), fields(amount = %format_cents(amount_cents)))]
    pub async fn request_loan(
        &self,
        account_id: AccountId,
        amount_cents: Cents,
    ) -> Result<LoanReceipt, AppError> {
        if let Err(violation) = validate_amount(amount_cents) {
            warn!(%violation, "loan rejected");
            return Err(violation.into());
        }

        let mut tx = self.repo.begin().await?;
        let receipt = match Self::apply_loan(&mut tx, account_id, amount_cents).await {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(error = %err, kind = %err.kind(), "loan rejected");
                discard(tx).await;
                return Err(err);
            }
        };
        tx.commit().await?;

        info!(movement = receipt.movement_id, "loan granted");
        Ok(receipt)
    }

    async fn apply_loan(
        tx: &mut LedgerTx<'_>,
        account_id: AccountId,
        amount_cents: Cents,
    ) -> Result<LoanReceipt, AppError> {
        if !tx.account_exists(account_id).await? {
            return Err(AppError::AccountNotFound(account_id));
        }

        let balance = tx.balance_of(account_id).await?;
        check_loan(account_id, balance, amount_cents)?;
        check_credit(account_id, balance, amount_cents)?;

        let movement_id = append(tx, account_id, amount_cents, MovementKind::Loan).await?;
        Ok(LoanReceipt {
            account_id,
            amount_cents,
            movement_id,
        })
    }
}

/// Append a movement, reporting a missing account as `AccountNotFound`.
async fn append(
    tx: &mut LedgerTx<'_>,
    account_id: AccountId,
    amount_cents: Cents,
    kind: MovementKind,
) -> Result<MovementId, AppError> {
    tx.append_movement(account_id, amount_cents, kind)
        .await?
        .ok_or(AppError::AccountNotFound(account_id))
}

/// Roll back a failed unit of work. If the rollback itself fails the
/// connection still discards the transaction when it is dropped.
async fn discard(tx: LedgerTx<'_>) {
    if let Err(err) = tx.rollback().await {
        error!(error = %err, "rollback failed");
    }
}
