use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tokio::sync::{Mutex, MutexGuard};

use crate::config::DatabaseConfig;
use crate::domain::{
    Account, AccountId, Cents, Movement, MovementId, MovementKind, NewAccount,
};

use super::MIGRATION_001_INITIAL;

const ACCOUNT_COLUMNS: &str = r#"
    a.id, a.owner, a.username, a.pin, a.interest_rate,
    COALESCE((SELECT SUM(m.amount_cents) FROM movements m WHERE m.account_id = a.id), 0) AS balance
"#;

/// Repository for persisting and querying accounts and their movements.
///
/// Reads go straight to the pool. Every write goes through a [`LedgerTx`],
/// which serialises writers in this process and wraps them in one database
/// transaction.
pub struct Repository {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
        }
    }

    /// Connect to the configured SQLite database.
    /// With `create`, a missing database file is created.
    pub async fn connect(config: &DatabaseConfig, create: bool) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.busy_timeout())
            .connect_with(config.connect_options(create))
            .await
            .with_context(|| format!("Failed to connect to database {}", config.database))?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(config: &DatabaseConfig) -> Result<Self> {
        let repo = Self::connect(config, true).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check that the database answers.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database did not answer")?;
        Ok(())
    }

    /// Open a ledger transaction. Waits for any other writer in this process
    /// to finish first.
    pub async fn begin(&self) -> Result<LedgerTx<'_>> {
        let guard = self.write_lock.lock().await;
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;
        Ok(LedgerTx { tx, _guard: guard })
    }

    // ========================
    // Account operations
    // ========================

    /// List all accounts with their current balances, ordered by id.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts a ORDER BY a.id"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(row_to_account).collect()
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts a WHERE a.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Get an account by its derived username.
    pub async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts a WHERE a.username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by username")?;

        row.as_ref().map(row_to_account).transpose()
    }

    // ========================
    // Movement operations
    // ========================

    /// List an account's movements in insertion order.
    pub async fn list_movements(&self, account_id: AccountId) -> Result<Vec<Movement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, amount_cents, kind, recorded_at
            FROM movements
            WHERE account_id = ?
            ORDER BY id
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list movements")?;

        rows.iter().map(row_to_movement).collect()
    }

    /// Compute an account's balance using SQL aggregation.
    pub async fn compute_balance(&self, account_id: AccountId) -> Result<Cents> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount_cents), 0) AS balance FROM movements WHERE account_id = ?",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute balance")?;

        Ok(row.get("balance"))
    }
}

/// A scoped unit of ledger writes.
///
/// Nothing written through it is visible until [`LedgerTx::commit`]. Calling
/// [`LedgerTx::rollback`], or dropping the handle, discards every write.
pub struct LedgerTx<'a> {
    // Declared before the guard: the transaction is released first.
    tx: Transaction<'static, Sqlite>,
    _guard: MutexGuard<'a, ()>,
}

impl LedgerTx<'_> {
    pub async fn account_exists(&mut self, id: AccountId) -> Result<bool> {
        let row = sqlx::query("SELECT EXISTS (SELECT 1 FROM accounts WHERE id = ?) AS found")
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await
            .context("Failed to look up account")?;
        Ok(row.get::<i64, _>("found") != 0)
    }

    pub async fn username_exists(&mut self, username: &str) -> Result<bool> {
        let row =
            sqlx::query("SELECT EXISTS (SELECT 1 FROM accounts WHERE username = ?) AS found")
                .bind(username)
                .fetch_one(&mut *self.tx)
                .await
                .context("Failed to look up username")?;
        Ok(row.get::<i64, _>("found") != 0)
    }

    /// Balance as seen inside this transaction.
    pub async fn balance_of(&mut self, account_id: AccountId) -> Result<Cents> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount_cents), 0) AS balance FROM movements WHERE account_id = ?",
        )
        .bind(account_id)
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to compute balance")?;
        Ok(row.get("balance"))
    }

    /// Insert an account row, deriving its username. Returns the new id.
    pub async fn insert_account(&mut self, account: &NewAccount) -> Result<AccountId> {
        let row = sqlx::query(
            r#"
            INSERT INTO accounts (owner, username, pin, interest_rate)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&account.owner)
        .bind(account.username())
        .bind(i64::from(account.pin))
        .bind(account.interest_rate)
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to save account")?;
        Ok(row.get("id"))
    }

    /// Append one movement to an account's ledger.
    /// Returns `None` when the account does not exist; nothing is written then.
    pub async fn append_movement(
        &mut self,
        account_id: AccountId,
        amount_cents: Cents,
        kind: MovementKind,
    ) -> Result<Option<MovementId>> {
        let row = sqlx::query(
            r#"
            INSERT INTO movements (account_id, amount_cents, kind, recorded_at)
            SELECT ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM accounts WHERE id = ?)
            RETURNING id
            "#,
        )
        .bind(account_id)
        .bind(amount_cents)
        .bind(kind.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(account_id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to append movement")?;

        Ok(row.map(|row| row.get("id")))
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await.context("Failed to commit transaction")
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back transaction")
    }
}

fn row_to_account(row: &SqliteRow) -> Result<Account> {
    let pin: i64 = row.get("pin");
    Ok(Account {
        id: row.get("id"),
        owner: row.get("owner"),
        username: row.get("username"),
        pin: u16::try_from(pin).with_context(|| format!("Invalid stored PIN: {}", pin))?,
        interest_rate: row.get("interest_rate"),
        balance: row.get("balance"),
    })
}

fn row_to_movement(row: &SqliteRow) -> Result<Movement> {
    let kind_str: String = row.get("kind");
    let recorded_at_str: String = row.get("recorded_at");

    Ok(Movement {
        id: row.get("id"),
        account_id: row.get("account_id"),
        amount_cents: row.get("amount_cents"),
        kind: MovementKind::from_str(&kind_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid movement kind: {}", kind_str))?,
        recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
            .context("Invalid recorded_at timestamp")?
            .with_timezone(&Utc),
    })
}
