// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use bankist::application::{BankService, parse_seed};
use bankist::config::DatabaseConfig;
use bankist::domain::{Account, Cents, NewAccount};
use tempfile::TempDir;

/// The demo accounts shipped in `data/accounts.json`
pub const DEMO_SEED: &str = include_str!("../../data/accounts.json");

/// Database settings for a file inside `temp_dir`
pub fn test_config(temp_dir: &TempDir) -> DatabaseConfig {
    let db_path = temp_dir.path().join("test.db");
    DatabaseConfig::new(db_path.to_str().unwrap())
}

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(BankService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = BankService::init(&test_config(&temp_dir)).await?;
    Ok((service, temp_dir))
}

/// Open an account with the given opening movements (in cents)
pub async fn open_account(
    service: &BankService,
    owner: &str,
    pin: u16,
    opening: &[Cents],
) -> Result<Account> {
    let account = service
        .create_account(NewAccount::new(owner, pin, 1.2), opening)
        .await?;
    Ok(account)
}

/// Test fixture: account A holding 100.00 and account B holding 50.00
pub struct TwoAccounts {
    pub a: Account,
    pub b: Account,
}

impl TwoAccounts {
    pub async fn create(service: &BankService) -> Result<Self> {
        let a = open_account(service, "Alice Anders", 1111, &[10000]).await?;
        let b = open_account(service, "Bob Brown", 2222, &[5000]).await?;
        Ok(Self { a, b })
    }
}

/// Load the demo accounts
pub async fn seed_demo(service: &BankService) -> Result<Vec<Account>> {
    Ok(service.seed(parse_seed(DEMO_SEED)?).await?)
}

/// Balance recomputed from the stored movements, independent of SQL sums
pub async fn folded_balance(service: &BankService, account: &Account) -> Result<Cents> {
    let movements = service.movements_of(account.id).await?;
    Ok(bankist::domain::compute_balance(&movements))
}
