use serde::Deserialize;
use tracing::info;

use crate::domain::{Account, Cents, NewAccount, cents_from_json};

use super::{AppError, BankService};

/// One account in a seed file.
///
/// ```json
/// { "owner": "Jonas Schmedtmann", "pin": 1111, "interestRate": 1.2,
///   "movements": [200, 450, -400, "3000.00"] }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAccount {
    pub owner: String,
    pub pin: u16,
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default)]
    pub movements: Vec<serde_json::Value>,
}

impl SeedAccount {
    /// Opening movements in cents.
    pub fn opening_movements(&self) -> Result<Vec<Cents>, AppError> {
        self.movements
            .iter()
            .map(|value| {
                cents_from_json(value).map_err(|err| {
                    AppError::InvalidAmount(format!("{} in seed for {}: {}", value, self.owner, err))
                })
            })
            .collect()
    }
}

/// Parse the contents of a JSON seed file.
pub fn parse_seed(json: &str) -> Result<Vec<SeedAccount>, serde_json::Error> {
    serde_json::from_str(json)
}

impl BankService {
    /// Create every account of a seed file, each with its opening movements.
    /// Accounts are committed one by one; the first failure stops the run.
    pub async fn seed(&self, accounts: Vec<SeedAccount>) -> Result<Vec<Account>, AppError> {
        let mut created = Vec::with_capacity(accounts.len());
        for seed in accounts {
            let opening = seed.opening_movements()?;
            let account = NewAccount::new(seed.owner, seed.pin, seed.interest_rate);
            created.push(self.create_account(account, &opening).await?);
        }
        info!(count = created.len(), "seed loaded");
        Ok(created)
    }
}
