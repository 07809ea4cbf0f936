use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::application::{BankService, parse_seed};
use crate::config::{DatabaseConfig, ServerConfig};
use crate::domain::{format_cents, parse_cents};
use crate::http::{AppState, create_router};

/// Bankist - accounts, movements, transfers and loans
#[derive(Parser)]
#[command(name = "bankist")]
#[command(about = "A small banking ledger served over HTTP")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Load accounts and their opening movements from a JSON file
    Seed {
        /// Seed file path
        file: String,
    },

    /// Serve the HTTP API
    Serve {
        #[command(flatten)]
        server: ServerConfig,
    },

    /// List accounts with their balances
    Accounts,

    /// Show an account's movements and summary
    Movements {
        /// Account id or username
        account: String,
    },

    /// Transfer money between two accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Sender account id or username
        #[arg(long)]
        from: String,

        /// Receiver account id or username
        #[arg(long)]
        to: String,
    },

    /// Request a loan (at most 10% of the current balance)
    Loan {
        /// Amount to borrow
        amount: String,

        /// Account id or username
        #[arg(long)]
        account: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                BankService::init(&self.database).await?;
                println!("Database initialized: {}", self.database.database);
            }

            Commands::Seed { file } => {
                let service = BankService::init(&self.database).await?;
                let json = std::fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read seed file {}", file))?;
                let seed = parse_seed(&json).with_context(|| format!("Invalid seed file {}", file))?;

                for account in service.seed(seed).await? {
                    println!(
                        "Created account {} ({}) for {} with balance {}",
                        account.id,
                        account.username,
                        account.owner,
                        format_cents(account.balance)
                    );
                }
            }

            Commands::Serve { server } => {
                let service = BankService::init(&self.database).await?;
                let app = create_router(AppState::new(service));

                let listener = tokio::net::TcpListener::bind(server.bind)
                    .await
                    .with_context(|| format!("Failed to bind {}", server.bind))?;
                info!(address = %server.bind, database = %self.database.database, "server listening");

                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown_signal())
                    .await
                    .context("Server error")?;
            }

            Commands::Accounts => {
                let service = BankService::connect(&self.database).await?;
                run_accounts_command(&service).await?;
            }

            Commands::Movements { account } => {
                let service = BankService::connect(&self.database).await?;
                run_movements_command(&service, &account).await?;
            }

            Commands::Transfer { amount, from, to } => {
                let service = BankService::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let sender = service.resolve_account(&from).await?;
                let receiver = service.resolve_account(&to).await?;
                let receipt = service
                    .transfer(sender.id, receiver.id, amount_cents)
                    .await?;

                println!(
                    "Transferred {} {} -> {} (movements {}, {})",
                    format_cents(receipt.amount_cents),
                    sender.username,
                    receiver.username,
                    receipt.debit_movement_id,
                    receipt.credit_movement_id
                );
            }

            Commands::Loan { amount, account } => {
                let service = BankService::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let account = service.resolve_account(&account).await?;
                let receipt = service.request_loan(account.id, amount_cents).await?;

                println!(
                    "Loan of {} granted to {} (movement {})",
                    format_cents(receipt.amount_cents),
                    account.username,
                    receipt.movement_id
                );
            }
        }

        Ok(())
    }
}

async fn run_accounts_command(service: &BankService) -> Result<()> {
    let accounts = service.list_accounts().await?;
    if accounts.is_empty() {
        println!("No accounts found.");
        return Ok(());
    }

    println!(
        "{:<6} {:<28} {:<10} {:>8} {:>14}",
        "ID", "OWNER", "USERNAME", "RATE", "BALANCE"
    );
    println!("{}", "-".repeat(70));
    for account in accounts {
        println!(
            "{:<6} {:<28} {:<10} {:>7}% {:>14}",
            account.id,
            account.owner,
            account.username,
            account.interest_rate,
            format_cents(account.balance)
        );
    }
    Ok(())
}

async fn run_movements_command(service: &BankService, key: &str) -> Result<()> {
    let account = service.resolve_account(key).await?;
    let statement = service.statement(account.id).await?;

    println!("Account: {} ({})", statement.account.owner, statement.account.username);
    println!();

    if statement.movements.is_empty() {
        println!("No movements.");
    } else {
        println!("{:<4} {:<12} {:<14} {:>14}", "#", "TYPE", "KIND", "AMOUNT");
        println!("{}", "-".repeat(47));
        for (i, movement) in statement.movements.iter().enumerate() {
            println!(
                "{:<4} {:<12} {:<14} {:>14}",
                i + 1,
                movement.direction().to_string(),
                movement.kind.as_str(),
                format_cents(movement.amount_cents)
            );
        }
    }

    let summary = statement.summary;
    println!();
    println!("  Balance:   {:>14}", format_cents(summary.balance));
    println!("  In:        {:>14}", format_cents(summary.incomes));
    println!("  Out:       {:>14}", format_cents(summary.outgoings));
    println!("  Interest:  {:>14}", format_cents(summary.interest));
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
