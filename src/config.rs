use std::net::SocketAddr;
use std::time::Duration;

use clap::Args;
use sqlx::sqlite::SqliteConnectOptions;

/// Storage settings, read from flags or the environment (a `.env` file is
/// loaded by the binary before parsing).
#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// Database file path
    #[arg(short, long, env = "BANKIST_DATABASE", default_value = "bankist.db")]
    pub database: String,

    /// How long a statement waits on a locked database before failing
    #[arg(long, env = "BANKIST_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    pub busy_timeout_ms: u64,

    /// Maximum pooled connections
    #[arg(long, env = "BANKIST_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            busy_timeout_ms: 5000,
            max_connections: 5,
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Connection options for the configured file. `create` allows a missing
    /// file to be created (used by `init`).
    pub fn connect_options(&self, create: bool) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.database)
            .create_if_missing(create)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "BANKIST_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,
}
