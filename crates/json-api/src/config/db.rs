//! Database Config

use std::time::Duration;

use clap::Args;
use trusioo_app::database::PoolSettings;

/// Database settings.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Upper bound of pooled connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 25)]
    pub max_connections: u32,

    /// Connections kept open while idle
    #[arg(long, env = "DB_MIN_CONNECTIONS", default_value_t = 5)]
    pub min_connections: u32,

    /// Maximum lifetime of a pooled connection, in seconds
    #[arg(long, env = "DB_MAX_LIFETIME_SECONDS", default_value_t = 3600)]
    pub max_lifetime_seconds: u64,
}

impl DatabaseConfig {
    #[must_use]
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            max_lifetime: Duration::from_secs(self.max_lifetime_seconds),
        }
    }
}
