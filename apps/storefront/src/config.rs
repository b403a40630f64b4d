//! Storefront configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable | Default |
//! |---|---|
//! | `FORMA_DB_PATH` | `forma.db` |
//! | `FORMA_DB_MAX_CONNECTIONS` | `5` |
//! | `FORMA_RUN_MIGRATIONS` | `true` |
//! | `FORMA_LOG_FILTER` | `info,forma=debug,sqlx=warn` |
//! | `FORMA_STRICT_AVAILABILITY` | `false` |
//! | `FORMA_SESSION_LIMIT` | `1000` |
//! | `FORMA_SESSION_IDLE_SECS` | `1800` |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use forma_db::DbConfig;
use serde::Serialize;

/// Default tracing filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,forma=debug,sqlx=warn";

/// Storefront configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorefrontConfig {
    /// SQLite database file, or `:memory:`
    pub db_path: PathBuf,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Run embedded migrations on connect
    pub run_migrations: bool,

    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,

    /// Hide out-of-stock options from the availability endpoint
    pub strict_availability: bool,

    /// Maximum number of open configuration sessions
    pub session_limit: usize,

    /// Seconds of inactivity after which a session is discarded
    pub session_idle_secs: u64,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        StorefrontConfig {
            db_path: PathBuf::from("forma.db"),
            db_max_connections: 5,
            run_migrations: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            strict_availability: false,
            session_limit: 1000,
            session_idle_secs: 1800,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = StorefrontConfig::default();

        let config = StorefrontConfig {
            db_path: lookup("FORMA_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),

            db_max_connections: parse_var(&lookup, "FORMA_DB_MAX_CONNECTIONS")?
                .unwrap_or(defaults.db_max_connections),

            run_migrations: parse_var(&lookup, "FORMA_RUN_MIGRATIONS")?
                .unwrap_or(defaults.run_migrations),

            log_filter: lookup("FORMA_LOG_FILTER").unwrap_or(defaults.log_filter),

            strict_availability: parse_var(&lookup, "FORMA_STRICT_AVAILABILITY")?
                .unwrap_or(defaults.strict_availability),

            session_limit: parse_var(&lookup, "FORMA_SESSION_LIMIT")?
                .unwrap_or(defaults.session_limit),

            session_idle_secs: parse_var(&lookup, "FORMA_SESSION_IDLE_SECS")?
                .unwrap_or(defaults.session_idle_secs),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "FORMA_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        if self.session_limit == 0 {
            return Err(ConfigError::InvalidValue("FORMA_SESSION_LIMIT".to_string()));
        }

        if self.session_idle_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "FORMA_SESSION_IDLE_SECS".to_string(),
            ));
        }

        Ok(())
    }

    /// Pool configuration for [`forma_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        let config = if self.db_path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.db_path).max_connections(self.db_max_connections)
        };
        config.run_migrations(self.run_migrations)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(name.to_string()))
        })
        .transpose()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}
