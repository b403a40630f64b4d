//! # Forma Storefront Library
//!
//! Application layer for Forma: command functions for the storefront UI and
//! admin tools, on top of `forma-core` (decisions) and `forma-db` (storage).
//! HTTP routing is left to the embedding server; commands take their state
//! explicitly and return `Result<T, ApiError>`.
//!
//! ## Module Organization
//! ```text
//! forma_storefront/
//! ├── lib.rs          ◄─── You are here (bootstrap)
//! ├── config.rs       ◄─── Environment configuration
//! ├── telemetry.rs    ◄─── Tracing subscriber setup
//! ├── error.rs        ◄─── API error type for commands
//! ├── invoke.rs       ◄─── Command name → command function dispatch
//! ├── state/
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── config.rs   ◄─── Read-only behaviour switches
//! │   └── session.rs  ◄─── Configuration sessions
//! └── commands/
//!     ├── catalog.rs  ◄─── Product types, attributes, rules
//!     ├── product.rs  ◄─── Products with overrides
//!     ├── configure.rs◄─── Availability + add to configuration
//!     └── session.rs  ◄─── Session-based configuration
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod invoke;
pub mod state;
pub mod telemetry;

use forma_db::Database;
use tracing::info;

use config::StorefrontConfig;
use error::ApiError;
pub use invoke::Invocation;
use state::{ConfigState, DbState, SessionState};

/// Everything a command may need, built once at startup.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. StorefrontConfig::load()     (FORMA_* environment variables)        │
/// │  2. telemetry::init_tracing()    (RUST_LOG or FORMA_LOG_FILTER)         │
/// │  3. Database::new()              (SQLite, WAL, migrations)              │
/// │  4. DbState / ConfigState / SessionState                                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone)]
pub struct Storefront {
    pub db: DbState,
    pub config: ConfigState,
    pub sessions: SessionState,
}

impl Storefront {
    /// Connects to the database and initializes state.
    pub async fn start(config: &StorefrontConfig) -> Result<Self, ApiError> {
        info!(db_path = %config.db_path.display(), "Starting Forma storefront");

        let db = Database::new(config.db_config()).await?;
        info!("Database connected");

        let config_state = ConfigState::from_config(config);
        Ok(Storefront {
            db: DbState::new(db),
            sessions: SessionState::new(config_state.session_limit)
                .idle_timeout(config_state.session_idle_timeout()),
            config: config_state,
        })
    }

    /// Closes the connection pool.
    pub async fn shutdown(&self) {
        info!(open_sessions = self.sessions.len(), "Shutting down storefront");
        self.db.inner().close().await;
    }
}
