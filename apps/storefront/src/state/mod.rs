//! # State Module
//!
//! Application state shared by storefront commands.
//!
//! Each command takes only the state it needs:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │   DbState    │  │   SessionState   │  │   ConfigState    │          │
//! │  │              │  │                  │  │                  │          │
//! │  │  Database    │  │  Arc<Mutex<      │  │  strict mode     │          │
//! │  │  (SQLite     │  │    HashMap<Uuid, │  │  session limit   │          │
//! │  │   pool)      │  │    Session>>>    │  │                  │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • SessionState: Protected by Arc<Mutex<T>>, never held across .await  │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod session;

pub use config::ConfigState;
pub use db::DbState;
pub use session::{ConfigurationSession, SessionState};
