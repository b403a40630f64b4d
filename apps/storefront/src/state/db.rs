//! # Database State
//!
//! Wraps the `Database` connection for use in storefront commands.
//!
//! The `Database` struct from `forma-db` contains a `SqlitePool`, so
//! commands can run queries concurrently without explicit locking.

use forma_db::Database;

/// Wrapper around `Database` for command state.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database connection.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let product = db_state.inner().products().get_by_id(&id).await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
