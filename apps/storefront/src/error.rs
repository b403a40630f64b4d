//! # API Error Type
//!
//! Unified error type for storefront commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Forma                                  │
//! │                                                                         │
//! │  Command Function  ──  Result<T, ApiError>                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CoreError::ForbiddenCombination(type#4) ──┐                            │
//! │  CoreError::Incomplete { missing }  ───────┤                            │
//! │  DbError::QueryFailed("...") ──────────────┼──► ApiError ──► caller     │
//! │  ConfigError::InvalidValue("...") ─────────┘                            │
//! │                                                                         │
//! │  { "error": "ForbiddenCombination",                                     │
//! │    "detail": "Selection violates not-allowed combination type#4" }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Database failures that say nothing useful to a shopper are logged with
//! `tracing::error!` and returned with a generic detail.

use forma_core::CoreError;
use forma_db::DbError;
use serde::Serialize;

use crate::config::ConfigError;

/// API error returned from storefront commands.
///
/// ## Serialization
/// ```json
/// {
///   "error": "Incomplete",
///   "detail": "Selection is incomplete, missing attributes: [3]"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    /// Machine-readable error kind
    pub error: ErrorCode,

    /// Human-readable explanation
    pub detail: String,
}

/// Error kinds returned to the storefront UI and admin tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    /// Unknown product, product type, attribute, option or combination (404)
    NotFound,

    /// Availability requested for a deactivated attribute (400)
    InvalidAttribute,

    /// Selection names a deactivated or nonexistent attribute/option (400)
    UnknownSelection,

    /// Not every live attribute has a choice (422)
    Incomplete,

    /// Selection contains a whole not-allowed combination (422)
    ForbiddenCombination,

    /// Not-allowed combination rejected at definition time (400)
    InvalidRule,

    /// Input validation failed (400)
    ValidationError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(error: ErrorCode, detail: impl Into<String>) -> Self {
        ApiError {
            error,
            detail: detail.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(detail: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, detail)
    }

    /// Creates an internal error.
    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, detail)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::CorruptData(e) => {
                tracing::error!("Stored catalog is inconsistent: {}", e);
                ApiError::internal("Stored catalog is inconsistent")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let detail = err.to_string();
        let code = match err {
            CoreError::ProductTypeNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::AttributeNotFound(_)
            | CoreError::OptionNotFound { .. }
            | CoreError::CombinationNotFound(_) => ErrorCode::NotFound,
            CoreError::InvalidAttribute(_) => ErrorCode::InvalidAttribute,
            CoreError::UnknownSelection { .. } => ErrorCode::UnknownSelection,
            CoreError::Incomplete { .. } => ErrorCode::Incomplete,
            CoreError::ForbiddenCombination(_) => ErrorCode::ForbiddenCombination,
            CoreError::InvalidRule(_) => ErrorCode::InvalidRule,
            CoreError::NotCustomizable(_) | CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, detail)
    }
}

/// Converts configuration errors to API errors.
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.error, self.detail)
    }
}

impl std::error::Error for ApiError {}
