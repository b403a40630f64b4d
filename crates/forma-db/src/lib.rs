//! # forma-db: Database Layer for Forma
//!
//! The catalog provider. Persists product types, products and overrides in
//! SQLite and loads them back as forma-core snapshots.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Forma Data Flow                                  │
//! │                                                                         │
//! │  Storefront command (available_options)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     forma-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ ProductTypeRepo │   │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │ ProductRepo     │   │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ProductType + ProductOverride  ──►  forma-core resolver / validator   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product type and product repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forma_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("forma.db")).await?;
//!
//! let product = db.products().get_by_id(&id).await?;
//! let product_type = db.product_types().get(&product.product_type_id).await?;
//! let overrides = db.products().get_override(&product.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::product::{NewProduct, ProductRecord, ProductRepository};
pub use repository::product_type::{NewProductType, ProductTypeRepository};
