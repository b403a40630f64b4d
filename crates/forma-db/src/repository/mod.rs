//! # Repository Module
//!
//! Database repository implementations for Forma.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Storefront command                                                     │
//! │       │                                                                 │
//! │       │  db.product_types().get(id)                                    │
//! │       ▼                                                                 │
//! │  ProductTypeRepository                 ProductRepository               │
//! │  ├── create / list / get               ├── create (with override)      │
//! │  ├── add_attributes                    ├── get_by_id / list            │
//! │  ├── add_not_allowed_combinations      ├── get_override                │
//! │  └── rules_for                         ├── load_snapshot (one read tx) │
//! │                                        └── delete                      │
//! │       │                                        │                        │
//! │       └──────────────── SQL ───────────────────┘                        │
//! │                          ▼                                              │
//! │                   SQLite Database                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories persist what they are given. Catalog invariants (rule
//! shape, ids belonging to the product type) are checked by forma-core
//! before a write reaches this layer.
//!
//! ## Available Repositories
//!
//! - [`ProductTypeRepository`](product_type::ProductTypeRepository) - Catalog and shared rules
//! - [`ProductRepository`](product::ProductRepository) - Products and overrides

pub mod product;
pub mod product_type;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use forma_core::{CombinationId, NotAllowedCombination, OptionRef};

use crate::error::{DbError, DbResult};

/// Which layer a not-allowed combination belongs to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RuleOwner<'a> {
    ProductType(&'a str),
    Product(&'a str),
}

impl RuleOwner<'_> {
    fn id(&self) -> &str {
        match self {
            RuleOwner::ProductType(id) | RuleOwner::Product(id) => id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PairRow {
    combination_id: i64,
    attribute_id: i64,
    option_id: i64,
}

/// Loads the rules of one owner, in definition order.
pub(crate) async fn fetch_rules(
    conn: &mut SqliteConnection,
    owner: RuleOwner<'_>,
) -> DbResult<Vec<NotAllowedCombination>> {
    let sql = match owner {
        RuleOwner::ProductType(_) => {
            r#"
            SELECT p.combination_id, p.attribute_id, p.option_id
            FROM not_allowed_combinations c
            INNER JOIN combination_pairs p ON p.combination_id = c.id
            WHERE c.product_type_id = ?1
            ORDER BY c.id, p.attribute_id
            "#
        }
        RuleOwner::Product(_) => {
            r#"
            SELECT p.combination_id, p.attribute_id, p.option_id
            FROM not_allowed_combinations c
            INNER JOIN combination_pairs p ON p.combination_id = c.id
            WHERE c.product_id = ?1
            ORDER BY c.id, p.attribute_id
            "#
        }
    };

    let rows: Vec<PairRow> = sqlx::query_as(sql)
        .bind(owner.id())
        .fetch_all(&mut *conn)
        .await?;

    let mut grouped: Vec<(CombinationId, Vec<OptionRef>)> = Vec::new();
    for row in rows {
        let pair = OptionRef::new(row.attribute_id, row.option_id);
        match grouped.last_mut() {
            Some((id, pairs)) if *id == row.combination_id => pairs.push(pair),
            _ => grouped.push((row.combination_id, vec![pair])),
        }
    }

    grouped
        .into_iter()
        .map(|(id, pairs)| {
            NotAllowedCombination::new(id, pairs)
                .map_err(|e| DbError::CorruptData(format!("combination {id}: {e}")))
        })
        .collect()
}

/// Inserts one rule and its pairs, returning the assigned id.
///
/// Runs on the caller's connection so a batch shares one transaction.
pub(crate) async fn insert_rule(
    conn: &mut SqliteConnection,
    owner: RuleOwner<'_>,
    pairs: &[OptionRef],
    now: DateTime<Utc>,
) -> DbResult<NotAllowedCombination> {
    let (product_type_id, product_id) = match owner {
        RuleOwner::ProductType(id) => (Some(id), None),
        RuleOwner::Product(id) => (None, Some(id)),
    };

    let combination_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO not_allowed_combinations (product_type_id, product_id, created_at)
        VALUES (?1, ?2, ?3)
        RETURNING id
        "#,
    )
    .bind(product_type_id)
    .bind(product_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    for pair in pairs {
        sqlx::query(
            "INSERT INTO combination_pairs (combination_id, attribute_id, option_id) VALUES (?1, ?2, ?3)",
        )
        .bind(combination_id)
        .bind(pair.attribute_id)
        .bind(pair.option_id)
        .execute(&mut *conn)
        .await?;
    }

    NotAllowedCombination::new(combination_id, pairs.to_vec())
        .map_err(|e| DbError::CorruptData(format!("combination {combination_id}: {e}")))
}

/// Maps a failed `begin` into the transaction error variant.
pub(crate) fn transaction_failed(err: sqlx::Error) -> DbError {
    DbError::TransactionFailed(err.to_string())
}
