//! # Product Type Repository
//!
//! Database operations for product types: their attributes, options and
//! shared not-allowed combinations.
//!
//! ## Loading a Snapshot
//! ```text
//! product_types ──► attributes ──► attribute_options      (ORDER BY id)
//!       │
//!       └──► not_allowed_combinations ──► combination_pairs (ORDER BY id)
//!                           │
//!                           ▼
//!               forma_core::ProductType (immutable)
//! ```
//!
//! Ids are AUTOINCREMENT, so ordering by id is definition order.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use forma_core::{
    Attribute, AttributeOption, Customisation, NewAttribute, NotAllowedCombination, OptionRef,
    ProductType, ProductTypeSummary,
};

use crate::error::{DbError, DbResult};
use crate::repository::{fetch_rules, insert_rule, transaction_failed, RuleOwner};

/// Input for [`ProductTypeRepository::create`].
#[derive(Debug, Clone)]
pub struct NewProductType {
    pub name: String,
    pub customisation: Customisation,
}

#[derive(Debug, sqlx::FromRow)]
struct AttributeOptionRow {
    attribute_id: i64,
    attribute_name: String,
    option_id: i64,
    option_name: String,
}

/// Repository for product type database operations.
#[derive(Debug, Clone)]
pub struct ProductTypeRepository {
    pool: SqlitePool,
}

impl ProductTypeRepository {
    /// Creates a new ProductTypeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductTypeRepository { pool }
    }

    /// Inserts a product type with a fresh UUID.
    pub async fn create(&self, input: &NewProductType) -> DbResult<ProductTypeSummary> {
        let summary = ProductTypeSummary {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            customisation: input.customisation,
            created_at: Utc::now(),
        };

        debug!(id = %summary.id, name = %summary.name, "Inserting product type");

        sqlx::query(
            "INSERT INTO product_types (id, name, customisation, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&summary.id)
        .bind(&summary.name)
        .bind(summary.customisation)
        .bind(summary.created_at)
        .execute(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Lists product types by name.
    pub async fn list(&self) -> DbResult<Vec<ProductTypeSummary>> {
        let types = sqlx::query_as::<_, ProductTypeSummary>(
            "SELECT id, name, customisation, created_at FROM product_types ORDER BY name, created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = types.len(), "Listed product types");
        Ok(types)
    }

    /// Loads a full product type snapshot: attributes, options and rules.
    ///
    /// ## Returns
    /// * `Ok(Some(ProductType))` - Product type found
    /// * `Ok(None)` - Product type not found
    pub async fn get(&self, id: &str) -> DbResult<Option<ProductType>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product_type(&mut conn, id).await
    }

    /// Appends attributes with their options, in input order, in one
    /// transaction.
    ///
    /// ## Returns
    /// The stored attributes with their assigned ids.
    pub async fn add_attributes(
        &self,
        product_type_id: &str,
        attributes: &[NewAttribute],
    ) -> DbResult<Vec<Attribute>> {
        debug!(id = %product_type_id, count = attributes.len(), "Adding attributes");

        let mut tx = self.pool.begin().await.map_err(transaction_failed)?;
        let mut stored = Vec::with_capacity(attributes.len());

        for input in attributes {
            let name = input.attribute_name.trim().to_string();
            let attribute_id: i64 = sqlx::query_scalar(
                "INSERT INTO attributes (product_type_id, name) VALUES (?1, ?2) RETURNING id",
            )
            .bind(product_type_id)
            .bind(&name)
            .fetch_one(&mut *tx)
            .await?;

            let mut options = Vec::with_capacity(input.possible_options.len());
            for option in &input.possible_options {
                let option_name = option.trim().to_string();
                let option_id: i64 = sqlx::query_scalar(
                    "INSERT INTO attribute_options (attribute_id, name) VALUES (?1, ?2) RETURNING id",
                )
                .bind(attribute_id)
                .bind(&option_name)
                .fetch_one(&mut *tx)
                .await?;

                options.push(AttributeOption {
                    id: option_id,
                    name: option_name,
                });
            }

            stored.push(Attribute {
                id: attribute_id,
                name,
                options,
            });
        }

        tx.commit().await.map_err(transaction_failed)?;
        Ok(stored)
    }

    /// Appends shared rules in one transaction: all are stored or none.
    pub async fn add_not_allowed_combinations(
        &self,
        product_type_id: &str,
        combinations: &[Vec<OptionRef>],
    ) -> DbResult<Vec<NotAllowedCombination>> {
        debug!(id = %product_type_id, count = combinations.len(), "Adding not-allowed combinations");

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(transaction_failed)?;
        let mut stored = Vec::with_capacity(combinations.len());

        for pairs in combinations {
            let rule =
                insert_rule(&mut tx, RuleOwner::ProductType(product_type_id), pairs, now).await?;
            stored.push(rule);
        }

        tx.commit().await.map_err(transaction_failed)?;
        Ok(stored)
    }

    /// Shared rules of a product type, in definition order.
    pub async fn rules_for(&self, product_type_id: &str) -> DbResult<Vec<NotAllowedCombination>> {
        let mut conn = self.pool.acquire().await?;
        fetch_rules(&mut conn, RuleOwner::ProductType(product_type_id)).await
    }

    /// Deletes a product type; attributes, rules and products cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product type");

        let result = sqlx::query("DELETE FROM product_types WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ProductType", id));
        }
        Ok(())
    }

    /// Counts product types (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_types")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Loads a product type snapshot on the caller's connection.
pub(crate) async fn fetch_product_type(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<ProductType>> {
    debug!(id = %id, "Loading product type");

    let summary = sqlx::query_as::<_, ProductTypeSummary>(
        "SELECT id, name, customisation, created_at FROM product_types WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(summary) = summary else {
        return Ok(None);
    };

    let mut product_type = ProductType::new(summary.id, summary.name, summary.customisation);
    product_type.attributes = fetch_attributes(conn, id).await?;
    product_type.not_allowed_combinations = fetch_rules(conn, RuleOwner::ProductType(id)).await?;

    debug!(
        id = %id,
        attributes = product_type.attributes.len(),
        rules = product_type.not_allowed_combinations.len(),
        "Loaded product type"
    );
    Ok(Some(product_type))
}

async fn fetch_attributes(conn: &mut SqliteConnection, product_type_id: &str) -> DbResult<Vec<Attribute>> {
    let rows: Vec<AttributeOptionRow> = sqlx::query_as(
        r#"
        SELECT
            a.id   AS attribute_id,
            a.name AS attribute_name,
            o.id   AS option_id,
            o.name AS option_name
        FROM attributes a
        INNER JOIN attribute_options o ON o.attribute_id = a.id
        WHERE a.product_type_id = ?1
        ORDER BY a.id, o.id
        "#,
    )
    .bind(product_type_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut attributes: Vec<Attribute> = Vec::new();
    for row in rows {
        let option = AttributeOption {
            id: row.option_id,
            name: row.option_name,
        };
        match attributes.last_mut() {
            Some(attribute) if attribute.id == row.attribute_id => attribute.options.push(option),
            _ => attributes.push(Attribute {
                id: row.attribute_id,
                name: row.attribute_name,
                options: vec![option],
            }),
        }
    }

    Ok(attributes)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_attribute(name: &str, options: &[&str]) -> NewAttribute {
        NewAttribute {
            attribute_name: name.to_string(),
            possible_options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let db = db().await;
        let repo = db.product_types();

        let created = repo
            .create(&NewProductType {
                name: " Bicycle ".to_string(),
                customisation: Customisation::FullyCustomizable,
            })
            .await
            .unwrap();
        assert_eq!(created.name, "Bicycle");

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
        assert_eq!(listed[0].customisation, Customisation::FullyCustomizable);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_keeps_definition_order() {
        let db = db().await;
        let repo = db.product_types();
        let pt = repo
            .create(&NewProductType {
                name: "Bicycle".to_string(),
                customisation: Customisation::FullyCustomizable,
            })
            .await
            .unwrap();

        let stored = repo
            .add_attributes(
                &pt.id,
                &[
                    new_attribute("Frame", &["Full suspension", "Diamond", "Step-through"]),
                    new_attribute("Wheels", &["Road", "Mountain"]),
                ],
            )
            .await
            .unwrap();
        let frame = &stored[0];
        let wheels = &stored[1];

        let rules = repo
            .add_not_allowed_combinations(
                &pt.id,
                &[vec![
                    OptionRef::new(wheels.id, wheels.options[1].id),
                    OptionRef::new(frame.id, frame.options[1].id),
                ]],
            )
            .await
            .unwrap();
        assert_eq!(rules.len(), 1);

        let loaded = repo.get(&pt.id).await.unwrap().unwrap();
        let names: Vec<_> = loaded.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Frame", "Wheels"]);
        let options: Vec<_> = loaded.attributes[0]
            .options
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(options, vec!["Full suspension", "Diamond", "Step-through"]);

        assert_eq!(loaded.not_allowed_combinations, rules);
        assert_eq!(repo.rules_for(&pt.id).await.unwrap(), rules);
    }

    #[tokio::test]
    async fn test_missing_product_type() {
        let db = db().await;
        let repo = db.product_types();

        assert!(repo.get("nope").await.unwrap().is_none());
        assert!(matches!(
            repo.delete("nope").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_combination_batch_is_all_or_nothing() {
        let db = db().await;
        let repo = db.product_types();
        let pt = repo
            .create(&NewProductType {
                name: "Shirt".to_string(),
                customisation: Customisation::FullyCustomizable,
            })
            .await
            .unwrap();
        let stored = repo
            .add_attributes(
                &pt.id,
                &[
                    new_attribute("Color", &["Red", "Blue"]),
                    new_attribute("Size", &["S", "M"]),
                ],
            )
            .await
            .unwrap();
        let good = vec![
            OptionRef::new(stored[0].id, stored[0].options[0].id),
            OptionRef::new(stored[1].id, stored[1].options[0].id),
        ];
        let dangling = vec![OptionRef::new(stored[0].id, 9_999), OptionRef::new(9_998, 1)];

        let result = repo
            .add_not_allowed_combinations(&pt.id, &[good, dangling])
            .await;
        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));
        assert!(repo.rules_for(&pt.id).await.unwrap().is_empty());
    }
}
