//! # Product Repository
//!
//! Database operations for products and their overrides.
//!
//! ## Override Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductOverride field               Table                              │
//! │  ───────────────────────────────     ─────────────────────────────────  │
//! │  deactivated_attributes              product_deactivated_attributes     │
//! │  deactivated_options                 product_deactivated_options        │
//! │  out_of_stock_options                product_out_of_stock_options       │
//! │  deactivated_combinations            product_deactivated_combinations   │
//! │  additional_not_allowed_combinations not_allowed_combinations           │
//! │                                      (product_id set) + pairs           │
//! │                                                                         │
//! │  All rows cascade when the product is deleted.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use forma_core::{
    CombinationId, OptionRef, Product, ProductOverride, ProductSummary, ProductType,
};

use crate::error::{DbError, DbResult};
use crate::repository::product_type::fetch_product_type;
use crate::repository::{fetch_rules, insert_rule, transaction_failed, RuleOwner};

/// Input for [`ProductRepository::create`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_type_id: String,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
}

/// A product with everything needed to configure it, read together.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub product: Product,
    pub product_type: ProductType,
    pub overrides: ProductOverride,
}

#[derive(Debug, sqlx::FromRow)]
struct PairRow {
    attribute_id: i64,
    option_id: i64,
}

impl From<PairRow> for OptionRef {
    fn from(row: PairRow) -> Self {
        OptionRef::new(row.attribute_id, row.option_id)
    }
}

const PRODUCT_COLUMNS: &str =
    "id, product_type_id, name, sku, description, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product and its override in one transaction.
    ///
    /// Ids on `overrides.additional_not_allowed_combinations` are ignored;
    /// the returned override carries the ids assigned on insert.
    ///
    /// ## Returns
    /// * `Ok((Product, ProductOverride))` - Stored product and override
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown product type or ids
    pub async fn create(
        &self,
        input: &NewProduct,
        overrides: &ProductOverride,
    ) -> DbResult<(Product, ProductOverride)> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            product_type_id: input.product_type_id.clone(),
            name: input.name.trim().to_string(),
            sku: input.sku.trim().to_string(),
            description: input
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        debug!(sku = %product.sku, product_type_id = %product.product_type_id, "Inserting product");

        let mut tx = self.pool.begin().await.map_err(transaction_failed)?;

        sqlx::query(
            r#"
            INSERT INTO products (id, product_type_id, name, sku, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.product_type_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("sku", &product.sku),
            other => other,
        })?;

        for attribute_id in &overrides.deactivated_attributes {
            sqlx::query(
                "INSERT INTO product_deactivated_attributes (product_id, attribute_id) VALUES (?1, ?2)",
            )
            .bind(&product.id)
            .bind(attribute_id)
            .execute(&mut *tx)
            .await?;
        }

        for pair in &overrides.deactivated_options {
            sqlx::query(
                "INSERT INTO product_deactivated_options (product_id, attribute_id, option_id) VALUES (?1, ?2, ?3)",
            )
            .bind(&product.id)
            .bind(pair.attribute_id)
            .bind(pair.option_id)
            .execute(&mut *tx)
            .await?;
        }

        for pair in &overrides.out_of_stock_options {
            sqlx::query(
                "INSERT INTO product_out_of_stock_options (product_id, attribute_id, option_id) VALUES (?1, ?2, ?3)",
            )
            .bind(&product.id)
            .bind(pair.attribute_id)
            .bind(pair.option_id)
            .execute(&mut *tx)
            .await?;
        }

        for combination_id in &overrides.deactivated_combinations {
            sqlx::query(
                "INSERT INTO product_deactivated_combinations (product_id, combination_id) VALUES (?1, ?2)",
            )
            .bind(&product.id)
            .bind(combination_id)
            .execute(&mut *tx)
            .await?;
        }

        let mut stored = ProductOverride {
            additional_not_allowed_combinations: Vec::with_capacity(
                overrides.additional_not_allowed_combinations.len(),
            ),
            ..overrides.clone()
        };
        for rule in &overrides.additional_not_allowed_combinations {
            let rule = insert_rule(&mut tx, RuleOwner::Product(&product.id), rule.pairs(), now).await?;
            stored.additional_not_allowed_combinations.push(rule);
        }

        tx.commit().await.map_err(transaction_failed)?;

        debug!(id = %product.id, "Product inserted");
        Ok((product, stored))
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products by name with their product type's name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<ProductSummary>> {
        let products = sqlx::query_as::<_, ProductSummary>(
            r#"
            SELECT
                p.id,
                p.name,
                p.sku,
                p.product_type_id,
                t.name AS product_type_name
            FROM products p
            INNER JOIN product_types t ON t.id = p.product_type_id
            ORDER BY p.name, p.sku
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), limit, "Listed products");
        Ok(products)
    }

    /// Loads the override of a product.
    ///
    /// A product without override rows gets an empty override; existence of
    /// the product itself is the caller's check.
    pub async fn get_override(&self, product_id: &str) -> DbResult<ProductOverride> {
        let mut conn = self.pool.acquire().await?;
        fetch_override(&mut conn, product_id).await
    }

    /// Loads a product, its product type and its override inside one read
    /// transaction, so all three come from the same database state.
    ///
    /// ## Returns
    /// * `Ok(Some(ProductRecord))` - Product found
    /// * `Ok(None)` - Product not found
    /// * `Err(DbError::CorruptData)` - Product without its product type
    pub async fn load_snapshot(&self, product_id: &str) -> DbResult<Option<ProductRecord>> {
        debug!(id = %product_id, "Loading product snapshot");

        let mut tx = self.pool.begin().await.map_err(transaction_failed)?;

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(product) = product else {
            return Ok(None);
        };

        let product_type = fetch_product_type(&mut tx, &product.product_type_id)
            .await?
            .ok_or_else(|| {
                DbError::CorruptData(format!(
                    "product {} references missing product type {}",
                    product.id, product.product_type_id
                ))
            })?;
        let overrides = fetch_override(&mut tx, &product.id).await?;

        tx.commit().await.map_err(transaction_failed)?;

        Ok(Some(ProductRecord {
            product,
            product_type,
            overrides,
        }))
    }

    /// Deletes a product; its override rows and product rules cascade.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Counts products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

async fn fetch_override(conn: &mut SqliteConnection, product_id: &str) -> DbResult<ProductOverride> {
    let deactivated_attributes: Vec<i64> = sqlx::query_scalar(
        "SELECT attribute_id FROM product_deactivated_attributes WHERE product_id = ?1",
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    let deactivated_options: Vec<PairRow> = sqlx::query_as(
        "SELECT attribute_id, option_id FROM product_deactivated_options WHERE product_id = ?1",
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    let out_of_stock_options: Vec<PairRow> = sqlx::query_as(
        "SELECT attribute_id, option_id FROM product_out_of_stock_options WHERE product_id = ?1",
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    let deactivated_combinations: Vec<CombinationId> = sqlx::query_scalar(
        "SELECT combination_id FROM product_deactivated_combinations WHERE product_id = ?1",
    )
    .bind(product_id)
    .fetch_all(&mut *conn)
    .await?;

    let additional_not_allowed_combinations =
        fetch_rules(conn, RuleOwner::Product(product_id)).await?;

    Ok(ProductOverride {
        deactivated_attributes: deactivated_attributes.into_iter().collect(),
        deactivated_options: deactivated_options.into_iter().map(OptionRef::from).collect(),
        out_of_stock_options: out_of_stock_options.into_iter().map(OptionRef::from).collect(),
        deactivated_combinations: deactivated_combinations.into_iter().collect(),
        additional_not_allowed_combinations,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product_type::NewProductType;
    use forma_core::{Attribute, Customisation, NewAttribute, NotAllowedCombination};

    struct Fixture {
        db: Database,
        product_type_id: String,
        attributes: Vec<Attribute>,
        type_rule: NotAllowedCombination,
    }

    /// Shirt: Color {Red, Blue}, Size {S, M}, rule {Red, S}.
    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let types = db.product_types();
        let pt = types
            .create(&NewProductType {
                name: "Shirt".to_string(),
                customisation: Customisation::FullyCustomizable,
            })
            .await
            .unwrap();
        let attributes = types
            .add_attributes(
                &pt.id,
                &[
                    NewAttribute {
                        attribute_name: "Color".to_string(),
                        possible_options: vec!["Red".to_string(), "Blue".to_string()],
                    },
                    NewAttribute {
                        attribute_name: "Size".to_string(),
                        possible_options: vec!["S".to_string(), "M".to_string()],
                    },
                ],
            )
            .await
            .unwrap();
        let rules = types
            .add_not_allowed_combinations(
                &pt.id,
                &[vec![
                    OptionRef::new(attributes[0].id, attributes[0].options[0].id),
                    OptionRef::new(attributes[1].id, attributes[1].options[0].id),
                ]],
            )
            .await
            .unwrap();

        Fixture {
            db,
            product_type_id: pt.id,
            attributes,
            type_rule: rules[0].clone(),
        }
    }

    fn new_product(product_type_id: &str, sku: &str) -> NewProduct {
        NewProduct {
            product_type_id: product_type_id.to_string(),
            name: "Plain shirt".to_string(),
            sku: sku.to_string(),
            description: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_round_trips_override() {
        let f = fixture().await;
        let color = &f.attributes[0];
        let size = &f.attributes[1];

        let overrides = ProductOverride {
            deactivated_options: [OptionRef::new(color.id, color.options[1].id)]
                .into_iter()
                .collect(),
            out_of_stock_options: [OptionRef::new(size.id, size.options[1].id)]
                .into_iter()
                .collect(),
            deactivated_combinations: [f.type_rule.id].into_iter().collect(),
            additional_not_allowed_combinations: vec![NotAllowedCombination::new(
                0,
                vec![
                    OptionRef::new(color.id, color.options[0].id),
                    OptionRef::new(size.id, size.options[1].id),
                ],
            )
            .unwrap()],
            ..Default::default()
        };

        let repo = f.db.products();
        let (product, stored) = repo
            .create(&new_product(&f.product_type_id, "SHIRT-1"), &overrides)
            .await
            .unwrap();
        assert_eq!(product.description, None);
        assert_ne!(stored.additional_not_allowed_combinations[0].id, 0);

        let loaded = repo.get_override(&product.id).await.unwrap();
        assert_eq!(loaded, stored);

        let by_id = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(by_id.sku, "SHIRT-1");
    }

    #[tokio::test]
    async fn test_duplicate_sku() {
        let f = fixture().await;
        let repo = f.db.products();
        let empty = ProductOverride::default();

        repo.create(&new_product(&f.product_type_id, "SHIRT-1"), &empty)
            .await
            .unwrap();
        let err = repo
            .create(&new_product(&f.product_type_id, "SHIRT-1"), &empty)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "sku"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_and_delete_cascades() {
        let f = fixture().await;
        let repo = f.db.products();
        let color = &f.attributes[0];

        let overrides = ProductOverride {
            deactivated_attributes: [color.id].into_iter().collect(),
            ..Default::default()
        };
        let (product, _) = repo
            .create(&new_product(&f.product_type_id, "SHIRT-2"), &overrides)
            .await
            .unwrap();

        let listed = repo.list(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product_type_name, "Shirt");

        repo.delete(&product.id).await.unwrap();
        assert!(repo.get_by_id(&product.id).await.unwrap().is_none());
        assert!(repo.get_override(&product.id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(&product.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_product_type_is_rejected() {
        let f = fixture().await;
        let err = f
            .db
            .products()
            .create(&new_product("missing", "SHIRT-3"), &ProductOverride::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_load_snapshot() {
        let f = fixture().await;
        let repo = f.db.products();
        let size = &f.attributes[1];

        let overrides = ProductOverride {
            out_of_stock_options: [OptionRef::new(size.id, size.options[1].id)]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let (product, stored) = repo
            .create(&new_product(&f.product_type_id, "SHIRT-4"), &overrides)
            .await
            .unwrap();

        let record = repo.load_snapshot(&product.id).await.unwrap().unwrap();
        assert_eq!(record.product.id, product.id);
        assert_eq!(record.product_type.id, f.product_type_id);
        assert_eq!(record.product_type.attributes().len(), 2);
        assert_eq!(record.product_type.rules().len(), 1);
        assert_eq!(record.overrides, stored);

        f.db.product_types().delete(&f.product_type_id).await.unwrap();
        assert!(repo.load_snapshot(&product.id).await.unwrap().is_none());
    }
}
