//! # Product Repository
//!
//! Catalogue reads and the seller write path.
//!
//! ## Key Operations
//! - Listing and lookup
//! - Insert for the owning seller
//! - Partial updates through [`ProductUpdate`]
//! - Delete, refused once any order line references the product
//!
//! ## Partial Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {"price_cents": 1500, "quantity": 4}                                   │
//! │       │  serde: unknown keys rejected                                   │
//! │       ▼                                                                 │
//! │  ProductUpdate { price_cents: Some(1500), quantity: Some(4), .. }      │
//! │       │  row lock (same registry as purchases)                          │
//! │       ▼                                                                 │
//! │  UPDATE products SET price_cents = ?, quantity = ?, updated_at = ?      │
//! │  WHERE id = ?            (column names fixed, values bound)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Existing order lines keep the price they were bought at.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::lock::RowLocks;
use crate::repository::{begin_write, finish};
use bazaar_core::validation::{validate_new_product, validate_product_update};
use bazaar_core::{Actor, CoreError, NewProduct, Product, ProductUpdate, Role};

const PRODUCT_COLUMNS: &str = "id, seller_id, name, description, cultural_motif, \
                               price_cents, quantity, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    locks: RowLocks,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, locks: RowLocks) -> Self {
        ProductRepository { pool, locks }
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        fetch_product(&self.pool, id).await
    }

    /// Lists products with stock, newest first.
    pub async fn list_available(&self, limit: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE quantity > 0
             ORDER BY created_at DESC, id DESC
             LIMIT ?1"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed available products");
        Ok(products)
    }

    /// Lists every product of a seller, including sold-out ones.
    pub async fn list_for_seller(&self, seller_id: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE seller_id = ?1
             ORDER BY id"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(seller_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Lists a new product for the calling seller.
    ///
    /// ## Errors
    /// - `Forbidden` unless the actor is the seller named in `product`
    /// - `ValidationError` for a blank name or negative price/stock
    /// - `IntegrityViolation` if the seller profile does not exist
    pub async fn insert(&self, actor: &Actor, product: &NewProduct) -> DbResult<Product> {
        actor.require(Role::Seller)?;
        if actor.user_id != product.seller_id {
            return Err(CoreError::Forbidden(
                "products can only be listed for the calling seller".to_string(),
            )
            .into());
        }
        validate_new_product(product)?;

        debug!(seller_id = product.seller_id, name = %product.name, "Inserting product");

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO products
                 (seller_id, name, description, cultural_motif, price_cents, quantity, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING {PRODUCT_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Product>(&sql)
            .bind(product.seller_id)
            .bind(product.name.trim())
            .bind(product.description.as_deref())
            .bind(product.cultural_motif.as_deref())
            .bind(product.price_cents)
            .bind(product.quantity)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        info!(product_id = inserted.id, seller_id = inserted.seller_id, "Product listed");
        Ok(inserted)
    }

    /// Applies a partial update for the owning seller.
    ///
    /// An empty update changes nothing and returns the current product.
    ///
    /// ## Errors
    /// - `NotFound` if the product does not exist
    /// - `Forbidden` if it belongs to another seller
    /// - `ConcurrencyConflict` if a purchase or another update holds the row
    pub async fn update(
        &self,
        actor: &Actor,
        product_id: i64,
        update: &ProductUpdate,
    ) -> DbResult<Product> {
        actor.require(Role::Seller)?;
        validate_product_update(update)?;

        let _guard = self
            .locks
            .try_acquire(product_id)
            .ok_or_else(|| DbError::row_locked(product_id))?;

        let mut tx = begin_write(&self.pool).await?;
        let result = apply_update(&mut tx, actor.user_id, product_id, update).await;
        let product = finish(tx, "update_product", result).await?;

        info!(product_id, "Product updated");
        Ok(product)
    }

    /// Deletes a product for the owning seller.
    ///
    /// Products that have been ordered stay, so order history keeps its
    /// product rows.
    ///
    /// ## Errors
    /// - `NotFound` if the product does not exist
    /// - `Forbidden` if it belongs to another seller
    /// - `StateConflict` if any order line references it
    /// - `ConcurrencyConflict` if a purchase or an update holds the row
    pub async fn delete(&self, actor: &Actor, product_id: i64) -> DbResult<()> {
        actor.require(Role::Seller)?;

        let _guard = self
            .locks
            .try_acquire(product_id)
            .ok_or_else(|| DbError::row_locked(product_id))?;

        let mut tx = begin_write(&self.pool).await?;
        let result = remove_product(&mut tx, actor.user_id, product_id).await;
        finish(tx, "delete_product", result).await?;

        info!(product_id, seller_id = actor.user_id, "Product deleted");
        Ok(())
    }
}

async fn fetch_product<'e, E>(executor: E, id: i64) -> DbResult<Option<Product>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(product)
}

/// NotFound for a missing product, Forbidden for another seller's.
async fn check_owner(
    conn: &mut SqliteConnection,
    seller_id: i64,
    product_id: i64,
) -> DbResult<()> {
    let owner: Option<i64> = sqlx::query_scalar("SELECT seller_id FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    match owner {
        None => Err(CoreError::ProductNotFound(product_id).into()),
        Some(owner) if owner != seller_id => Err(CoreError::Forbidden(format!(
            "product {product_id} belongs to another seller"
        ))
        .into()),
        Some(_) => Ok(()),
    }
}

async fn remove_product(
    conn: &mut SqliteConnection,
    seller_id: i64,
    product_id: i64,
) -> DbResult<()> {
    check_owner(&mut *conn, seller_id, product_id).await?;

    let ordered: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM order_lines WHERE product_id = ?1 LIMIT 1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;

    if ordered.is_some() {
        return Err(CoreError::ProductHasOrders(product_id).into());
    }

    debug!(product_id, "Deleting product");
    sqlx::query("DELETE FROM products WHERE id = ?1")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn apply_update(
    conn: &mut SqliteConnection,
    seller_id: i64,
    product_id: i64,
    update: &ProductUpdate,
) -> DbResult<Product> {
    check_owner(&mut *conn, seller_id, product_id).await?;

    if !update.is_empty() {
        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new("UPDATE products SET ");
        let mut set = query.separated(", ");
        if let Some(name) = &update.name {
            set.push("name = ").push_bind_unseparated(name.trim().to_string());
        }
        if let Some(description) = &update.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(motif) = &update.cultural_motif {
            set.push("cultural_motif = ").push_bind_unseparated(motif.clone());
        }
        if let Some(price) = update.price_cents {
            set.push("price_cents = ").push_bind_unseparated(price);
        }
        if let Some(quantity) = update.quantity {
            set.push("quantity = ").push_bind_unseparated(quantity);
        }
        set.push("updated_at = ").push_bind_unseparated(Utc::now());

        query.push(" WHERE id = ").push_bind(product_id);
        query.build().execute(&mut *conn).await?;
    }

    fetch_product(&mut *conn, product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id).into())
}

// =============================================================================
// Unit Tests
// =============================================================================
