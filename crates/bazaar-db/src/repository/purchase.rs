//! # Purchase Repository
//!
//! The purchase transaction coordinator: reserve stock and record the sale
//! as one unit of work.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  purchase(actor, {product_id, quantity, payment_method})                │
//! │                                                                         │
//! │  0. buyer role, quantity 1..=999, payment method        (no I/O)        │
//! │  1. RowLocks::try_acquire(product_id)  ── held ──► ConcurrencyConflict  │
//! │     BEGIN                                                               │
//! │  2. UPDATE products SET quantity = quantity ... RETURNING               │
//! │        (takes the write lock, then reads)  ── none ──► NotFound         │
//! │  3. quantity < requested  ─────────────────────────► OutOfStock         │
//! │  4. total = unit price × quantity  ── overflow ────► ValidationError    │
//! │  5. INSERT orders        (pending_shipment)  ── no buyer ──► Integrity  │
//! │  6. INSERT payments      (UUID v4, amount = total)                      │
//! │  7. INSERT order_lines   (unit price snapshot)                          │
//! │  8. UPDATE products SET quantity = quantity - ?                         │
//! │  9. COMMIT, then the row lock is released                               │
//! │                                                                         │
//! │  Any failure: ROLLBACK, warn! with the kind, return the error.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here retries. A `ConcurrencyConflict` goes back to the caller.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::lock::RowLocks;
use crate::repository::finish;
use bazaar_core::validation::{validate_payment_method, validate_quantity};
use bazaar_core::{
    Actor, CoreError, Money, OrderStatus, PurchaseReceipt, PurchaseRequest, Role,
};

/// Product columns read under the write lock.
#[derive(Debug, sqlx::FromRow)]
struct LockedProduct {
    id: i64,
    seller_id: i64,
    price_cents: i64,
    quantity: i64,
}

/// Repository for the purchase unit of work.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
    locks: RowLocks,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool, locks: RowLocks) -> Self {
        PurchaseRepository { pool, locks }
    }

    /// Buys `request.quantity` units of one product for the calling buyer.
    ///
    /// ## Returns
    /// The receipt with the new order id, payment id and total.
    ///
    /// ## Errors
    /// | Kind                  | When                                      |
    /// |-----------------------|-------------------------------------------|
    /// | `Forbidden`           | caller is not a buyer                     |
    /// | `ValidationError`     | bad quantity / payment method, overflow   |
    /// | `ConcurrencyConflict` | the product row is held (retryable)       |
    /// | `NotFound`            | the product does not exist                |
    /// | `OutOfStock`          | fewer units than requested (terminal)     |
    /// | `IntegrityViolation`  | the buyer profile does not exist          |
    /// | `InternalError`       | anything else                             |
    pub async fn purchase(
        &self,
        actor: &Actor,
        request: &PurchaseRequest,
    ) -> DbResult<PurchaseReceipt> {
        actor.require(Role::Buyer)?;
        validate_quantity(request.quantity)?;
        let payment_method = validate_payment_method(&request.payment_method)?;

        let product_id = request.product_id;
        let _guard = self
            .locks
            .try_acquire(product_id)
            .ok_or_else(|| DbError::row_locked(product_id))?;

        debug!(
            product_id,
            buyer_id = actor.user_id,
            quantity = request.quantity,
            "Starting purchase"
        );

        let mut tx = self.pool.begin().await?;
        let result = reserve_and_record(
            &mut tx,
            actor.user_id,
            product_id,
            request.quantity,
            &payment_method,
            Utc::now(),
        )
        .await;
        let receipt = finish(tx, "purchase", result).await?;

        info!(
            order_id = receipt.order_id,
            payment_id = %receipt.payment_id,
            product_id,
            quantity = receipt.quantity,
            total = %Money::from_minor(receipt.total_cents),
            "Purchase committed"
        );
        Ok(receipt)
    }
}

async fn reserve_and_record(
    conn: &mut SqliteConnection,
    buyer_id: i64,
    product_id: i64,
    quantity: i64,
    payment_method: &str,
    now: DateTime<Utc>,
) -> DbResult<PurchaseReceipt> {
    // Self-assignment takes SQLite's write lock before the read, so the
    // quantity seen here cannot change until COMMIT.
    let product = sqlx::query_as::<_, LockedProduct>(
        "UPDATE products SET quantity = quantity WHERE id = ?1
         RETURNING id, seller_id, price_cents, quantity",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(CoreError::ProductNotFound(product_id))?;

    debug!(
        product_id = product.id,
        seller_id = product.seller_id,
        available = product.quantity,
        "Product row locked"
    );

    if product.quantity < quantity {
        return Err(CoreError::OutOfStock {
            product_id,
            available: product.quantity,
            requested: quantity,
        }
        .into());
    }

    let unit_price = Money::from_minor(product.price_cents);
    let total = unit_price.checked_mul(quantity)?;

    let order_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO orders (buyer_id, status, created_at) VALUES (?1, ?2, ?3) RETURNING id",
    )
    .bind(buyer_id)
    .bind(OrderStatus::PendingShipment)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    let payment_id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO payments (id, order_id, amount_cents, method, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&payment_id)
    .bind(order_id)
    .bind(total.minor())
    .bind(payment_method)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "INSERT INTO order_lines (order_id, product_id, quantity, unit_price_cents)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price.minor())
    .execute(&mut *conn)
    .await?;

    let decremented = sqlx::query(
        "UPDATE products SET quantity = quantity - ?2, updated_at = ?3
         WHERE id = ?1 AND quantity >= ?2",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if decremented.rows_affected() == 0 {
        return Err(CoreError::OutOfStock {
            product_id,
            available: product.quantity,
            requested: quantity,
        }
        .into());
    }

    Ok(PurchaseReceipt {
        order_id,
        payment_id,
        product_id,
        quantity,
        unit_price_cents: unit_price.minor(),
        total_cents: total.minor(),
        status: OrderStatus::PendingShipment,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
