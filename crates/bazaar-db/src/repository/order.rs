//! # Order Repository
//!
//! Order status transitions and the read paths built on them.
//!
//! ## Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ship(seller, order, {courier_service, tracking_number?})               │
//! │    courier on allow-list?                  no ──► ValidationError       │
//! │    BEGIN IMMEDIATE                                                      │
//! │    seller owns a product in the order?     no ──► NotFound              │
//! │    shipment already recorded?             yes ──► StateConflict         │
//! │    status == PendingShipment?              no ──► StateConflict         │
//! │    UPDATE orders SET status = 'shipped' WHERE status = 'pending_...'    │
//! │    INSERT shipments                                                     │
//! │    COMMIT                                                               │
//! │                                                                         │
//! │  confirm_delivery(buyer, order)                                         │
//! │    BEGIN IMMEDIATE                                                      │
//! │    buyer owns the order?                   no ──► NotFound              │
//! │    status == Shipped?                      no ──► StateConflict         │
//! │    UPDATE orders SET status = 'delivered', delivered_at = now          │
//! │    COMMIT                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Both transitions hold the write lock from `BEGIN IMMEDIATE`, so writers
//! on other orders wait on the busy timeout instead of failing. Every status
//! write is also conditional on the status read in the same transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, finish};
use bazaar_core::validation::{validate_courier, validate_tracking_number};
use bazaar_core::{
    Actor, CoreError, Courier, DeliveryConfirmation, Order, OrderLine, OrderStatus, OrderSummary,
    PaymentRecord, Role, SellerOrderLine, ShipRequest, ShipmentRecord, TrackingReport,
    SELLER_ORDER_LIMIT,
};

const ORDER_COLUMNS: &str = "id, buyer_id, status, created_at, delivered_at";

/// Repository for order transitions and order reads.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Hands an order to a courier: PendingShipment → Shipped.
    ///
    /// Only a seller who owns a product in the order may ship it. A seller
    /// who does not sees the order as missing.
    pub async fn ship(
        &self,
        actor: &Actor,
        order_id: i64,
        request: &ShipRequest,
    ) -> DbResult<ShipmentRecord> {
        actor.require(Role::Seller)?;
        let courier = validate_courier(&request.courier_service)?;
        let tracking_number = validate_tracking_number(request.tracking_number.as_deref())?;

        debug!(order_id, seller_id = actor.user_id, courier = %courier, "Shipping order");

        let mut tx = begin_write(&self.pool).await?;
        let result = record_shipment(&mut tx, actor.user_id, order_id, courier, tracking_number).await;
        let shipment = finish(tx, "ship", result).await?;

        info!(
            order_id,
            courier = %shipment.courier,
            tracking_number = shipment.tracking_number.as_deref().unwrap_or("-"),
            "Order shipped"
        );
        Ok(shipment)
    }

    /// Records receipt by the owning buyer: Shipped → Delivered.
    pub async fn confirm_delivery(
        &self,
        actor: &Actor,
        order_id: i64,
    ) -> DbResult<DeliveryConfirmation> {
        actor.require(Role::Buyer)?;

        let mut tx = begin_write(&self.pool).await?;
        let result = mark_delivered(&mut tx, actor.user_id, order_id).await;
        let confirmation = finish(tx, "confirm_delivery", result).await?;

        info!(order_id, buyer_id = actor.user_id, "Delivery confirmed");
        Ok(confirmation)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub async fn get_order(&self, order_id: i64) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    pub async fn get_lines(&self, order_id: i64) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT order_id, product_id, quantity, unit_price_cents
             FROM order_lines WHERE order_id = ?1
             ORDER BY product_id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    pub async fn get_payments(&self, order_id: i64) -> DbResult<Vec<PaymentRecord>> {
        let payments = sqlx::query_as::<_, PaymentRecord>(
            "SELECT id, order_id, amount_cents, method, created_at
             FROM payments WHERE order_id = ?1
             ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    pub async fn get_shipment(&self, order_id: i64) -> DbResult<Option<ShipmentRecord>> {
        let shipment = sqlx::query_as::<_, ShipmentRecord>(
            "SELECT order_id, courier, shipped_at, tracking_number
             FROM shipments WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(shipment)
    }

    // =========================================================================
    // Buyer / Seller Views
    // =========================================================================

    /// Tracking report for one of the buyer's orders.
    pub async fn track_order(&self, actor: &Actor, order_id: i64) -> DbResult<TrackingReport> {
        actor.require(Role::Buyer)?;

        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND buyer_id = ?2");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(order_id)
            .bind(actor.user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CoreError::OrderNotFound(order_id))?;

        let shipment = self.get_shipment(order_id).await?;

        Ok(TrackingReport::build(
            order.id,
            order.status,
            order.created_at,
            order.delivered_at,
            shipment.as_ref(),
        ))
    }

    /// Tracking report looked up by courier tracking number.
    ///
    /// Only the buyer's own orders are searched.
    pub async fn track_by_tracking_number(
        &self,
        actor: &Actor,
        tracking_number: &str,
    ) -> DbResult<TrackingReport> {
        actor.require(Role::Buyer)?;
        let tracking_number = tracking_number.trim();

        let order_id: i64 = sqlx::query_scalar(
            "SELECT o.id FROM orders o
             JOIN shipments s ON s.order_id = o.id
             WHERE s.tracking_number = ?1 AND o.buyer_id = ?2
             ORDER BY o.id DESC
             LIMIT 1",
        )
        .bind(tracking_number)
        .bind(actor.user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Shipment", tracking_number))?;

        self.track_order(actor, order_id).await
    }

    /// The buyer's orders with their paid totals, newest first.
    pub async fn orders_for_buyer(&self, actor: &Actor) -> DbResult<Vec<OrderSummary>> {
        actor.require(Role::Buyer)?;

        let orders = sqlx::query_as::<_, OrderSummary>(
            "SELECT o.id AS order_id,
                    o.status,
                    o.created_at AS ordered_at,
                    COALESCE(SUM(p.amount_cents), 0) AS total_cents
             FROM orders o
             LEFT JOIN payments p ON p.order_id = o.id
             WHERE o.buyer_id = ?1
             GROUP BY o.id, o.status, o.created_at
             ORDER BY o.created_at DESC, o.id DESC",
        )
        .bind(actor.user_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(buyer_id = actor.user_id, count = orders.len(), "Listed buyer orders");
        Ok(orders)
    }

    /// Order lines on the seller's products with shipment info, newest first.
    pub async fn orders_for_seller(&self, actor: &Actor) -> DbResult<Vec<SellerOrderLine>> {
        actor.require(Role::Seller)?;

        let lines = sqlx::query_as::<_, SellerOrderLine>(
            "SELECT o.id AS order_id,
                    o.buyer_id,
                    ol.product_id,
                    p.name AS product_name,
                    ol.quantity,
                    ol.unit_price_cents,
                    o.status,
                    o.created_at AS ordered_at,
                    s.courier,
                    s.tracking_number,
                    s.shipped_at
             FROM order_lines ol
             JOIN products p ON p.id = ol.product_id
             JOIN orders o ON o.id = ol.order_id
             LEFT JOIN shipments s ON s.order_id = o.id
             WHERE p.seller_id = ?1
             ORDER BY o.created_at DESC, o.id DESC
             LIMIT ?2",
        )
        .bind(actor.user_id)
        .bind(SELLER_ORDER_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        debug!(seller_id = actor.user_id, count = lines.len(), "Listed seller orders");
        Ok(lines)
    }

    /// The buyer's payment records, newest first.
    pub async fn payment_history(&self, actor: &Actor) -> DbResult<Vec<PaymentRecord>> {
        actor.require(Role::Buyer)?;

        let payments = sqlx::query_as::<_, PaymentRecord>(
            "SELECT p.id, p.order_id, p.amount_cents, p.method, p.created_at
             FROM payments p
             JOIN orders o ON o.id = p.order_id
             WHERE o.buyer_id = ?1
             ORDER BY p.created_at DESC, p.order_id DESC",
        )
        .bind(actor.user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }
}

async fn record_shipment(
    conn: &mut SqliteConnection,
    seller_id: i64,
    order_id: i64,
    courier: Courier,
    tracking_number: Option<String>,
) -> DbResult<ShipmentRecord> {
    let owns: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM order_lines ol
         JOIN products p ON p.id = ol.product_id
         WHERE ol.order_id = ?1 AND p.seller_id = ?2
         LIMIT 1",
    )
    .bind(order_id)
    .bind(seller_id)
    .fetch_optional(&mut *conn)
    .await?;

    if owns.is_none() {
        return Err(CoreError::OrderNotFound(order_id).into());
    }

    let status: OrderStatus = sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CoreError::OrderNotFound(order_id))?;

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT order_id FROM shipments WHERE order_id = ?1")
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await?;

    if existing.is_some() {
        return Err(CoreError::ShipmentAlreadyRecorded(order_id).into());
    }

    let next = status.transition(order_id, OrderStatus::Shipped)?;
    advance_status(&mut *conn, order_id, status, next, None).await?;

    let shipped_at = Utc::now();
    sqlx::query(
        "INSERT INTO shipments (order_id, courier, shipped_at, tracking_number)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(order_id)
    .bind(courier)
    .bind(shipped_at)
    .bind(tracking_number.as_deref())
    .execute(&mut *conn)
    .await?;

    Ok(ShipmentRecord {
        order_id,
        courier,
        shipped_at,
        tracking_number,
    })
}

async fn mark_delivered(
    conn: &mut SqliteConnection,
    buyer_id: i64,
    order_id: i64,
) -> DbResult<DeliveryConfirmation> {
    let status: OrderStatus =
        sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1 AND buyer_id = ?2")
            .bind(order_id)
            .bind(buyer_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(CoreError::OrderNotFound(order_id))?;

    let next = status.transition(order_id, OrderStatus::Delivered)?;
    let delivered_at = Utc::now();
    advance_status(&mut *conn, order_id, status, next, Some(delivered_at)).await?;

    Ok(DeliveryConfirmation {
        order_id,
        status: next,
        delivered_at,
    })
}

/// Conditional status write. Zero rows means the status moved underneath us.
async fn advance_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    delivered_at: Option<chrono::DateTime<Utc>>,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE orders SET status = ?3, delivered_at = COALESCE(?4, delivered_at)
         WHERE id = ?1 AND status = ?2",
    )
    .bind(order_id)
    .bind(from)
    .bind(to)
    .bind(delivered_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::InvalidTransition { order_id, from, to }.into());
    }

    debug!(order_id, from = %from, to = %to, "Order status advanced");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use crate::Database;
    use bazaar_core::{ErrorKind, MilestoneStage, PurchaseRequest};

    struct Placed {
        db: Database,
        seller: Actor,
        buyer: Actor,
        order_id: i64,
    }

    async fn placed_order() -> Placed {
        let db = fixtures::memory_db().await;
        let seller = fixtures::seller(&db, "shilpi@example.com").await;
        let buyer = fixtures::buyer(&db, "rina@example.com").await;
        let product_id = fixtures::product(&db, &seller, 2200, 4).await;
        let receipt = db
            .purchases()
            .purchase(&buyer, &PurchaseRequest::new(product_id, 2, "nagad"))
            .await
            .unwrap();
        Placed {
            db,
            seller,
            buyer,
            order_id: receipt.order_id,
        }
    }

    /// One single-unit order per product, so every order is independent.
    async fn independent_orders(
        db: &Database,
        seller: &Actor,
        buyer: &Actor,
        count: usize,
    ) -> Vec<i64> {
        let mut order_ids = Vec::with_capacity(count);
        for _ in 0..count {
            let product_id = fixtures::product(db, seller, 1500, 1).await;
            let receipt = db
                .purchases()
                .purchase(buyer, &PurchaseRequest::single_unit(product_id, "bkash"))
                .await
                .unwrap();
            order_ids.push(receipt.order_id);
        }
        order_ids
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ships_of_distinct_orders_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixtures::file_db(&dir, 8).await;
        let seller = fixtures::seller(&db, "shilpi@example.com").await;
        let buyer = fixtures::buyer(&db, "rina@example.com").await;
        let order_ids = independent_orders(&db, &seller, &buyer, 24).await;

        let handles: Vec<_> = order_ids
            .iter()
            .map(|&order_id| {
                let db = db.clone();
                let seller = seller;
                tokio::spawn(async move {
                    db.orders()
                        .ship(&seller, order_id, &ShipRequest::new("Uthao", None))
                        .await
                })
            })
            .collect();

        for handle in handles {
            let shipment = handle.await.unwrap().unwrap();
            assert_eq!(shipment.courier, Courier::Uthao);
        }

        for order_id in order_ids {
            let order = db.orders().get_order(order_id).await.unwrap().unwrap();
            assert_eq!(order.status, OrderStatus::Shipped);
            assert!(db.orders().get_shipment(order_id).await.unwrap().is_some());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_confirms_alongside_purchases() {
        let dir = tempfile::tempdir().unwrap();
        let db = fixtures::file_db(&dir, 8).await;
        let seller = fixtures::seller(&db, "shilpi@example.com").await;
        let buyer = fixtures::buyer(&db, "rina@example.com").await;
        let order_ids = independent_orders(&db, &seller, &buyer, 24).await;
        for &order_id in &order_ids {
            db.orders()
                .ship(&seller, order_id, &ShipRequest::new("Abul and Co", None))
                .await
                .unwrap();
        }
        let mut restocked = Vec::new();
        for _ in 0..order_ids.len() {
            restocked.push(fixtures::product(&db, &seller, 900, 5).await);
        }

        let confirms: Vec<_> = order_ids
            .iter()
            .map(|&order_id| {
                let db = db.clone();
                let buyer = buyer;
                tokio::spawn(async move { db.orders().confirm_delivery(&buyer, order_id).await })
            })
            .collect();
        let purchases: Vec<_> = restocked
            .iter()
            .map(|&product_id| {
                let db = db.clone();
                let buyer = buyer;
                tokio::spawn(async move {
                    db.purchases()
                        .purchase(&buyer, &PurchaseRequest::single_unit(product_id, "nagad"))
                        .await
                })
            })
            .collect();

        for handle in confirms {
            let confirmation = handle.await.unwrap().unwrap();
            assert_eq!(confirmation.status, OrderStatus::Delivered);
        }
        for handle in purchases {
            handle.await.unwrap().unwrap();
        }

        let summaries = db.orders().orders_for_buyer(&buyer).await.unwrap();
        let delivered = summaries
            .iter()
            .filter(|o| o.status == OrderStatus::Delivered)
            .count();
        assert_eq!(delivered, order_ids.len());
        assert_eq!(summaries.len(), order_ids.len() + restocked.len());
    }

    #[tokio::test]
    async fn test_ship_then_ship_again() {
        let p = placed_order().await;
        let request = ShipRequest::new("Uthao", Some("UT-1001"));

        let shipment = p.db.orders().ship(&p.seller, p.order_id, &request).await.unwrap();
        assert_eq!(shipment.courier, Courier::Uthao);
        let order = p.db.orders().get_order(p.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);

        let err = p.db.orders().ship(&p.seller, p.order_id, &request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert!(err.to_string().contains("already recorded"));

        let order = p.db.orders().get_order(p.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        let stored = p.db.orders().get_shipment(p.order_id).await.unwrap().unwrap();
        assert_eq!(stored.tracking_number.as_deref(), Some("UT-1001"));
    }

    #[tokio::test]
    async fn test_unknown_courier_writes_nothing() {
        let p = placed_order().await;

        let err = p
            .db
            .orders()
            .ship(&p.seller, p.order_id, &ShipRequest::new("uthao", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);

        assert!(p.db.orders().get_shipment(p.order_id).await.unwrap().is_none());
        let order = p.db.orders().get_order(p.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::PendingShipment);
    }

    #[tokio::test]
    async fn test_other_seller_sees_not_found() {
        let p = placed_order().await;
        let stranger = fixtures::seller(&p.db, "stranger@example.com").await;

        let err = p
            .db
            .orders()
            .ship(&stranger, p.order_id, &ShipRequest::new("Uthao", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = p
            .db
            .orders()
            .ship(&p.buyer, p.order_id, &ShipRequest::new("Uthao", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_confirm_delivery_lifecycle() {
        let p = placed_order().await;
        let orders = p.db.orders();

        let err = orders.confirm_delivery(&p.buyer, p.order_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);

        orders
            .ship(&p.seller, p.order_id, &ShipRequest::new("Abul and Co", None))
            .await
            .unwrap();

        let confirmation = orders.confirm_delivery(&p.buyer, p.order_id).await.unwrap();
        assert_eq!(confirmation.status, OrderStatus::Delivered);
        let order = orders.get_order(p.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.delivered_at.is_some());

        let err = orders.confirm_delivery(&p.buyer, p.order_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
    }

    #[tokio::test]
    async fn test_confirm_by_other_buyer_is_not_found() {
        let p = placed_order().await;
        let other = fixtures::buyer(&p.db, "other@example.com").await;
        p.db.orders()
            .ship(&p.seller, p.order_id, &ShipRequest::new("Uthao", None))
            .await
            .unwrap();

        let err = p.db.orders().confirm_delivery(&other, p.order_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_track_order_projects_eta() {
        let p = placed_order().await;
        let orders = p.db.orders();

        let report = orders.track_order(&p.buyer, p.order_id).await.unwrap();
        assert_eq!(report.status, OrderStatus::PendingShipment);
        assert_eq!(report.expected_delivery, None);

        let shipment = orders
            .ship(
                &p.seller,
                p.order_id,
                &ShipRequest::new("Royal Bengal Ilish Mach Logistics", Some("RB-9")),
            )
            .await
            .unwrap();

        let report = orders.track_order(&p.buyer, p.order_id).await.unwrap();
        assert_eq!(
            report.expected_delivery,
            Some(shipment.shipped_at + chrono::Duration::days(5))
        );
        assert_eq!(report.current_stage(), Some(MilestoneStage::Shipped));

        let by_number = orders.track_by_tracking_number(&p.buyer, "RB-9").await.unwrap();
        assert_eq!(by_number.order_id, p.order_id);

        let other = fixtures::buyer(&p.db, "other@example.com").await;
        let err = orders.track_by_tracking_number(&other, "RB-9").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = orders.track_order(&other, p.order_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_listings() {
        let p = placed_order().await;
        let orders = p.db.orders();

        let mine = orders.orders_for_buyer(&p.buyer).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].total_cents, 4400);

        let history = orders.payment_history(&p.buyer).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount_cents, 4400);

        let selling = orders.orders_for_seller(&p.seller).await.unwrap();
        assert_eq!(selling.len(), 1);
        assert_eq!(selling[0].quantity, 2);
        assert_eq!(selling[0].courier, None);

        orders
            .ship(&p.seller, p.order_id, &ShipRequest::new("Fatao Courier Services", None))
            .await
            .unwrap();
        let selling = orders.orders_for_seller(&p.seller).await.unwrap();
        assert_eq!(selling[0].courier, Some(Courier::FataoCourierServices));
        assert_eq!(selling[0].status, OrderStatus::Shipped);
    }

    #[tokio::test]
    async fn test_orders_are_never_deleted() {
        let p = placed_order().await;
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(p.order_id)
            .execute(p.db.pool())
            .await;
        assert!(result.is_err());

        let result = sqlx::query("UPDATE order_lines SET quantity = 1 WHERE order_id = ?1")
            .bind(p.order_id)
            .execute(p.db.pool())
            .await;
        assert!(result.is_err());
    }
}
