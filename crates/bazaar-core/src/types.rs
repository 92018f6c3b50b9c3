//! # Domain Types
//!
//! Core domain types used throughout Bazaar.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │  PaymentRecord  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id (UUID v4)   │       │
//! │  │  seller_id (FK) │   │  buyer_id (FK)  │   │  order_id (FK)  │       │
//! │  │  price_cents    │   │  status         │   │  amount_cents   │       │
//! │  │  quantity ≥ 0   │   │  delivered_at   │   │  method         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   OrderLine     │   │ ShipmentRecord  │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  quantity ≥ 1   │   │  order_id (PK)  │                             │
//! │  │  unit price     │   │  courier        │                             │
//! │  │  (snapshot)     │   │  tracking no.   │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are SQLite integer keys, except payment ids which are random
//! 128-bit UUID strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::delivery::Courier;
use crate::money::Money;
use crate::order::OrderStatus;

// =============================================================================
// Product
// =============================================================================

/// A product listed by a seller.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Owning seller profile.
    pub seller_id: i64,

    pub name: String,
    pub description: Option<String>,

    /// Craft tradition the piece belongs to, e.g. "Nakshi".
    pub cultural_motif: Option<String>,

    /// Current unit price in minor units.
    pub price_cents: i64,

    /// Units available for sale. Never negative.
    pub quantity: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.price_cents)
    }
}

/// Input for listing a new product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub seller_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cultural_motif: Option<String>,
    pub price_cents: i64,
    pub quantity: i64,
}

/// Partial product update, one typed field per updatable column.
///
/// Unknown keys are rejected at deserialization time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(deny_unknown_fields)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cultural_motif: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl ProductUpdate {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.cultural_motif.is_none()
            && self.price_cents.is_none()
            && self.quantity.is_none()
    }
}

// =============================================================================
// Order
// =============================================================================

/// A buyer's order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Set when the buyer confirms delivery.
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
}

/// One product in an order. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Price at purchase time, independent of later product price changes.
    pub unit_price_cents: i64,
}

impl OrderLine {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_minor(self.unit_price_cents)
    }

    /// Returns quantity × unit price.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price().checked_mul(self.quantity).ok()
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A recorded payment for an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentRecord {
    /// UUID v4.
    pub id: String,
    pub order_id: i64,
    pub amount_cents: i64,
    /// Opaque payment method label; no gateway is involved.
    pub method: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Shipment
// =============================================================================

/// The courier hand-over for an order. At most one per order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ShipmentRecord {
    pub order_id: i64,
    pub courier: Courier,
    #[ts(as = "String")]
    pub shipped_at: DateTime<Utc>,
    pub tracking_number: Option<String>,
}

// =============================================================================
// Profiles
// =============================================================================

/// A buyer or seller profile row. Purchases and listings depend on it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Requests and Responses
// =============================================================================

fn default_quantity() -> i64 {
    1
}

/// A buyer's purchase request.
///
/// `quantity` may be omitted, in which case a single unit is bought.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseRequest {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    pub payment_method: String,
}

impl PurchaseRequest {
    pub fn new(product_id: i64, quantity: i64, payment_method: impl Into<String>) -> Self {
        PurchaseRequest {
            product_id,
            quantity,
            payment_method: payment_method.into(),
        }
    }

    pub fn single_unit(product_id: i64, payment_method: impl Into<String>) -> Self {
        PurchaseRequest::new(product_id, 1, payment_method)
    }
}

/// The result of a committed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseReceipt {
    pub order_id: i64,
    pub payment_id: String,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
}

/// A seller's ship request. The courier is validated against the allow-list.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShipRequest {
    pub courier_service: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

impl ShipRequest {
    pub fn new(courier_service: impl Into<String>, tracking_number: Option<&str>) -> Self {
        ShipRequest {
            courier_service: courier_service.into(),
            tracking_number: tracking_number.map(str::to_string),
        }
    }
}

/// Result of a confirm-delivery call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryConfirmation {
    pub order_id: i64,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub delivered_at: DateTime<Utc>,
}

/// A row of the buyer's order listing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderSummary {
    pub order_id: i64,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub ordered_at: DateTime<Utc>,
    pub total_cents: i64,
}

/// A row of the seller's order listing: one per order line on their products.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SellerOrderLine {
    pub order_id: i64,
    pub buyer_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub ordered_at: DateTime<Utc>,
    pub courier: Option<Courier>,
    pub tracking_number: Option<String>,
    #[ts(as = "Option<String>")]
    pub shipped_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_quantity_defaults_to_one() {
        let req: PurchaseRequest =
            serde_json::from_str(r#"{"product_id": 4, "payment_method": "bkash"}"#).unwrap();
        assert_eq!(req.quantity, 1);

        let req: PurchaseRequest = serde_json::from_str(
            r#"{"product_id": 4, "quantity": 3, "payment_method": "bkash"}"#,
        )
        .unwrap();
        assert_eq!(req.quantity, 3);
    }

    #[test]
    fn test_product_update_rejects_unknown_fields() {
        let result: Result<ProductUpdate, _> =
            serde_json::from_str(r#"{"price_cents": 100, "seller_id": 9}"#);
        assert!(result.is_err());

        let update: ProductUpdate = serde_json::from_str(r#"{"price_cents": 100}"#).unwrap();
        assert_eq!(update.price_cents, Some(100));
        assert!(!update.is_empty());
        assert!(ProductUpdate::default().is_empty());
    }

    #[test]
    fn test_ship_request_tracking_is_optional() {
        let req: ShipRequest = serde_json::from_str(r#"{"courier_service": "Uthao"}"#).unwrap();
        assert_eq!(req.tracking_number, None);
    }

    #[test]
    fn test_line_total() {
        let line = OrderLine {
            order_id: 1,
            product_id: 2,
            quantity: 3,
            unit_price_cents: 1250,
        };
        assert_eq!(line.line_total(), Some(Money::from_minor(3750)));
    }
}
