//! # Error Types
//!
//! The stable error taxonomy and the domain-specific errors of bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  ├── ErrorKind        - Stable taxonomy every failure maps onto        │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bazaar-db errors (separate crate)                                     │
//! │  └── DbError          - Store failures, classified into ErrorKind      │
//! │                                                                         │
//! │  Transport (outside this workspace)                                    │
//! │  └── ErrorReport      - What the caller sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ErrorReport → Caller    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Policy
//! The core never retries. Only [`ErrorKind::ConcurrencyConflict`] is worth
//! retrying by the caller; every other kind is terminal.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::order::OrderStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// The stable classification of every failure surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Product, order or shipment does not exist (or is not visible to the caller).
    NotFound,

    /// Not enough stock for the requested quantity. Terminal.
    OutOfStock,

    /// The product row is locked by another in-flight unit of work. Retryable.
    ConcurrencyConflict,

    /// A dependent row (buyer or seller profile) is missing. Not retryable.
    IntegrityViolation,

    /// The order is not in a state that allows the requested transition.
    StateConflict,

    /// Malformed input, e.g. an unknown courier.
    ValidationError,

    /// The caller's verified role does not permit the operation.
    Forbidden,

    /// Unclassified store failure.
    InternalError,
}

impl ErrorKind {
    /// Returns true if the caller may retry the same request unchanged.
    #[inline]
    pub const fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::ConcurrencyConflict)
    }

    /// Returns true if the error must not be retried automatically.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        !self.is_retryable()
    }
}

// =============================================================================
// Error Report
// =============================================================================

/// Serializable error payload for the transport layer.
///
/// ```json
/// {
///   "kind": "CONCURRENCY_CONFLICT",
///   "message": "Product 7 is locked by another purchase, try again",
///   "retryable": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ErrorReport {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ErrorReport {
            kind,
            message: message.into(),
            retryable: kind.is_retryable(),
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// Order cannot be found, or does not belong to the caller.
    ///
    /// Ownership mismatches deliberately look identical to a missing order.
    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    /// Insufficient stock to complete the purchase.
    ///
    /// ## User Workflow
    /// ```text
    /// Purchase (qty: 3)
    ///      │
    ///      ▼
    /// Locked row: available=2
    ///      │
    ///      ▼
    /// OutOfStock { product_id: 7, available: 2, requested: 3 }
    ///      │
    ///      ▼
    /// Caller shows: "Only 2 left"
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    OutOfStock {
        product_id: i64,
        available: i64,
        requested: i64,
    },

    /// Order status does not allow the requested transition.
    #[error("Order {order_id} is {from}, cannot move to {to}")]
    InvalidTransition {
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// A shipment already exists for the order.
    #[error("Shipment already recorded for order {0}")]
    ShipmentAlreadyRecorded(i64),

    /// The product appears on order lines and cannot be deleted.
    #[error("Product {0} has orders and cannot be deleted")]
    ProductHasOrders(i64),

    /// Caller's role or ownership does not permit the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Maps the error onto the stable taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_) | CoreError::OrderNotFound(_) => ErrorKind::NotFound,
            CoreError::OutOfStock { .. } => ErrorKind::OutOfStock,
            CoreError::InvalidTransition { .. }
            | CoreError::ShipmentAlreadyRecorded(_)
            | CoreError::ProductHasOrders(_) => ErrorKind::StateConflict,
            CoreError::Forbidden(_) => ErrorKind::Forbidden,
            CoreError::Validation(_) => ErrorKind::ValidationError,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any unit of work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Arithmetic on the amount would overflow.
    #[error("{field} is too large")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OutOfStock {
            product_id: 7,
            available: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 7: available 2, requested 3"
        );

        let err = CoreError::InvalidTransition {
            order_id: 4,
            from: OrderStatus::PendingShipment,
            to: OrderStatus::Delivered,
        };
        assert_eq!(
            err.to_string(),
            "Order 4 is Pending Shipment, cannot move to Delivered"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::ProductNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::OrderNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::ShipmentAlreadyRecorded(1).kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            CoreError::ProductHasOrders(1).kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            CoreError::Forbidden("buyer only".into()).kind(),
            ErrorKind::Forbidden
        );
        let err: CoreError = ValidationError::Required {
            field: "payment_method".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_only_concurrency_conflict_is_retryable() {
        let all = [
            ErrorKind::NotFound,
            ErrorKind::OutOfStock,
            ErrorKind::ConcurrencyConflict,
            ErrorKind::IntegrityViolation,
            ErrorKind::StateConflict,
            ErrorKind::ValidationError,
            ErrorKind::Forbidden,
            ErrorKind::InternalError,
        ];
        let retryable: Vec<_> = all.iter().filter(|k| k.is_retryable()).collect();
        assert_eq!(retryable, vec![&ErrorKind::ConcurrencyConflict]);
        assert!(ErrorKind::OutOfStock.is_terminal());
    }

    #[test]
    fn test_report_serialization() {
        let report = ErrorReport::new(ErrorKind::ConcurrencyConflict, "locked");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "CONCURRENCY_CONFLICT");
        assert_eq!(json["retryable"], true);
    }
}
