//! # Order Status State Machine
//!
//! The legal lifecycle of an order. The database layer consults these rules
//! inside the same unit of work as the conditional status write.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Lifecycle                                  │
//! │                                                                         │
//! │  purchase()          ship()                 confirm_delivery()          │
//! │  (coordinator)       (owning seller)        (owning buyer)              │
//! │      │                   │                       │                      │
//! │      ▼                   ▼                       ▼                      │
//! │  PendingShipment ──► Shipped ──────────────► Delivered                  │
//! │                      + ShipmentRecord        (terminal)                 │
//! │                                                                         │
//! │  No other edge exists. Status never moves backwards.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// The status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Paid for, waiting for the seller to hand it to a courier.
    PendingShipment,
    /// Handed to a courier; a shipment record exists.
    Shipped,
    /// Receipt confirmed by the buyer.
    Delivered,
}

impl OrderStatus {
    /// The single status reachable from this one, if any.
    pub const fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::PendingShipment => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    /// Checks whether `to` is the legal next status.
    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        self.next() == Some(to)
    }

    /// Validates a transition, returning the new status.
    ///
    /// ## Errors
    /// [`CoreError::InvalidTransition`] for every edge other than the two
    /// forward steps.
    pub fn transition(self, order_id: i64, to: OrderStatus) -> CoreResult<OrderStatus> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(CoreError::InvalidTransition {
                order_id,
                from: self,
                to,
            })
        }
    }

    /// A shipment record exists exactly when the order is past PendingShipment.
    #[inline]
    pub const fn has_shipment(self) -> bool {
        matches!(self, OrderStatus::Shipped | OrderStatus::Delivered)
    }

    /// Returns true if no further transition is possible.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            OrderStatus::PendingShipment => "Pending Shipment",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::PendingShipment
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
