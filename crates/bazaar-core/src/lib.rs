//! # bazaar-core: Pure Business Logic for the Bazaar Marketplace
//!
//! This crate holds the rules of the purchase and order lifecycle as pure
//! functions with zero I/O dependencies. The database crate (`bazaar-db`)
//! runs these rules inside its transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Transport + Authorization (outside this workspace)     │   │
//! │  │    verified (user id, role) ──► Actor                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   order   │  │ delivery  │  │ validation│  │   │
//! │  │   │  Product  │  │  status   │  │  Courier  │  │   rules   │  │   │
//! │  │   │  Order    │  │  machine  │  │  ETA      │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bazaar-db (Database Layer)                   │   │
//! │  │        row locks, transactions, repositories, classifier       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, OrderLine, PaymentRecord, ...)
//! - [`identity`] - The verified caller (`Actor`, `Role`)
//! - [`order`] - Order status state machine rules
//! - [`delivery`] - Courier allow-list and the delivery ETA calculator
//! - [`tracking`] - Tracking report and milestone timeline
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Error taxonomy and domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::delivery::expected_delivery;
//! use chrono::{TimeZone, Utc};
//!
//! let shipped = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
//! let eta = expected_delivery("Royal Bengal Ilish Mach Logistics", shipped);
//! assert_eq!(eta, Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod delivery;
pub mod error;
pub mod identity;
pub mod money;
pub mod order;
pub mod tracking;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use delivery::Courier;
pub use error::{CoreError, CoreResult, ErrorKind, ErrorReport, ValidationError};
pub use identity::{Actor, Role};
pub use money::Money;
pub use order::OrderStatus;
pub use tracking::{Milestone, MilestoneStage, TrackingReport};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single product in one purchase.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_PURCHASE_QUANTITY: i64 = 999;

/// Transit days assumed for a courier that is not in the ETA table.
pub const DEFAULT_TRANSIT_DAYS: i64 = 3;

/// Maximum number of rows returned by the seller order listing.
pub const SELLER_ORDER_LIMIT: i64 = 50;
