//! # bazaar-db: Database Layer for Bazaar
//!
//! This crate owns every read and write of the Bazaar marketplace's
//! purchase and order data. It uses SQLite through sqlx, and every
//! multi-row write runs as one unit of work.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Data Flow                                 │
//! │                                                                         │
//! │  Transport layer (verified Actor: user id + role)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    bazaar-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ PurchaseRepo  │    │ 001_initial_ │  │   │
//! │  │   │ RowLocks      │    │ OrderRepo     │    │   schema.sql │  │   │
//! │  │   │               │    │ ProfileRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  │                BAZAAR_DATABASE_PATH (./bazaar.db)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment configuration
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`lock`] - Non-blocking per-product row locks
//! - [`error`] - Database error types and the storage error classifier
//! - [`repository`] - Products, profiles, purchases and orders
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazaar_core::{Actor, PurchaseRequest};
//! use bazaar_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let buyer = Actor::buyer(42);
//! let receipt = db
//!     .purchases()
//!     .purchase(&buyer, &PurchaseRequest::single_unit(7, "bkash"))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod lock;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::ConfigError;
pub use error::{DbError, DbResult};
pub use lock::{RowLockGuard, RowLocks};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::profile::ProfileRepository;
pub use repository::purchase::PurchaseRepository;
