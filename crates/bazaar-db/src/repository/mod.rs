//! # Repository Module
//!
//! Database repository implementations for Bazaar.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Units of Work                       │
//! │                                                                         │
//! │  Transport layer (verified Actor)                                      │
//! │       │                                                                 │
//! │       │  db.purchases().purchase(&actor, &request)                     │
//! │       ▼                                                                 │
//! │  Repository method                                                     │
//! │  ├── role + input checks (no I/O)                                      │
//! │  ├── row lock (writes on products only)                                │
//! │  ├── pool.begin(), or begin_write() when reads precede writes          │
//! │  ├── steps on &mut SqliteConnection                                    │
//! │  └── finish(): COMMIT, or ROLLBACK + warn! with the classified kind    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalogue reads and the seller write path
//! - [`ProfileRepository`](profile::ProfileRepository) - Buyer and seller profile rows
//! - [`PurchaseRepository`](purchase::PurchaseRepository) - The purchase transaction coordinator
//! - [`OrderRepository`](order::OrderRepository) - Ship / confirm-delivery and tracking reads

pub mod order;
pub mod product;
pub mod profile;
pub mod purchase;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::warn;

use crate::error::DbResult;

/// Starts a unit of work that holds the database write lock from `BEGIN`.
///
/// Units of work that read before they write start here. A concurrent
/// writer then waits out the busy timeout at `BEGIN` instead of failing
/// later on a stale read snapshot.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Ends a unit of work: commits on success, rolls back on failure.
///
/// The rollback is explicit so the connection goes back to the pool clean
/// before the error reaches the caller.
pub(crate) async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    operation: &'static str,
    result: DbResult<T>,
) -> DbResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(operation, error = %rollback_err, "Rollback failed");
            }
            warn!(operation, kind = ?err.kind(), error = %err, "Unit of work rolled back");
            Err(err)
        }
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================
