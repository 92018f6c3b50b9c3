//! # Database Error Types
//!
//! Error types for database operations, and the classifier that maps raw
//! store failures onto the stable [`ErrorKind`] taxonomy.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          CoreError (rule failure)          │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  From<sqlx::Error> ← classifier     DbError::Domain                     │
//! │       │                                   │                             │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │  unit of work rolls back, DbError::kind() logged                       │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │  DbError::report() → ErrorReport { kind, message, retryable }          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Classification
//! ```text
//! SQLITE_BUSY (5) / SQLITE_LOCKED (6), any extended code  → ConcurrencyConflict
//! "database is locked" / "database table is locked"       → ConcurrencyConflict
//! FOREIGN KEY constraint failed                           → IntegrityViolation
//! UNIQUE constraint failed                                → ValidationError
//! RowNotFound                                             → NotFound
//! everything else                                         → InternalError
//! ```

use bazaar_core::{CoreError, ErrorKind, ErrorReport, ValidationError};
use sqlx::error::DatabaseError;
use thiserror::Error;
use tracing::error;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A business rule rejected the unit of work.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The row (or the store's write lock) is held by another unit of work.
    ///
    /// ## When This Occurs
    /// - Another purchase or product update holds the product row lock
    /// - SQLite reported BUSY/LOCKED for the write
    #[error("{message}")]
    LockUnavailable { message: String },

    /// Foreign key constraint violation, i.e. a missing dependent row.
    ///
    /// ## When This Occurs
    /// - Purchase by a buyer without a profile row
    /// - Listing a product for a seller without a profile row
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Unique constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// The product row is held by another in-flight unit of work.
    pub fn row_locked(product_id: i64) -> Self {
        DbError::LockUnavailable {
            message: format!("Product {product_id} is locked by another purchase, try again"),
        }
    }

    /// Maps the error onto the stable taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::Domain(err) => err.kind(),
            DbError::LockUnavailable { .. } => ErrorKind::ConcurrencyConflict,
            DbError::ForeignKeyViolation { .. } => ErrorKind::IntegrityViolation,
            DbError::UniqueViolation { .. } => ErrorKind::ValidationError,
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::PoolExhausted
            | DbError::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Returns true if the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Builds the payload handed to the transport layer.
    ///
    /// Store internals are logged here and replaced by a generic message.
    pub fn report(&self) -> ErrorReport {
        let kind = self.kind();
        let message = match kind {
            ErrorKind::InternalError => {
                error!(error = %self, "Unclassified store failure");
                "Internal database error".to_string()
            }
            ErrorKind::IntegrityViolation => {
                "A required buyer or seller profile does not exist".to_string()
            }
            _ => self.to_string(),
        };
        ErrorReport::new(kind, message)
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Lock contention shows up as BUSY or LOCKED, possibly as an extended code
/// such as BUSY_SNAPSHOT (517).
fn is_lock_unavailable(err: &dyn DatabaseError) -> bool {
    let primary = err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .map(|code| code & 0xff);

    if matches!(primary, Some(SQLITE_BUSY) | Some(SQLITE_LOCKED)) {
        return true;
    }

    let msg = err.message();
    msg.contains("database is locked") || msg.contains("database table is locked")
}

/// Convert sqlx errors to DbError. This is the store error classifier.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → lock / foreign key / unique / query failure
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                if is_lock_unavailable(&*db_err) {
                    return DbError::LockUnavailable { message: msg };
                }

                match db_err.kind() {
                    sqlx::error::ErrorKind::ForeignKeyViolation => {
                        DbError::ForeignKeyViolation { message: msg }
                    }
                    sqlx::error::ErrorKind::UniqueViolation => {
                        // "UNIQUE constraint failed: <table>.<column>"
                        let field = msg
                            .split("UNIQUE constraint failed: ")
                            .nth(1)
                            .unwrap_or("unknown")
                            .to_string();
                        DbError::UniqueViolation {
                            field,
                            value: "unknown".to_string(),
                        }
                    }
                    _ => DbError::QueryFailed(msg),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_pool_timeout_is_internal() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_row_locked_is_retryable() {
        let err = DbError::row_locked(7);
        assert_eq!(err.kind(), ErrorKind::ConcurrencyConflict);
        let report = err.report();
        assert!(report.retryable);
        assert_eq!(
            report.message,
            "Product 7 is locked by another purchase, try again"
        );
    }

    #[test]
    fn test_domain_errors_keep_their_kind() {
        let err: DbError = CoreError::OutOfStock {
            product_id: 1,
            available: 0,
            requested: 1,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::OutOfStock);
        assert!(!err.report().retryable);

        let err: DbError = ValidationError::Required {
            field: "payment_method".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_internal_report_hides_details() {
        let err = DbError::QueryFailed("no such table: prodcts".to_string());
        let report = err.report();
        assert_eq!(report.kind, ErrorKind::InternalError);
        assert!(!report.message.contains("prodcts"));
    }
}
