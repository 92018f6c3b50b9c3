//! # Product Row Locks
//!
//! A non-blocking, per-product exclusive lock.
//!
//! ## Why
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite has no SELECT ... FOR UPDATE NOWAIT.                            │
//! │                                                                         │
//! │  purchase(product 7) ──► try_acquire(7) ──► Some(guard) ──► BEGIN ...   │
//! │  purchase(product 7) ──► try_acquire(7) ──► None ──► ConcurrencyConflict│
//! │                                                                         │
//! │  The guard outlives COMMIT / ROLLBACK and releases on drop.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One registry is shared by every clone of a `Database`, so the lock covers
//! all connections of the pool. It does not span processes; there the store's
//! own BUSY result takes over.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

/// Registry of product ids held by in-flight units of work.
#[derive(Debug, Clone, Default)]
pub struct RowLocks {
    held: Arc<Mutex<HashSet<i64>>>,
}

impl RowLocks {
    pub fn new() -> Self {
        RowLocks::default()
    }

    /// Takes the lock on `product_id`, or returns `None` at once if held.
    pub fn try_acquire(&self, product_id: i64) -> Option<RowLockGuard> {
        let inserted = self.lock_set().insert(product_id);
        if !inserted {
            debug!(product_id, "Row lock unavailable");
            return None;
        }
        Some(RowLockGuard {
            locks: self.clone(),
            product_id,
        })
    }

    /// Checks whether `product_id` is currently held.
    pub fn is_held(&self, product_id: i64) -> bool {
        self.lock_set().contains(&product_id)
    }

    // The set stays consistent even if a holder panicked mid-operation,
    // since insert and remove are single calls.
    fn lock_set(&self) -> MutexGuard<'_, HashSet<i64>> {
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Releases the product lock when dropped.
#[derive(Debug)]
pub struct RowLockGuard {
    locks: RowLocks,
    product_id: i64,
}

impl RowLockGuard {
    pub fn product_id(&self) -> i64 {
        self.product_id
    }
}

impl Drop for RowLockGuard {
    fn drop(&mut self) {
        self.locks.lock_set().remove(&self.product_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_fast() {
        let locks = RowLocks::new();
        let guard = locks.try_acquire(7).unwrap();
        assert_eq!(guard.product_id(), 7);
        assert!(locks.try_acquire(7).is_none());
        assert!(locks.try_acquire(8).is_some());
    }

    #[test]
    fn test_drop_releases() {
        let locks = RowLocks::new();
        {
            let _guard = locks.try_acquire(7).unwrap();
            assert!(locks.is_held(7));
        }
        assert!(!locks.is_held(7));
        assert!(locks.try_acquire(7).is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let locks = RowLocks::new();
        let other = locks.clone();
        let _guard = locks.try_acquire(1).unwrap();
        assert!(other.try_acquire(1).is_none());
    }

    #[test]
    fn test_exactly_one_thread_wins() {
        let locks = RowLocks::new();
        let start = Arc::new(std::sync::Barrier::new(8));
        let tried = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let start = start.clone();
                let tried = tried.clone();
                std::thread::spawn(move || {
                    start.wait();
                    let guard = locks.try_acquire(42);
                    // Keep the guard alive until every thread has tried.
                    tried.wait();
                    guard.is_some()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
