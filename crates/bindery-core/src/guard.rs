#![forbid(unsafe_code)]

//! Reference-counted loopback guard for breaking notification cycles.
//!
//! When two reactive systems are wired together bidirectionally, a mutation
//! on one side notifies the other, which writes back, which notifies again.
//! Code that performs such a mutation wraps it in a [`LoopbackScope`] for a
//! set of keys; re-entrant handlers check [`LoopbackGuard::contains`] and skip
//! instead of recursing.
//!
//! # Invariants
//!
//! 1. A key is locked iff its count is > 0; counts never go negative.
//! 2. Nested acquisitions of the same key are counted, so an inner scope
//!    exiting does not unlock a key still held by an outer scope.
//! 3. A [`LoopbackScope`] releases exactly the keys it acquired on every exit
//!    path, including unwinding.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unbalanced release | `release` of a key that is not held | `Error::NotLocked`, guard unchanged for that key |

use std::borrow::Borrow;
use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;

use ahash::AHashMap;

use crate::error::{Error, Result};

/// A counted set of locked keys.
///
/// Single-threaded; share it by reference or inside an `Rc`.
pub struct LoopbackGuard<K = String> {
    locked: RefCell<AHashMap<K, usize>>,
}

impl<K> Default for LoopbackGuard<K> {
    fn default() -> Self {
        Self {
            locked: RefCell::new(AHashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone + fmt::Debug> LoopbackGuard<K> {
    /// Create a guard with nothing locked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the lock count of each key.
    pub fn acquire(&self, keys: impl IntoIterator<Item = K>) {
        let mut locked = self.locked.borrow_mut();
        for key in keys {
            *locked.entry(key).or_insert(0) += 1;
        }
    }

    /// Decrement the lock count of each key, forgetting keys that reach zero.
    ///
    /// Releasing a key that is not held is a contract violation and returns
    /// [`Error::NotLocked`]; keys preceding it in `keys` have already been
    /// released.
    pub fn release(&self, keys: impl IntoIterator<Item = K>) -> Result<()> {
        let mut locked = self.locked.borrow_mut();
        for key in keys {
            match locked.get_mut(&key) {
                Some(count) if *count > 1 => *count -= 1,
                Some(_) => {
                    locked.remove(&key);
                }
                None => {
                    return Err(Error::NotLocked {
                        key: format!("{key:?}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether `key` is currently locked.
    #[must_use]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.locked.borrow().contains_key(key)
    }

    /// Lock count for `key` (zero when unlocked).
    #[must_use]
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.locked.borrow().get(key).copied().unwrap_or(0)
    }

    /// Whether no key is locked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locked.borrow().is_empty()
    }

    /// Snapshot of the locked keys and their counts.
    #[must_use]
    pub fn locked_items(&self) -> Vec<(K, usize)> {
        self.locked
            .borrow()
            .iter()
            .map(|(k, n)| (k.clone(), *n))
            .collect()
    }

    /// Acquire `keys` for the lifetime of the returned scope.
    #[must_use = "dropping the scope releases the keys immediately"]
    pub fn lock(&self, keys: impl IntoIterator<Item = K>) -> LoopbackScope<'_, K> {
        let keys: Vec<K> = keys.into_iter().collect();
        self.acquire(keys.iter().cloned());
        LoopbackScope { guard: self, keys }
    }

    /// Run `f` with `keys` locked, unless any of them is already locked.
    ///
    /// Returns `None` when skipped. This is the common handler shape:
    /// "if not already in progress, do the mutation under the lock".
    pub fn run_unlocked<R>(&self, key: K, f: impl FnOnce() -> R) -> Option<R> {
        if self.contains(&key) {
            return None;
        }
        let _scope = self.lock([key]);
        Some(f())
    }
}

impl<K: fmt::Debug> fmt::Debug for LoopbackGuard<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopbackGuard")
            .field("locked", &self.locked.borrow().len())
            .finish()
    }
}

/// RAII scope holding a set of keys locked on a [`LoopbackGuard`].
#[must_use = "dropping the scope releases the keys immediately"]
pub struct LoopbackScope<'a, K: Eq + Hash + Clone + fmt::Debug = String> {
    guard: &'a LoopbackGuard<K>,
    keys: Vec<K>,
}

impl<K: Eq + Hash + Clone + fmt::Debug> LoopbackScope<'_, K> {
    /// Keys held by this scope.
    #[must_use]
    pub fn keys(&self) -> &[K] {
        &self.keys
    }
}

impl<K: Eq + Hash + Clone + fmt::Debug> Drop for LoopbackScope<'_, K> {
    fn drop(&mut self) {
        let keys = std::mem::take(&mut self.keys);
        // The scope acquired these keys itself, so release cannot fail unless
        // someone released them behind its back.
        if let Err(err) = self.guard.release(keys) {
            tracing::warn!(%err, "loopback scope released an unheld key");
        }
    }
}
