//! Type-safe identifiers for workers, listener registrations and transactions.
//!
//! Newtype wrappers prevent mixing incompatible IDs at compile time.
//!
//! | Type | Source | Example |
//! |------|--------|---------|
//! | [`Cookie`] | Worker listener registry | `3` |
//! | [`WorkerId`] | Pool creation index | `worker#0` |
//! | [`TransactionId`] | Generated per logical request | `9b2c...` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Cookie
// ============================================================================

/// Handle of one active event-listener registration on a worker.
///
/// Cookies start at 1 and are only meaningful on the worker that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cookie(NonZeroU32);

impl Cookie {
    /// Creates a cookie from a raw value. Returns `None` for 0.
    #[inline]
    #[must_use]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// WorkerId
// ============================================================================

/// Zero-based index a worker was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(usize);

impl WorkerId {
    /// Creates a worker ID from a pool index.
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the pool index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker#{}", self.0)
    }
}

// ============================================================================
// TransactionId
// ============================================================================

/// Identifier of one logical request, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Generates a new random transaction ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_rejects_zero() {
        assert!(Cookie::new(0).is_none());
        assert_eq!(Cookie::new(5).map(Cookie::get), Some(5));
    }

    #[test]
    fn test_cookie_ordering() {
        let one = Cookie::new(1).unwrap();
        let two = Cookie::new(2).unwrap();
        assert!(one < two);
    }

    #[test]
    fn test_worker_id_display() {
        assert_eq!(WorkerId::new(3).to_string(), "worker#3");
    }

    #[test]
    fn test_transaction_ids_are_unique() {
        assert_ne!(TransactionId::generate(), TransactionId::generate());
    }

    #[test]
    fn test_cookie_serde_transparent() {
        let cookie = Cookie::new(7).unwrap();
        assert_eq!(serde_json::to_string(&cookie).unwrap(), "7");
    }
}
