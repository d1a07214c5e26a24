//! Cookie allocation with smallest-first reuse.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::identifiers::Cookie;

// ============================================================================
// CookieJar
// ============================================================================

/// Allocates cookies from a free list keyed by the smallest free integer.
///
/// A freed cookie is always handed out again before any never-issued one.
#[derive(Debug)]
pub struct CookieJar {
    free: BTreeSet<u32>,
    next: u32,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    /// Creates an empty jar. The first cookie issued is 1.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            free: BTreeSet::new(),
            next: 1,
        }
    }

    /// Issues the smallest available cookie.
    pub fn alloc(&mut self) -> Cookie {
        let raw = match self.free.pop_first() {
            Some(raw) => raw,
            None => {
                let raw = self.next;
                self.next += 1;
                raw
            }
        };
        // `next` starts at 1 and free only ever holds issued values.
        Cookie::new(raw).unwrap_or_else(|| unreachable!("cookie 0 is never issued"))
    }

    /// Returns a cookie to the free list. Freeing twice is a no-op.
    pub fn free(&mut self, cookie: Cookie) {
        let raw = cookie.get();
        if raw < self.next {
            self.free.insert(raw);
        }
    }

    /// Number of cookies currently issued.
    #[inline]
    #[must_use]
    pub fn issued(&self) -> usize {
        (self.next as usize - 1) - self.free.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
