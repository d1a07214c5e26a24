//! Connection state and rate counters.
//!
//! The session is the provider's process-wide status object. The gateway
//! reads it live on every check and never caches its values.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// LimitKind
// ============================================================================

/// Call category with its own provider-enforced quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    /// Order and account requests.
    Trade,
    /// Quote and history queries.
    #[default]
    NonTrade,
    /// Streaming subscriptions.
    Subscribe,
}

impl LimitKind {
    /// All categories in provider code order.
    pub const ALL: [LimitKind; 3] = [Self::Trade, Self::NonTrade, Self::Subscribe];

    /// Provider code of this category.
    #[inline]
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Trade => 0,
            Self::NonTrade => 1,
            Self::Subscribe => 2,
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trade => "trade",
            Self::NonTrade => "non_trade",
            Self::Subscribe => "subscribe",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Provider connection status and remaining call budget.
pub trait Session: Send + Sync {
    /// Whether the provider is connected to its server.
    fn is_connected(&self) -> bool;

    /// Calls left in the current window for `kind`.
    fn limit_remain_count(&self, kind: LimitKind) -> i64;

    /// Milliseconds until the window for `kind` resets.
    fn limit_remain_time(&self, kind: LimitKind) -> u64;
}

// ============================================================================
// Tests
// ============================================================================
