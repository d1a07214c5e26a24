//! Query and continuation contracts.
//!
//! A [`Query`] writes its input fields into the provider and hands out a
//! fresh [`Pager`] holding the paging state for one logical request. The
//! engine consults the pager after each delivered page.

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::provider::Provider;

// ============================================================================
// Query
// ============================================================================

/// One logical request against a provider.
pub trait Query: Send + 'static {
    /// Writes the query's input fields into `provider`.
    ///
    /// # Errors
    ///
    /// Returns the provider's error for the first field it rejects.
    fn serialize(&self, provider: &dyn Provider) -> Result<()>;

    /// Creates the continuation state for this request.
    ///
    /// Defaults to a single round trip.
    fn pager(&self) -> Box<dyn Pager> {
        Box::new(SinglePage)
    }
}

// ============================================================================
// Pager
// ============================================================================

/// Continuation predicate with its mutable paging state.
///
/// Called once per delivered page, on the thread that owns the provider.
/// May rewrite provider input fields to shape the next round trip.
pub trait Pager: Send + 'static {
    /// Decides whether another round trip is needed.
    ///
    /// # Errors
    ///
    /// Returns provider errors raised while reading the response or
    /// rewriting inputs.
    fn has_more(&mut self, provider: &dyn Provider) -> Result<bool>;

    /// Records still owed to the caller, for count-driven pagers.
    fn remaining(&self) -> Option<u64> {
        None
    }
}

/// Pager for single-shot products. Never continues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinglePage;

impl Pager for SinglePage {
    fn has_more(&mut self, _provider: &dyn Provider) -> Result<bool> {
        Ok(false)
    }
}
