//! Currency metadata cache.
//!
//! Holds the decimals of every registered currency, needed to normalize order
//! prices. The whole mapping is replaced on every refresh: readers get an
//! immutable [`CurrencySnapshot`] behind an [`Arc`] and never observe entries
//! from two different refreshes mixed together.

use std::sync::Arc;

use alloy::primitives::Address;
use itertools::Itertools;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    error::FeedError,
    source::CurrencySource,
    types::{CurrencySnapshot, Generation, RegisteredCurrency},
};

/// Cache of registered currencies, refreshed wholesale from a [`CurrencySource`].
pub struct CurrencyCache<Q> {
    source: Arc<Q>,
    current: RwLock<Arc<CurrencySnapshot>>,
    // Serializes refreshes and tracks the last produced generation
    last_generation: Mutex<Generation>,
}

impl<Q: CurrencySource> CurrencyCache<Q> {
    pub fn new(source: Arc<Q>) -> Self {
        Self {
            source,
            current: RwLock::new(Arc::new(CurrencySnapshot::default())),
            last_generation: Mutex::new(0),
        }
    }

    /// Initial population of the cache.
    ///
    /// Unlike later refreshes, failure here leaves the cache unusable, so the
    /// error is wrapped into [`FeedError::Bootstrap`] for the caller to handle.
    ///
    /// The source may serve a memoized result to the very first bootstrap only.
    /// Repeated bootstrap (e.g. retried initialization) always refetches, since
    /// currencies may have been registered in between.
    pub async fn bootstrap(&self) -> Result<Generation, FeedError> {
        let force_refresh = *self.last_generation.lock().await > 0;
        self.refresh(force_refresh)
            .await
            .map_err(|e| FeedError::Bootstrap(Box::new(e)))
    }

    /// Fetches the complete set of registered currencies and atomically
    /// replaces the current mapping.
    ///
    /// Concurrent refreshes are applied one at a time in the order they acquire
    /// the refresh lock. If the fetch fails, the current mapping is retained.
    pub async fn refresh(&self, force_refresh: bool) -> Result<Generation, FeedError> {
        let mut last_generation = self.last_generation.lock().await;

        let currencies = self
            .source
            .fetch_all_registered_currencies(force_refresh)
            .await?;

        for mint in currencies.iter().map(RegisteredCurrency::mint).duplicates() {
            debug!(%mint, "Currency listed more than once, keeping the last entry");
        }

        let generation = *last_generation + 1;
        let snapshot = Arc::new(CurrencySnapshot::new(
            generation,
            currencies.into_iter().map(|c| (c.mint(), c)).collect(),
        ));
        let count = snapshot.len();
        *self.current.write() = snapshot;
        *last_generation = generation;

        debug!(generation, count, "Currency cache refreshed");
        Ok(generation)
    }

    /// Currency registered under the given mint, as of the last completed refresh.
    pub fn lookup(&self, mint: &Address) -> Option<RegisteredCurrency> {
        self.current.read().get(mint).copied()
    }

    /// Complete view produced by the last completed refresh.
    pub fn snapshot(&self) -> Arc<CurrencySnapshot> {
        self.current.read().clone()
    }

    /// Generation of the current mapping, `0` until the first refresh completes.
    pub fn generation(&self) -> Generation {
        self.current.read().generation()
    }

    /// Drops all entries.
    pub fn clear(&self) {
        *self.current.write() = Arc::new(CurrencySnapshot::default());
    }
}
