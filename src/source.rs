//! Currency query collaborator.

use std::future::Future;

use alloy::providers::Provider;
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    Market,
    abi::market::Market::{self as MarketAbi, MarketInstance},
    error::FeedError,
    types::RegisteredCurrency,
};

/// Source of the complete set of registered currencies.
pub trait CurrencySource: Send + Sync + 'static {
    /// Fetches all currencies registered with the market.
    ///
    /// Implementations may serve a previously fetched result unless
    /// `force_refresh` is set.
    fn fetch_all_registered_currencies(
        &self,
        force_refresh: bool,
    ) -> impl Future<Output = Result<Vec<RegisteredCurrency>, FeedError>> + Send;
}

/// [`CurrencySource`] reading `getRegisteredCurrencies()` view of the market program.
pub struct ContractCurrencySource<P> {
    instance: MarketInstance<P>,
    last: Mutex<Option<Vec<RegisteredCurrency>>>,
}

impl<P: Provider> ContractCurrencySource<P> {
    pub fn new(market: &Market, provider: P) -> Self {
        Self {
            instance: MarketAbi::new(market.address(), provider),
            last: Mutex::new(None),
        }
    }
}

impl<P: Provider + Send + Sync + 'static> CurrencySource for ContractCurrencySource<P> {
    async fn fetch_all_registered_currencies(
        &self,
        force_refresh: bool,
    ) -> Result<Vec<RegisteredCurrency>, FeedError> {
        if !force_refresh {
            let last = self.last.lock().clone();
            if let Some(last) = last {
                debug!(count = last.len(), "Serving memoized registered currencies");
                return Ok(last);
            }
        }

        let currencies: Vec<RegisteredCurrency> = self
            .instance
            .getRegisteredCurrencies()
            .call()
            .await?
            .into_iter()
            .map(|c| RegisteredCurrency::new(c.mint, c.decimals, c.registrar, c.registeredAt))
            .collect();

        debug!(count = currencies.len(), "Fetched registered currencies");
        *self.last.lock() = Some(currencies.clone());
        Ok(currencies)
    }
}
