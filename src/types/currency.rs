use std::collections::HashMap;

use alloy::primitives::Address;

use super::Generation;

/// Currency registered with the market.
///
/// Decimals are fixed at registration, the cache assumes they
/// never change for the same mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegisteredCurrency {
    mint: Address,
    decimals: u8,
    registrar: Address,
    registered_at: u64,
}

impl RegisteredCurrency {
    pub fn new(mint: Address, decimals: u8, registrar: Address, registered_at: u64) -> Self {
        Self {
            mint,
            decimals,
            registrar,
            registered_at,
        }
    }

    pub fn mint(&self) -> Address {
        self.mint
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Account that registered the currency.
    pub fn registrar(&self) -> Address {
        self.registrar
    }

    /// Registration timestamp in seconds.
    pub fn registered_at(&self) -> u64 {
        self.registered_at
    }
}

/// Immutable view of registered currencies produced by a single refresh.
#[derive(Clone, Debug, Default)]
pub struct CurrencySnapshot {
    generation: Generation,
    currencies: HashMap<Address, RegisteredCurrency>,
}

impl CurrencySnapshot {
    pub(crate) fn new(generation: Generation, currencies: HashMap<Address, RegisteredCurrency>) -> Self {
        Self {
            generation,
            currencies,
        }
    }

    /// Refresh generation this snapshot was produced by, `0` if the
    /// cache was never populated.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn get(&self, mint: &Address) -> Option<&RegisteredCurrency> {
        self.currencies.get(mint)
    }

    pub fn contains(&self, mint: &Address) -> bool {
        self.currencies.contains_key(mint)
    }

    pub fn len(&self) -> usize {
        self.currencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredCurrency> {
        self.currencies.values()
    }
}

impl FromIterator<RegisteredCurrency> for CurrencySnapshot {
    fn from_iter<T: IntoIterator<Item = RegisteredCurrency>>(iter: T) -> Self {
        Self::new(0, iter.into_iter().map(|c| (c.mint(), c)).collect())
    }
}
