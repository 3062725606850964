//! Bindings of the on-chain market program.

use crate::types::{CurrencyLog, OrderLog, RawEvent};

#[allow(clippy::too_many_arguments)]
pub mod market {
    alloy::sol!(
        #[derive(Debug, PartialEq)]
        #[sol(rpc)]
        contract Market {
            /// Currency registered with the market, as returned by the view.
            struct RegisteredCurrency {
                address mint;
                uint8 decimals;
                address registrar;
                uint64 registeredAt;
            }

            event OrderCreated(
                uint64 orderId,
                uint8 side,
                address assetMint,
                address currencyMint,
                uint64 price,
                uint64 quantityRemaining,
                uint64 originationQuantity,
                address owner,
                address ownerAssetAccount,
                address ownerCurrencyAccount,
                int64 createdAt
            );

            event OrderExchanged(
                uint64 orderId,
                uint8 side,
                address assetMint,
                address currencyMint,
                uint64 price,
                uint64 quantityRemaining,
                uint64 originationQuantity,
                address owner,
                address ownerAssetAccount,
                address ownerCurrencyAccount,
                int64 createdAt
            );

            event OrderCanceled(
                uint64 orderId,
                uint8 side,
                address assetMint,
                address currencyMint,
                uint64 price,
                uint64 quantityRemaining,
                uint64 originationQuantity,
                address owner,
                address ownerAssetAccount,
                address ownerCurrencyAccount,
                int64 createdAt
            );

            event CurrencyRegistered(address mint, uint8 decimals, address registrar);

            function getRegisteredCurrencies() external view returns (RegisteredCurrency[] memory currencies);
        }
    );
}

macro_rules! order_log_from {
    ($event:ty) => {
        impl From<$event> for OrderLog {
            fn from(e: $event) -> Self {
                OrderLog {
                    order_id: e.orderId,
                    side: e.side,
                    asset_mint: e.assetMint,
                    currency_mint: e.currencyMint,
                    price: e.price,
                    quantity_remaining: e.quantityRemaining,
                    origination_quantity: e.originationQuantity,
                    owner: e.owner,
                    owner_asset_account: e.ownerAssetAccount,
                    owner_currency_account: e.ownerCurrencyAccount,
                    created_at: e.createdAt,
                }
            }
        }
    };
}

order_log_from!(market::Market::OrderCreated);
order_log_from!(market::Market::OrderExchanged);
order_log_from!(market::Market::OrderCanceled);

impl From<market::Market::MarketEvents> for RawEvent {
    fn from(value: market::Market::MarketEvents) -> Self {
        use market::Market::MarketEvents;
        match value {
            MarketEvents::OrderCreated(e) => RawEvent::OrderCreated(e.into()),
            MarketEvents::OrderExchanged(e) => RawEvent::OrderExchanged(e.into()),
            MarketEvents::OrderCanceled(e) => RawEvent::OrderCanceled(e.into()),
            MarketEvents::CurrencyRegistered(e) => RawEvent::CurrencyRegistered(CurrencyLog {
                mint: e.mint,
                decimals: e.decimals,
                registrar: e.registrar,
            }),
        }
    }
}
