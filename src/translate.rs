//! Raw event to [`Order`] translation.

use crate::{
    num,
    types::{CurrencySnapshot, Order, OrderLog, OrderSide},
};

/// Translates raw order event into an [`Order`], normalizing the price by
/// the decimals of the quote currency.
///
/// Returns `None` if the currency is not present in the snapshot: such event
/// can not be translated and is not retried.
pub fn translate(event: &OrderLog, currencies: &CurrencySnapshot) -> Option<Order> {
    let currency = currencies.get(&event.currency_mint)?;
    let price_converter = num::Converter::new(currency.decimals());

    Some(Order::new(
        event.order_id.to_string(),
        OrderSide::from_discriminant(event.side),
        event.asset_mint,
        event.currency_mint,
        price_converter.from_u64(event.price),
        event.quantity_remaining,
        event.origination_quantity,
        event.owner,
        event.owner_asset_account,
        event.owner_currency_account,
        event.created_at,
    ))
}
