use alloy::primitives::Address;
use fastnum::UD64;

/// Side of the order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Decodes the raw side discriminant emitted by the program.
    ///
    /// Only `0` means [`OrderSide::Buy`], every other value is treated
    /// as [`OrderSide::Sell`], see [`Self::is_known_discriminant`].
    pub fn from_discriminant(value: u8) -> Self {
        match value {
            0 => OrderSide::Buy,
            _ => OrderSide::Sell,
        }
    }

    pub fn is_known_discriminant(value: u8) -> bool {
        value <= 1
    }
}

/// Order as seen by the consumer, with price normalized by
/// the decimals of its quote currency.
#[derive(Clone, PartialEq, derive_more::Debug)]
pub struct Order {
    id: String,
    side: OrderSide,
    asset_mint: Address,
    currency_mint: Address,
    #[debug("{price}")]
    price: UD64,
    quantity_remaining: u64,
    origination_quantity: u64,
    owner: Address,
    owner_asset_account: Address,
    owner_currency_account: Address,
    created_at: i64,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        side: OrderSide,
        asset_mint: Address,
        currency_mint: Address,
        price: UD64,
        quantity_remaining: u64,
        origination_quantity: u64,
        owner: Address,
        owner_asset_account: Address,
        owner_currency_account: Address,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            side,
            asset_mint,
            currency_mint,
            price,
            quantity_remaining,
            origination_quantity,
            owner,
            owner_asset_account,
            owner_currency_account,
            created_at,
        }
    }

    /// Order identifier, decimal form of the on-chain order handle.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    /// Mint of the traded asset.
    pub fn asset_mint(&self) -> Address {
        self.asset_mint
    }

    /// Mint of the quote currency the price is expressed in.
    pub fn currency_mint(&self) -> Address {
        self.currency_mint
    }

    pub fn price(&self) -> UD64 {
        self.price
    }

    pub fn quantity_remaining(&self) -> u64 {
        self.quantity_remaining
    }

    pub fn origination_quantity(&self) -> u64 {
        self.origination_quantity
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn owner_asset_account(&self) -> Address {
        self.owner_asset_account
    }

    pub fn owner_currency_account(&self) -> Address {
        self.owner_currency_account
    }

    /// Creation timestamp in seconds, as supplied by the program.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }
}
