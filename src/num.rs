use alloy::primitives::U256;
use fastnum::{
    UD64, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// Fixed-point to decimal converter.
///
/// Raw on-chain amounts are integers scaled by `10^decimals` of the
/// corresponding currency, conversion is exact.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn from_unsigned<const N: usize>(&self, value: U256) -> UnsignedDecimal<N> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<N>");
        UnsignedDecimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    pub fn from_u64(&self, value: u64) -> UD64 {
        self.from_unsigned(U256::from(value))
    }
}
