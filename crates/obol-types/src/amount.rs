//! Monetary amounts.

/// Amount in satoshi units. Signed, as fee math can go negative.
pub type Amount = i64;

/// One coin in satoshi units.
pub const COIN: Amount = 100_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_unit() {
        assert_eq!(COIN, 100_000_000);
        assert_eq!(32 * COIN, 3_200_000_000);
    }
}
