//! Contract type qualifiers attached to futures and swap events.
//!
//! Spot events carry no contract type. Exchanges that identify delivery
//! contracts by their own symbol (e.g. `BTCUSD_PERP`) report that symbol
//! verbatim instead of one of these constants.

/// Coin-margined perpetual swap
pub const SWAP: &str = "swap";
/// USDT-margined perpetual swap
pub const SWAP_USDT: &str = "swap-usdt";
pub const THIS_WEEK: &str = "this_week";
pub const NEXT_WEEK: &str = "next_week";
pub const QUARTER: &str = "quarter";
pub const BI_QUARTER: &str = "bi_quarter";

/// Returns true for perpetual swap qualifiers
pub fn is_swap(contract_type: &str) -> bool {
    contract_type == SWAP || contract_type == SWAP_USDT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_swap() {
        assert!(is_swap(SWAP));
        assert!(is_swap(SWAP_USDT));
        assert!(!is_swap(QUARTER));
        assert!(!is_swap("BTCUSD_PERP"));
    }
}
