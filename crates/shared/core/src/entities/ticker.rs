use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CurrencyPair;

/// 24h rolling ticker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub pair: CurrencyPair,
    /// Futures/swap qualifier, `None` for spot
    pub contract_type: Option<String>,
    pub last: Decimal,
    /// Best bid
    pub buy: Decimal,
    /// Best ask
    pub sell: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub vol: Decimal,
    /// Exchange timestamp in milliseconds
    pub date: u64,
}
