use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CurrencyPair, TradeSide};
use crate::values::{Amount, Price};

/// Public trade print
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Exchange trade id
    pub tid: i64,
    pub side: TradeSide,
    pub amount: Amount,
    pub price: Price,
    /// Exchange timestamp in milliseconds
    pub date: i64,
    pub pair: CurrencyPair,
    /// Futures/swap qualifier, `None` for spot
    pub contract_type: Option<String>,
}

impl Trade {
    /// Returns the notional value of the trade (price * amount)
    pub fn notional(&self) -> Decimal {
        self.price * self.amount
    }
}
