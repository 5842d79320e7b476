use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::CurrencyPair;
use crate::values::{Amount, Price, Timestamp};

/// A single (price, amount) level of an order book side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthRecord {
    pub price: Price,
    pub amount: Amount,
}

impl DepthRecord {
    pub fn new(price: Price, amount: Amount) -> Self {
        DepthRecord { price, amount }
    }
}

impl From<(Price, Amount)> for DepthRecord {
    fn from((price, amount): (Price, Amount)) -> Self {
        DepthRecord { price, amount }
    }
}

/// Order book snapshot delivered by one book message
///
/// Ordering contract (see [`crate::normalize`]):
/// - `asks` are strictly descending by price, so the best ask is the last entry
/// - `bids` keep the order the exchange delivered them in
///
/// A `Depth` is rebuilt from every book message; it is never merged with a
/// previous snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depth {
    pub pair: CurrencyPair,
    /// Futures/swap qualifier, `None` for spot
    pub contract_type: Option<String>,
    pub updated_at: Timestamp,
    pub bids: Vec<DepthRecord>,
    pub asks: Vec<DepthRecord>,
}

impl Depth {
    pub fn new(pair: CurrencyPair, bids: Vec<DepthRecord>, asks: Vec<DepthRecord>) -> Self {
        Depth {
            pair,
            contract_type: None,
            updated_at: Utc::now(),
            bids,
            asks,
        }
    }

    pub fn with_contract_type(mut self, contract_type: impl Into<String>) -> Self {
        self.contract_type = Some(contract_type.into());
        self
    }

    pub fn with_updated_at(mut self, updated_at: Timestamp) -> Self {
        self.updated_at = updated_at;
        self
    }

    /// Highest bid price level
    pub fn best_bid(&self) -> Option<&DepthRecord> {
        self.bids.iter().max_by(|a, b| a.price.cmp(&b.price))
    }

    /// Lowest ask price level (last entry given descending asks)
    pub fn best_ask(&self) -> Option<&DepthRecord> {
        self.asks.last()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
