use serde::{Deserialize, Serialize};

/// Aggressor side of a public trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Adapt an exchange direction string (`buy`, `BUY`, `bid`, `sell`, `ask`, ...)
    pub fn adapt(direction: &str) -> Option<Self> {
        match direction.to_ascii_lowercase().as_str() {
            "buy" | "bid" | "b" => Some(TradeSide::Buy),
            "sell" | "ask" | "s" => Some(TradeSide::Sell),
            _ => None,
        }
    }

    /// Side implied by Binance's "buyer is maker" flag: a maker buyer means
    /// the aggressor sold.
    pub fn from_buyer_maker(is_buyer_maker: bool) -> Self {
        if is_buyer_maker {
            TradeSide::Sell
        } else {
            TradeSide::Buy
        }
    }
}
