use super::{CurrencyPair, Depth, Ticker, Trade};

/// Typed event decoded from one stream frame
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvent {
    Depth(Depth),
    Ticker(Ticker),
    Trade(Trade),
}

impl MarketEvent {
    pub fn pair(&self) -> &CurrencyPair {
        match self {
            MarketEvent::Depth(d) => &d.pair,
            MarketEvent::Ticker(t) => &t.pair,
            MarketEvent::Trade(t) => &t.pair,
        }
    }

    pub fn contract_type(&self) -> Option<&str> {
        match self {
            MarketEvent::Depth(d) => d.contract_type.as_deref(),
            MarketEvent::Ticker(t) => t.contract_type.as_deref(),
            MarketEvent::Trade(t) => t.contract_type.as_deref(),
        }
    }
}
