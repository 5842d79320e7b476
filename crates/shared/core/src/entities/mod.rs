pub mod contract;
mod currency;
mod depth;
mod event;
mod side;
mod ticker;
mod trade;

pub use currency::{CurrencyPair, PairParseError};
pub use depth::{Depth, DepthRecord};
pub use event::MarketEvent;
pub use side::TradeSide;
pub use ticker::Ticker;
pub use trade::Trade;
