//! Cambist Core Domain
//!
//! Exchange-neutral market-data types shared by the streaming client and the
//! exchange adapters. This crate contains no async and no I/O.
//!
//! - [`entities`]: currency pairs, depth snapshots, tickers, trades
//! - [`normalize`]: turns wire-format bid/ask levels into canonical depth lists
//! - [`coerce`]: permissive numeric decoding of exchange JSON
//! - [`cache`]: explicitly-owned metadata cache with a TTL refresh policy

pub mod cache;
pub mod clock;
pub mod coerce;
pub mod entities;
pub mod normalize;
pub mod values;

// Re-export commonly used types at crate root
pub use cache::MetadataCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use entities::{
    contract, CurrencyPair, Depth, DepthRecord, MarketEvent, PairParseError, Ticker, Trade,
    TradeSide,
};
pub use normalize::{normalize, normalize_records, parse_level};
pub use values::{Amount, Price, Timestamp};
