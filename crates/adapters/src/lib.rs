//! Cambist Adapters
//!
//! Exchange-specific [`FrameParser`](cambist_stream::FrameParser)
//! implementations and the facades that pair them with a
//! [`StreamClient`](cambist_stream::StreamClient).
//!
//! | Facade | Endpoint | Compression |
//! |--------|----------|-------------|
//! | [`HuobiSpotWs`] | `api.huobi.pro/ws` | gzip |
//! | [`HuobiSwapWs`] | `api.hbdm.com/swap-ws`, `linear-swap-ws` | gzip |
//! | [`BinanceSpotWs`] | `stream.binance.com:9443/stream` | none |
//! | [`BinanceFuturesWs`] | `fstream` + `dstream.binance.com/ws` | none |
//!
//! Every facade connects lazily on its first subscription and picks up a
//! proxy from `HTTPS_PROXY` unless one is configured.

mod common;
pub mod binance;
pub mod error;
pub mod huobi;

pub use binance::{
    BinanceFuturesParser, BinanceFuturesWs, BinanceSpotParser, BinanceSpotWs, ContractInfo,
    FuturesSymbols, StaticSymbols, SymbolSource,
};
pub use error::AdapterError;
pub use huobi::{HuobiSpotParser, HuobiSpotWs, HuobiSwapParser, HuobiSwapWs};
