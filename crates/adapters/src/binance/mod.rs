//! Binance spot and futures market data

pub mod futures;
pub mod parser;
pub mod spot;
pub mod symbols;

pub use futures::{
    BINANCE_COIN_FUTURES_URL, BINANCE_USDT_FUTURES_URL, BinanceFuturesParser, BinanceFuturesWs,
};
pub use spot::{BINANCE_SPOT_URL, BinanceSpotParser, BinanceSpotWs};
pub use symbols::{ContractInfo, FuturesSymbols, StaticSymbols, SymbolSource};
