//! Huobi spot and perpetual swap market data

pub mod parser;
pub mod spot;
pub mod swap;

pub use spot::{HUOBI_SPOT_URL, HuobiSpotParser, HuobiSpotWs};
pub use swap::{HUOBI_LINEAR_SWAP_URL, HUOBI_SWAP_URL, HuobiSwapParser, HuobiSwapWs};
