use cambist_core::{CurrencyPair, Depth, MarketEvent, Ticker, coerce, contract};
use cambist_stream::{
    Compression, DecodeError, DepthListener, FrameParser, GlobalConfig, MessageKind, StreamBuilder,
    StreamClient, StreamEntry, TickerListener, TradeListener,
};
use serde_json::{Value, json};

use super::parser;
use crate::common::{Slot, base_builder, subscribe_with_listener};
use crate::error::AdapterError;

/// Coin-margined perpetual swaps
pub const HUOBI_SWAP_URL: &str = "wss://api.hbdm.com/swap-ws";
/// USDT-margined perpetual swaps
pub const HUOBI_LINEAR_SWAP_URL: &str = "wss://api.hbdm.com/linear-swap-ws";

/// Pair and contract type from a swap channel such as `market.BTC-USD.detail`
///
/// USD-quoted contracts are coin-margined (`swap`), everything else is
/// USDT-margined (`swap-usdt`).
pub fn pair_and_contract(ch: &str) -> Result<(CurrencyPair, &'static str), DecodeError> {
    let symbol = parser::channel_symbol(ch)
        .ok_or_else(|| DecodeError::Malformed(format!("channel without symbol: {ch}")))?;
    let pair = CurrencyPair::from_symbol(symbol, "-")?;
    let contract_type = if pair.quote == "USD" {
        contract::SWAP
    } else {
        contract::SWAP_USDT
    };
    Ok((pair, contract_type))
}

/// Huobi perpetual swap frames (both margin types share one format)
pub struct HuobiSwapParser {
    depth_limit: usize,
}

impl HuobiSwapParser {
    pub fn new(depth_limit: usize) -> Self {
        Self { depth_limit }
    }
}

impl Default for HuobiSwapParser {
    fn default() -> Self {
        Self::new(20)
    }
}

impl FrameParser for HuobiSwapParser {
    fn name(&self) -> &str {
        "huobi-swap"
    }

    fn heartbeat_reply(&self, payload: &[u8]) -> Option<Vec<u8>> {
        parser::heartbeat_reply(payload)
    }

    fn classify(&self, msg: &Value) -> MessageKind {
        parser::channel(msg)
            .map(parser::classify_channel)
            .unwrap_or(MessageKind::Unrecognized)
    }

    fn decode(&self, kind: MessageKind, msg: &Value) -> Result<Vec<MarketEvent>, DecodeError> {
        let ch = parser::channel(msg).ok_or(DecodeError::MissingField("ch"))?;
        let (pair, contract_type) = pair_and_contract(ch)?;
        let tick = parser::tick(msg)?;

        match kind {
            MessageKind::Depth => {
                let (bids, asks) = parser::depth_levels(tick, self.depth_limit)?;
                let depth = Depth::new(pair, bids, asks)
                    .with_contract_type(contract_type)
                    .with_updated_at(parser::frame_time(msg));
                Ok(vec![MarketEvent::Depth(depth)])
            }
            MessageKind::Ticker => Ok(vec![MarketEvent::Ticker(Ticker {
                pair,
                contract_type: Some(contract_type.to_string()),
                last: coerce::field_decimal(tick, "close"),
                high: coerce::field_decimal(tick, "high"),
                low: coerce::field_decimal(tick, "low"),
                vol: coerce::field_decimal(tick, "amount"),
                date: u64::try_from(parser::frame_time(msg).timestamp_millis()).unwrap_or(0),
                ..Ticker::default()
            })]),
            MessageKind::Trade => Ok(parser::trades(tick, &pair, Some(contract_type))?
                .into_iter()
                .map(MarketEvent::Trade)
                .collect()),
            _ => Err(DecodeError::UnsupportedChannel(ch.to_string())),
        }
    }
}

/// Huobi perpetual swap stream
///
/// One instance serves one margin type: [`HuobiSwapWs::new`] connects to the
/// coin-margined endpoint and [`HuobiSwapWs::linear`] to the USDT-margined one.
pub struct HuobiSwapWs {
    client: StreamClient,
}

impl HuobiSwapWs {
    pub fn new() -> Result<Self, AdapterError> {
        Self::from_builder(Self::default_builder(HUOBI_SWAP_URL), HuobiSwapParser::default())
    }

    pub fn linear() -> Result<Self, AdapterError> {
        Self::from_builder(
            Self::default_builder(HUOBI_LINEAR_SWAP_URL),
            HuobiSwapParser::default(),
        )
    }

    pub fn default_builder(url: &str) -> StreamBuilder {
        base_builder(url).compression(Compression::Gzip)
    }

    pub fn from_config(entry: &StreamEntry, global: &GlobalConfig) -> Result<Self, AdapterError> {
        Self::from_builder(entry.to_builder(global), HuobiSwapParser::new(entry.depth_limit))
    }

    pub fn from_builder(builder: StreamBuilder, parser: HuobiSwapParser) -> Result<Self, AdapterError> {
        Ok(Self {
            client: builder.frame_parser(parser).build()?,
        })
    }

    pub fn client(&self) -> &StreamClient {
        &self.client
    }

    pub fn on_depth(&self, listener: impl DepthListener + 'static) {
        self.client.on_depth(listener);
    }

    pub fn on_ticker(&self, listener: impl TickerListener + 'static) {
        self.client.on_ticker(listener);
    }

    pub fn on_trade(&self, listener: impl TradeListener + 'static) {
        self.client.on_trade(listener);
    }

    pub async fn subscribe_depth(&self, pair: &CurrencyPair, contract_type: &str) -> Result<u64, AdapterError> {
        let symbol = swap_symbol(pair, contract_type)?;
        let sub = json!({"id": "swap.depth", "sub": format!("market.{symbol}.depth.step6")});
        subscribe_with_listener(&self.client, Slot::Depth, "swap.depth", sub).await
    }

    pub async fn subscribe_ticker(&self, pair: &CurrencyPair, contract_type: &str) -> Result<u64, AdapterError> {
        let symbol = swap_symbol(pair, contract_type)?;
        let sub = json!({"id": "swap.ticker", "sub": format!("market.{symbol}.detail")});
        subscribe_with_listener(&self.client, Slot::Ticker, "swap.ticker", sub).await
    }

    pub async fn subscribe_trade(&self, pair: &CurrencyPair, contract_type: &str) -> Result<u64, AdapterError> {
        let symbol = swap_symbol(pair, contract_type)?;
        let sub = json!({"id": "swap.trade", "sub": format!("market.{symbol}.trade.detail")});
        subscribe_with_listener(&self.client, Slot::Trade, "swap.trade", sub).await
    }

    pub async fn close(&self) -> Result<(), AdapterError> {
        Ok(self.client.close().await?)
    }
}

/// `BTC-USD` for coin-margined, `BTC-USDT` for USDT-margined swaps
fn swap_symbol(pair: &CurrencyPair, contract_type: &str) -> Result<String, AdapterError> {
    match contract_type {
        contract::SWAP => Ok(pair.usdt_to_usd().to_symbol("-")),
        contract::SWAP_USDT => Ok(pair.usd_to_usdt().to_symbol("-")),
        other => Err(AdapterError::UnsupportedContract(other.to_string())),
    }
}
