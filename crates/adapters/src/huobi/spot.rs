use cambist_core::{CurrencyPair, Depth, MarketEvent, Ticker, coerce};
use cambist_stream::{
    Compression, DecodeError, DepthListener, FrameParser, GlobalConfig, MessageKind, StreamBuilder,
    StreamClient, StreamEntry, TickerListener, TradeListener,
};
use serde_json::{Value, json};

use super::parser;
use crate::common::{Slot, base_builder, subscribe_with_listener};
use crate::error::AdapterError;

pub const HUOBI_SPOT_URL: &str = "wss://api.huobi.pro/ws";

/// Quote currencies recognised in spot symbols, longest match first
const SPOT_QUOTES: &[&str] = &["usdt", "husd", "btc", "eth", "ht", "trx"];

/// Recover the pair from a spot channel such as `market.btcusdt.detail`
pub fn pair_from_channel(ch: &str) -> CurrencyPair {
    parser::channel_symbol(ch)
        .and_then(|symbol| CurrencyPair::split_by_quote(symbol, SPOT_QUOTES))
        .unwrap_or_default()
}

/// Huobi spot market-data frames
pub struct HuobiSpotParser {
    depth_limit: usize,
}

impl HuobiSpotParser {
    pub fn new(depth_limit: usize) -> Self {
        Self { depth_limit }
    }
}

impl Default for HuobiSpotParser {
    fn default() -> Self {
        Self::new(20)
    }
}

impl FrameParser for HuobiSpotParser {
    fn name(&self) -> &str {
        "huobi-spot"
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
        let pair = pair_from_channel(ch);
        let tick = parser::tick(msg)?;

        match kind {
            MessageKind::Depth => {
                let (bids, asks) = parser::depth_levels(tick, self.depth_limit)?;
                let depth = Depth::new(pair, bids, asks).with_updated_at(parser::frame_time(msg));
                Ok(vec![MarketEvent::Depth(depth)])
            }
            MessageKind::Ticker => Ok(vec![MarketEvent::Ticker(Ticker {
                pair,
                last: coerce::field_decimal(tick, "close"),
                high: coerce::field_decimal(tick, "high"),
                low: coerce::field_decimal(tick, "low"),
                vol: coerce::field_decimal(tick, "amount"),
                date: coerce::field_u64(msg, "ts"),
                ..Ticker::default()
            })]),
            MessageKind::Trade => Ok(parser::trades(tick, &pair, None)?
                .into_iter()
                .map(MarketEvent::Trade)
                .collect()),
            _ => Err(DecodeError::UnsupportedChannel(ch.to_string())),
        }
    }
}

/// Huobi spot market-data stream
///
/// The connection is opened by the first subscribe. Register the listener for
/// an event type before subscribing to it.
pub struct HuobiSpotWs {
    client: StreamClient,
}

impl HuobiSpotWs {
    pub fn new() -> Result<Self, AdapterError> {
        Self::from_builder(Self::default_builder(), HuobiSpotParser::default())
    }

    /// Gzip-compressed public endpoint, proxied through `HTTPS_PROXY` if set
    pub fn default_builder() -> StreamBuilder {
        base_builder(HUOBI_SPOT_URL).compression(Compression::Gzip)
    }

    pub fn from_config(entry: &StreamEntry, global: &GlobalConfig) -> Result<Self, AdapterError> {
        Self::from_builder(entry.to_builder(global), HuobiSpotParser::new(entry.depth_limit))
    }

    pub fn from_builder(builder: StreamBuilder, parser: HuobiSpotParser) -> Result<Self, AdapterError> {
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

    /// 20-level book snapshots refreshed by the exchange
    pub async fn subscribe_depth(&self, pair: &CurrencyPair) -> Result<u64, AdapterError> {
        let sub = json!({
            "id": "spot.depth",
            "sub": format!("market.{}.mbp.refresh.20", pair.to_lower_symbol("")),
        });
        subscribe_with_listener(&self.client, Slot::Depth, "spot.depth", sub).await
    }

    pub async fn subscribe_ticker(&self, pair: &CurrencyPair) -> Result<u64, AdapterError> {
        let sub = json!({
            "id": "spot.ticker",
            "sub": format!("market.{}.detail", pair.to_lower_symbol("")),
        });
        subscribe_with_listener(&self.client, Slot::Ticker, "spot.ticker", sub).await
    }

    pub async fn subscribe_trade(&self, pair: &CurrencyPair) -> Result<u64, AdapterError> {
        let sub = json!({
            "id": "spot.trade",
            "sub": format!("market.{}.trade.detail", pair.to_lower_symbol("")),
        });
        subscribe_with_listener(&self.client, Slot::Trade, "spot.trade", sub).await
    }

    pub async fn close(&self) -> Result<(), AdapterError> {
        Ok(self.client.close().await?)
    }
}
