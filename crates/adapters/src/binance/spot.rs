use cambist_core::{CurrencyPair, Depth, MarketEvent, normalize};
use cambist_stream::{
    DecodeError, DepthListener, FrameParser, GlobalConfig, MessageKind, StreamBuilder,
    StreamClient, StreamEntry, TickerListener, TradeListener,
};
use serde_json::Value;

use super::parser::{self, RequestIds, SubscribeRequest};
use crate::common::{Slot, base_builder, subscribe_with_listener};
use crate::error::AdapterError;

/// Combined-stream endpoint: every frame is wrapped as `{"stream", "data"}`
pub const BINANCE_SPOT_URL: &str = "wss://stream.binance.com:9443/stream";

const DEPTH_SUFFIX: &str = "@depth10@100ms";

/// Binance spot combined-stream frames
pub struct BinanceSpotParser {
    depth_limit: usize,
}

impl BinanceSpotParser {
    pub fn new(depth_limit: usize) -> Self {
        Self { depth_limit }
    }
}

impl Default for BinanceSpotParser {
    fn default() -> Self {
        Self::new(10)
    }
}

fn stream_name(msg: &Value) -> Option<&str> {
    msg.get("stream").and_then(Value::as_str)
}

impl FrameParser for BinanceSpotParser {
    fn name(&self) -> &str {
        "binance-spot"
    }

    fn classify(&self, msg: &Value) -> MessageKind {
        // Request acks (`{"result": null, "id": 1}`) carry no stream
        match stream_name(msg) {
            Some(s) if s.contains("@depth") => MessageKind::Depth,
            Some(s) if s.ends_with("@ticker") => MessageKind::Ticker,
            Some(s) if s.ends_with("@trade") => MessageKind::Trade,
            _ => MessageKind::Unrecognized,
        }
    }

    fn decode(&self, kind: MessageKind, msg: &Value) -> Result<Vec<MarketEvent>, DecodeError> {
        let stream = stream_name(msg).ok_or(DecodeError::MissingField("stream"))?;
        let data = msg
            .get("data")
            .filter(|d| d.is_object())
            .ok_or(DecodeError::MissingField("data"))?;
        let pair = parser::pair_from_stream(stream);

        match kind {
            MessageKind::Depth => {
                let bids = data
                    .get("bids")
                    .and_then(Value::as_array)
                    .ok_or(DecodeError::MissingField("bids"))?;
                let asks = data
                    .get("asks")
                    .and_then(Value::as_array)
                    .ok_or(DecodeError::MissingField("asks"))?;
                let (bids, asks) = normalize(bids, asks, self.depth_limit);
                // Partial book streams carry no event time
                Ok(vec![MarketEvent::Depth(Depth::new(pair, bids, asks))])
            }
            MessageKind::Ticker => Ok(vec![MarketEvent::Ticker(parser::ticker(data, pair, None))]),
            MessageKind::Trade => Ok(vec![MarketEvent::Trade(parser::trade(data, pair, None))]),
            _ => Err(DecodeError::UnsupportedChannel(stream.to_string())),
        }
    }
}

/// Binance spot market-data stream
pub struct BinanceSpotWs {
    client: StreamClient,
    ids: RequestIds,
}

impl BinanceSpotWs {
    pub fn new() -> Result<Self, AdapterError> {
        Self::from_builder(Self::default_builder(), BinanceSpotParser::default())
    }

    pub fn default_builder() -> StreamBuilder {
        base_builder(BINANCE_SPOT_URL)
    }

    pub fn from_config(entry: &StreamEntry, global: &GlobalConfig) -> Result<Self, AdapterError> {
        Self::from_builder(entry.to_builder(global), BinanceSpotParser::new(entry.depth_limit))
    }

    pub fn from_builder(builder: StreamBuilder, parser: BinanceSpotParser) -> Result<Self, AdapterError> {
        Ok(Self {
            client: builder.frame_parser(parser).build()?,
            ids: RequestIds::new(),
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

    /// Top 10 levels every 100ms
    pub async fn subscribe_depth(&self, pair: &CurrencyPair) -> Result<u64, AdapterError> {
        self.subscribe(Slot::Depth, format!("{}{DEPTH_SUFFIX}", pair.to_lower_symbol("")))
            .await
    }

    pub async fn subscribe_ticker(&self, pair: &CurrencyPair) -> Result<u64, AdapterError> {
        self.subscribe(Slot::Ticker, format!("{}@ticker", pair.to_lower_symbol("")))
            .await
    }

    pub async fn subscribe_trade(&self, pair: &CurrencyPair) -> Result<u64, AdapterError> {
        self.subscribe(Slot::Trade, format!("{}@trade", pair.to_lower_symbol("")))
            .await
    }

    pub async fn close(&self) -> Result<(), AdapterError> {
        Ok(self.client.close().await?)
    }

    async fn subscribe(&self, slot: Slot, stream: String) -> Result<u64, AdapterError> {
        let request = SubscribeRequest::new(stream.clone(), self.ids.next());
        subscribe_with_listener(&self.client, slot, &stream, request.to_value()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cambist_core::TradeSide;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decode_partial_depth() {
        let parser = BinanceSpotParser::default();
        let msg = json!({
            "stream": "btcusdt@depth10@100ms",
            "data": {
                "lastUpdateId": 160,
                "bids": [["0.0024", "10"], ["0.0023", "5"]],
                "asks": [["0.0026", "100"], ["0.0027", "7"]]
            }
        });
        assert_eq!(parser.classify(&msg), MessageKind::Depth);

        let events = parser.decode(MessageKind::Depth, &msg).unwrap();
        let MarketEvent::Depth(depth) = &events[0] else { panic!() };
        assert_eq!(depth.pair, CurrencyPair::new("BTC", "USDT"));
        assert_eq!(depth.bids[0].price, dec!(0.0024));
        assert_eq!(depth.asks[0].price, dec!(0.0027));
        assert_eq!(depth.asks[1].price, dec!(0.0026));
    }

    #[test]
    fn test_decode_ticker() {
        let parser = BinanceSpotParser::default();
        let msg = json!({
            "stream": "ethbtc@ticker",
            "data": {
                "e": "24hrTicker", "E": 123456789, "s": "ETHBTC",
                "c": "0.0025", "b": "0.0024", "a": "0.0026",
                "h": "0.0030", "l": "0.0010", "v": "10000"
            }
        });
        let events = parser.decode(parser.classify(&msg), &msg).unwrap();
        let MarketEvent::Ticker(ticker) = &events[0] else { panic!() };
        assert_eq!(ticker.pair, CurrencyPair::new("ETH", "BTC"));
        assert_eq!(ticker.last, dec!(0.0025));
        assert_eq!(ticker.buy, dec!(0.0024));
        assert_eq!(ticker.sell, dec!(0.0026));
        assert_eq!(ticker.high, dec!(0.0030));
        assert_eq!(ticker.low, dec!(0.0010));
        assert_eq!(ticker.vol, dec!(10000));
        assert_eq!(ticker.date, 123456789);
        assert_eq!(ticker.contract_type, None);
    }

    #[test]
    fn test_decode_trade() {
        let parser = BinanceSpotParser::default();
        let msg = json!({
            "stream": "bnbusdt@trade",
            "data": {"e": "trade", "E": 1, "s": "BNBUSDT", "t": 12345, "p": "0.001", "q": "100", "T": 123456785, "m": false}
        });
        let events = parser.decode(parser.classify(&msg), &msg).unwrap();
        let MarketEvent::Trade(trade) = &events[0] else { panic!() };
        assert_eq!(trade.pair, CurrencyPair::new("BNB", "USDT"));
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.tid, 12345);
    }

    #[test]
    fn test_ack_unrecognized() {
        let parser = BinanceSpotParser::default();
        assert_eq!(parser.classify(&json!({"result": null, "id": 1})), MessageKind::Unrecognized);
        assert_eq!(
            parser.classify(&json!({"stream": "btcusdt@kline_1m", "data": {}})),
            MessageKind::Unrecognized
        );
    }

    #[test]
    fn test_missing_data_is_decode_error() {
        let parser = BinanceSpotParser::default();
        let msg = json!({"stream": "btcusdt@ticker"});
        assert!(matches!(
            parser.decode(MessageKind::Ticker, &msg),
            Err(DecodeError::MissingField("data"))
        ));
    }
}
