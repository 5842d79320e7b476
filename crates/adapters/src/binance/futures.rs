use cambist_core::{CurrencyPair, Depth, MarketEvent, Ticker, Trade, contract, normalize};
use cambist_stream::{
    DecodeError, DepthListener, FrameParser, GlobalConfig, MessageKind, StreamBuilder,
    StreamClient, StreamEntry, TickerListener, TradeListener,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use super::parser::{self, RequestIds, SubscribeRequest};
use super::symbols::{FuturesSymbols, SymbolSource};
use crate::common::{Slot, base_builder, subscribe_with_listener};
use crate::error::AdapterError;

/// USDT-margined perpetuals
pub const BINANCE_USDT_FUTURES_URL: &str = "wss://fstream.binance.com/ws";
/// Coin-margined perpetuals and delivery contracts
pub const BINANCE_COIN_FUTURES_URL: &str = "wss://dstream.binance.com/ws";

const DEPTH_SUFFIX: &str = "@depth10@100ms";

/// Binance futures raw-stream frames, keyed by the `e` event type
///
/// Coin-margined events carry the underlying pair in `ps` and the contract
/// symbol (`BTCUSD_PERP`, `BTCUSD_210625`) in `s`; that symbol is reported
/// as the contract type. USDT-margined events only have `s` (`BTCUSDT`) and
/// are reported as `swap-usdt`.
pub struct BinanceFuturesParser {
    depth_limit: usize,
}

impl BinanceFuturesParser {
    pub fn new(depth_limit: usize) -> Self {
        Self { depth_limit }
    }

    fn instrument(msg: &Value) -> Result<(CurrencyPair, String), DecodeError> {
        let symbol = msg
            .get("s")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingField("s"))?;
        match msg.get("ps").and_then(Value::as_str) {
            Some(underlying) => Ok((parser::pair_from_symbol(underlying), symbol.to_string())),
            None => Ok((parser::pair_from_symbol(symbol), contract::SWAP_USDT.to_string())),
        }
    }
}

impl Default for BinanceFuturesParser {
    fn default() -> Self {
        Self::new(20)
    }
}

impl FrameParser for BinanceFuturesParser {
    fn name(&self) -> &str {
        "binance-futures"
    }

    fn classify(&self, msg: &Value) -> MessageKind {
        match msg.get("e").and_then(Value::as_str) {
            Some("depthUpdate") => MessageKind::Depth,
            Some("24hrTicker") => MessageKind::Ticker,
            Some("trade") => MessageKind::Trade,
            _ => MessageKind::Unrecognized,
        }
    }

    fn decode(&self, kind: MessageKind, msg: &Value) -> Result<Vec<MarketEvent>, DecodeError> {
        let (pair, contract_type) = Self::instrument(msg)?;

        match kind {
            MessageKind::Depth => {
                let bids = msg
                    .get("b")
                    .and_then(Value::as_array)
                    .ok_or(DecodeError::MissingField("b"))?;
                let asks = msg
                    .get("a")
                    .and_then(Value::as_array)
                    .ok_or(DecodeError::MissingField("a"))?;
                let (bids, asks) = normalize(bids, asks, self.depth_limit);
                let updated_at = parser::millis_to_time(cambist_core::coerce::field_i64(msg, "T"));
                let depth = Depth::new(pair, bids, asks)
                    .with_contract_type(contract_type)
                    .with_updated_at(updated_at);
                Ok(vec![MarketEvent::Depth(depth)])
            }
            MessageKind::Ticker => Ok(vec![MarketEvent::Ticker(parser::ticker(
                msg,
                pair,
                Some(contract_type),
            ))]),
            MessageKind::Trade => Ok(vec![MarketEvent::Trade(parser::trade(
                msg,
                pair,
                Some(contract_type),
            ))]),
            other => Err(DecodeError::UnsupportedChannel(other.to_string())),
        }
    }
}

/// Binance futures market data over two lazily-connected streams
///
/// `swap-usdt` subscriptions go to the USDT-margined endpoint, every other
/// contract type to the coin-margined one. Each connection is opened by its
/// first subscription. Listeners are shared by both connections.
pub struct BinanceFuturesWs {
    usdt: StreamClient,
    coin: StreamClient,
    symbols: FuturesSymbols,
    usdt_ids: RequestIds,
    coin_ids: RequestIds,
}

impl BinanceFuturesWs {
    pub fn new(source: Arc<dyn SymbolSource>) -> Result<Self, AdapterError> {
        Self::from_builders(
            base_builder(BINANCE_USDT_FUTURES_URL),
            base_builder(BINANCE_COIN_FUTURES_URL),
            FuturesSymbols::new(source),
            20,
        )
    }

    pub fn from_config(
        usdt: &StreamEntry,
        coin: &StreamEntry,
        global: &GlobalConfig,
        source: Arc<dyn SymbolSource>,
    ) -> Result<Self, AdapterError> {
        Self::from_builders(
            usdt.to_builder(global),
            coin.to_builder(global),
            FuturesSymbols::new(source),
            usdt.depth_limit.max(coin.depth_limit),
        )
    }

    pub fn from_builders(
        usdt: StreamBuilder,
        coin: StreamBuilder,
        symbols: FuturesSymbols,
        depth_limit: usize,
    ) -> Result<Self, AdapterError> {
        Ok(Self {
            usdt: usdt.frame_parser(BinanceFuturesParser::new(depth_limit)).build()?,
            coin: coin.frame_parser(BinanceFuturesParser::new(depth_limit)).build()?,
            symbols,
            usdt_ids: RequestIds::new(),
            coin_ids: RequestIds::new(),
        })
    }

    pub fn usdt_client(&self) -> &StreamClient {
        &self.usdt
    }

    pub fn coin_client(&self) -> &StreamClient {
        &self.coin
    }

    pub fn on_depth(&self, listener: impl DepthListener + 'static) {
        let listener: Arc<dyn DepthListener> = Arc::new(listener);
        for client in [&self.usdt, &self.coin] {
            let listener = Arc::clone(&listener);
            client.on_depth(move |depth: Depth| listener.on_depth(depth));
        }
    }

    pub fn on_ticker(&self, listener: impl TickerListener + 'static) {
        let listener: Arc<dyn TickerListener> = Arc::new(listener);
        for client in [&self.usdt, &self.coin] {
            let listener = Arc::clone(&listener);
            client.on_ticker(move |ticker: Ticker| listener.on_ticker(ticker));
        }
    }

    pub fn on_trade(&self, listener: impl TradeListener + 'static) {
        let listener: Arc<dyn TradeListener> = Arc::new(listener);
        for client in [&self.usdt, &self.coin] {
            let listener = Arc::clone(&listener);
            client.on_trade(move |trade: Trade| listener.on_trade(trade));
        }
    }

    pub async fn subscribe_depth(&self, pair: &CurrencyPair, contract_type: &str) -> Result<u64, AdapterError> {
        self.subscribe(Slot::Depth, pair, contract_type, DEPTH_SUFFIX).await
    }

    pub async fn subscribe_ticker(&self, pair: &CurrencyPair, contract_type: &str) -> Result<u64, AdapterError> {
        self.subscribe(Slot::Ticker, pair, contract_type, "@ticker").await
    }

    pub async fn subscribe_trade(&self, pair: &CurrencyPair, contract_type: &str) -> Result<u64, AdapterError> {
        self.subscribe(Slot::Trade, pair, contract_type, "@trade").await
    }

    /// Close both connections
    pub async fn close(&self) -> Result<(), AdapterError> {
        let usdt = self.usdt.close().await;
        let coin = self.coin.close().await;
        usdt?;
        coin?;
        Ok(())
    }

    async fn subscribe(
        &self,
        slot: Slot,
        pair: &CurrencyPair,
        contract_type: &str,
        suffix: &str,
    ) -> Result<u64, AdapterError> {
        let (client, ids, symbol) = if contract_type == contract::SWAP_USDT {
            (&self.usdt, &self.usdt_ids, pair.usd_to_usdt().to_symbol(""))
        } else {
            let symbol = self.symbols.resolve(pair, contract_type).await?;
            (&self.coin, &self.coin_ids, symbol)
        };

        let stream = format!("{}{suffix}", symbol.to_lowercase());
        debug!(stream = %stream, contract_type = %contract_type, "futures subscription");
        let request = SubscribeRequest::new(stream.clone(), ids.next());
        subscribe_with_listener(client, slot, &stream, request.to_value()).await
    }
}
