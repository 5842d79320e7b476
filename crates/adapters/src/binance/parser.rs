//! Wire helpers shared by the Binance spot and futures streams

use cambist_core::{CurrencyPair, Ticker, Timestamp, Trade, TradeSide, coerce};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Quote currencies of lower-case stream prefixes (`btcusdt@ticker`)
const STREAM_QUOTES: &[&str] = &["usdt", "usd", "btc"];

/// Quote currencies of upper-case symbols (`BTCUSDT`, `ETHUSD`)
const SYMBOL_QUOTES: &[&str] = &["USDT", "BUSD", "USD", "PAX", "BTC"];

/// `SUBSCRIBE` request of the Binance stream API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequest {
    pub method: &'static str,
    pub params: Vec<String>,
    pub id: u64,
}

impl SubscribeRequest {
    pub fn new(stream: String, id: u64) -> Self {
        Self {
            method: "SUBSCRIBE",
            params: vec![stream],
            id,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "method": self.method,
            "params": self.params,
            "id": self.id,
        })
    }
}

/// Per-connection request ids, starting at 1
#[derive(Debug)]
pub struct RequestIds(AtomicU64);

impl RequestIds {
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Pair from the symbol prefix of a stream name such as `btcusdt@depth10@100ms`
pub fn pair_from_stream(stream: &str) -> CurrencyPair {
    let symbol = stream.split('@').next().unwrap_or_default();
    CurrencyPair::split_by_quote(symbol, STREAM_QUOTES).unwrap_or_default()
}

/// Pair from an exchange symbol such as `BTCUSDT` or `BTCUSD`
pub fn pair_from_symbol(symbol: &str) -> CurrencyPair {
    CurrencyPair::split_by_quote(&symbol.to_uppercase(), SYMBOL_QUOTES).unwrap_or_default()
}

pub fn millis_to_time(ms: i64) -> Timestamp {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}

/// 24h ticker fields common to spot and futures
pub fn ticker(data: &Value, pair: CurrencyPair, contract_type: Option<String>) -> Ticker {
    Ticker {
        pair,
        contract_type,
        last: coerce::field_decimal(data, "c"),
        buy: coerce::field_decimal(data, "b"),
        sell: coerce::field_decimal(data, "a"),
        high: coerce::field_decimal(data, "h"),
        low: coerce::field_decimal(data, "l"),
        vol: coerce::field_decimal(data, "v"),
        date: coerce::field_u64(data, "E"),
    }
}

/// Raw trade event; `m` is "buyer is the maker"
pub fn trade(data: &Value, pair: CurrencyPair, contract_type: Option<String>) -> Trade {
    let buyer_is_maker = data.get("m").and_then(Value::as_bool).unwrap_or(false);
    Trade {
        tid: coerce::field_i64(data, "t"),
        side: TradeSide::from_buyer_maker(buyer_is_maker),
        amount: coerce::field_decimal(data, "q"),
        price: coerce::field_decimal(data, "p"),
        date: coerce::field_i64(data, "T"),
        pair,
        contract_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_pair_from_stream() {
        assert_eq!(pair_from_stream("btcusdt@depth10@100ms"), CurrencyPair::new("BTC", "USDT"));
        assert_eq!(pair_from_stream("ethbtc@ticker"), CurrencyPair::new("ETH", "BTC"));
        assert_eq!(pair_from_stream("btcusd@trade"), CurrencyPair::new("BTC", "USD"));
        assert!(pair_from_stream("bnbeur@ticker").is_unknown());
    }

    #[test]
    fn test_pair_from_symbol() {
        assert_eq!(pair_from_symbol("BTCUSDT"), CurrencyPair::new("BTC", "USDT"));
        assert_eq!(pair_from_symbol("ETHUSD"), CurrencyPair::new("ETH", "USD"));
        assert_eq!(pair_from_symbol("BTCBUSD"), CurrencyPair::new("BTC", "BUSD"));
        assert_eq!(pair_from_symbol("ethbtc"), CurrencyPair::new("ETH", "BTC"));
        assert!(pair_from_symbol("BTCUSD_PERP").is_unknown());
    }

    #[test]
    fn test_subscribe_request_shape() {
        let ids = RequestIds::new();
        let first = SubscribeRequest::new("btcusdt@ticker".into(), ids.next());
        let second = SubscribeRequest::new("btcusdt@trade".into(), ids.next());
        assert_eq!(
            first.to_value(),
            json!({"method": "SUBSCRIBE", "params": ["btcusdt@ticker"], "id": 1})
        );
        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_trade_side_from_maker_flag() {
        let data = json!({"e": "trade", "t": 12345, "p": "50000.00", "q": "1.5", "T": 1234567890, "m": true});
        let t = trade(&data, CurrencyPair::new("BTC", "USDT"), None);
        assert_eq!(t.tid, 12345);
        assert_eq!(t.side, TradeSide::Sell);
        assert_eq!(t.price, dec!(50000.00));
        assert_eq!(t.amount, dec!(1.5));
        assert_eq!(t.date, 1234567890);
    }
}
