#![allow(dead_code)]

pub mod mock_exchange;

use cambist_core::{CurrencyPair, Depth, MarketEvent, Ticker, coerce, normalize};
use cambist_stream::{DecodeError, DepthListener, FrameParser, MessageKind};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use mock_exchange::{MockEvent, MockExchange};

/// Toy exchange protocol for driving the client end to end
///
/// - `{"ping": n}` is a heartbeat probe answered with `{"pong": n}`
/// - `{"ch": "depth", "bids": [...], "asks": [...]}` is a book snapshot
/// - `{"ch": "ticker", "last": ...}` is a ticker
/// - anything else (acks, unknown channels) is unrecognized
pub struct ToyParser;

impl FrameParser for ToyParser {
    fn name(&self) -> &str {
        "toy"
    }

    fn heartbeat_reply(&self, payload: &[u8]) -> Option<Vec<u8>> {
        let text = std::str::from_utf8(payload).ok()?;
        text.contains("\"ping\"")
            .then(|| text.replacen("ping", "pong", 1).into_bytes())
    }

    fn classify(&self, msg: &Value) -> MessageKind {
        match msg.get("ch").and_then(Value::as_str) {
            Some("depth") => MessageKind::Depth,
            Some("ticker") => MessageKind::Ticker,
            _ => MessageKind::Unrecognized,
        }
    }

    fn decode(&self, kind: MessageKind, msg: &Value) -> Result<Vec<MarketEvent>, DecodeError> {
        let pair = CurrencyPair::new("BTC", "USDT");
        match kind {
            MessageKind::Depth => {
                let bids = msg
                    .get("bids")
                    .and_then(Value::as_array)
                    .ok_or(DecodeError::MissingField("bids"))?;
                let asks = msg
                    .get("asks")
                    .and_then(Value::as_array)
                    .ok_or(DecodeError::MissingField("asks"))?;
                let (bids, asks) = normalize(bids, asks, 20);
                Ok(vec![MarketEvent::Depth(Depth::new(pair, bids, asks))])
            }
            MessageKind::Ticker => Ok(vec![MarketEvent::Ticker(Ticker {
                pair,
                last: coerce::field_decimal(msg, "last"),
                ..Ticker::default()
            })]),
            _ => Ok(Vec::new()),
        }
    }
}

/// Depth listener that always panics
pub struct PanickingListener;

impl DepthListener for PanickingListener {
    fn on_depth(&self, _depth: Depth) {
        panic!("listener bug");
    }
}

/// Thread-safe sink for listener calls
pub struct Collected<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Collected<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Collected<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn listener(&self) -> impl Fn(T) + Send + Sync + 'static {
        let items = self.items.clone();
        move |item| items.lock().unwrap().push(item)
    }

    pub fn items(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    /// Poll until at least `n` items arrived, failing after two seconds
    pub async fn wait_for(&self, n: usize) -> Vec<T> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.len() < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {n} items, got {}",
                self.len()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.items()
    }
}

pub fn depth_frame(best_bid: &str) -> String {
    serde_json::json!({
        "ch": "depth",
        "bids": [[best_bid, "1.0"], ["90", "2.0"]],
        "asks": [["101", "1.0"], ["102", "3.0"]]
    })
    .to_string()
}

pub fn sub_payload(channel: &str, id: u64) -> Value {
    serde_json::json!({ "sub": channel, "id": id })
}
