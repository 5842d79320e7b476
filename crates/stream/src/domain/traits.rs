use cambist_core::{Depth, MarketEvent, Ticker, Trade};
use serde_json::Value;

use super::events::MessageKind;
use crate::error::{DecodeError, DecompressError};

/// Exchange-specific knowledge of one stream's wire protocol
///
/// Implementations are stateless with respect to the connection: the client
/// calls them from its read task, one frame at a time, in read order.
pub trait FrameParser: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// If `payload` is an application-level heartbeat probe, the bytes to
    /// send back. Checked on the decompressed payload before JSON parsing.
    fn heartbeat_reply(&self, _payload: &[u8]) -> Option<Vec<u8>> {
        None
    }

    /// Decide what a parsed message carries. Must be total: anything not
    /// understood is [`MessageKind::Unrecognized`].
    fn classify(&self, msg: &Value) -> MessageKind;

    /// Turn a market-data message into events. One message may fan out into
    /// several events (e.g. a batch of trades).
    fn decode(&self, kind: MessageKind, msg: &Value) -> Result<Vec<MarketEvent>, DecodeError>;
}

/// Payload decompression applied to every inbound frame
pub trait Decompressor: Send + Sync {
    fn decompress(&self, raw: &[u8]) -> Result<Vec<u8>, DecompressError>;

    fn name(&self) -> &str {
        "Decompressor"
    }
}

/// Receives every decoded order book snapshot
///
/// Called from the read task: must not block and must not call back into
/// `subscribe`/`close` synchronously.
pub trait DepthListener: Send + Sync {
    fn on_depth(&self, depth: Depth);
}

pub trait TickerListener: Send + Sync {
    fn on_ticker(&self, ticker: Ticker);
}

pub trait TradeListener: Send + Sync {
    fn on_trade(&self, trade: Trade);
}

impl<F> DepthListener for F
where
    F: Fn(Depth) + Send + Sync,
{
    fn on_depth(&self, depth: Depth) {
        self(depth)
    }
}

impl<F> TickerListener for F
where
    F: Fn(Ticker) + Send + Sync,
{
    fn on_ticker(&self, ticker: Ticker) {
        self(ticker)
    }
}

impl<F> TradeListener for F
where
    F: Fn(Trade) + Send + Sync,
{
    fn on_trade(&self, trade: Trade) {
        self(trade)
    }
}
