use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// What an inbound message carries, as decided by the exchange parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Heartbeat,
    Ticker,
    Depth,
    Trade,
    Unrecognized,
}

impl MessageKind {
    /// Kinds that produce market events
    pub fn is_market_data(&self) -> bool {
        matches!(self, MessageKind::Ticker | MessageKind::Depth | MessageKind::Trade)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageKind::Heartbeat => "heartbeat",
            MessageKind::Ticker => "ticker",
            MessageKind::Depth => "depth",
            MessageKind::Trade => "trade",
            MessageKind::Unrecognized => "unrecognized",
        };
        f.write_str(s)
    }
}

/// One decompressed, parsed and classified frame
///
/// Lives only for the duration of a single dispatch.
#[derive(Debug)]
pub struct Envelope<'a> {
    /// Bytes as read from the socket
    pub raw: &'a [u8],
    /// Bytes after decompression (borrowed from `raw` when uncompressed)
    pub payload: Cow<'a, [u8]>,
    pub body: Value,
    pub kind: MessageKind,
}

/// Lifecycle of the physical connection
///
/// `Disconnected → Connecting → Connected`, back to `Disconnected` on failure,
/// and `Closed` once the client has been closed. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        *self == ConnectionState::Connected
    }

    pub fn is_closed(&self) -> bool {
        *self == ConnectionState::Closed
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}
