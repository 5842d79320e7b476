use cambist_core::PairParseError;
use thiserror::Error;

/// Connection-level failures surfaced to callers of the client
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid proxy URL: {0}")]
    InvalidProxy(String),
    #[error("No frame parser configured")]
    MissingParser,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Connection error: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Connection timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),
    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),
    #[error("Send error: {0}")]
    Send(tokio_tungstenite::tungstenite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Stream closed")]
    Closed,
    #[error("Not connected")]
    NotConnected,
}

/// Per-frame failures. These never end the stream; the frame is dropped.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Decompression failed: {0}")]
    Decompress(#[from] DecompressError),
    #[error("Malformed frame: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Failures of an exchange parser turning a JSON message into events
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid pair: {0}")]
    InvalidPair(#[from] PairParseError),
    #[error("Unsupported channel: {0}")]
    UnsupportedChannel(String),
    #[error("Malformed message: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum DecompressError {
    #[error("{codec} decode failed: {source}")]
    Codec {
        codec: &'static str,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Proxy I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Proxy refused CONNECT: {0}")]
    ConnectRefused(String),
    #[error("SOCKS5 handshake failed: {0}")]
    Socks(String),
    #[error("Target host could not be resolved: {0}")]
    Resolve(String),
}
