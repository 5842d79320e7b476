//! Cambist Stream
//!
//! Resilient WebSocket client for exchange market data. One [`StreamClient`]
//! owns one physical connection: it connects lazily, keeps a journal of every
//! subscription, and after a failure reconnects and replays that journal so
//! callers never notice the outage.
//!
//! # Architecture
//!
//! ```text
//!   StreamBuilder ──build()──► StreamClient
//!                               │
//!        subscribe() ──────────►│ send mutex ──► [ SubscriptionJournal ]
//!                               │      │                │ replay on reconnect
//!                               │      ▼                ▼
//!                               │   ┌──────────────────────────┐
//!                               │   │  WebSocket (direct/proxy) │
//!                               │   └────────────┬─────────────┘
//!                               │                │ frames, in read order
//!                               ▼                ▼
//!                        ┌────────────────────────────────────┐
//!                        │           FrameDispatcher           │
//!                        │ decompress → heartbeat? → JSON      │
//!                        │   → FrameParser::classify / decode  │
//!                        └───────────────┬────────────────────┘
//!                                        │ MarketEvent
//!                          ┌─────────────┼─────────────┐
//!                          ▼             ▼             ▼
//!                   DepthListener  TickerListener  TradeListener
//! ```
//!
//! Exchange specifics live behind [`FrameParser`]; see the `cambist-adapters`
//! crate for Huobi and Binance.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;

// Re-export key types
pub use domain::{
    ConnectionState, Decompressor, DepthListener, Envelope, FrameParser, MessageKind,
    Subscription, TickerListener, TradeListener,
};
pub use error::{DecodeError, DecompressError, DispatchError, ProxyError, StreamError};

pub use application::{
    Dispatch, DispatchStats, FrameDispatcher, ListenerRegistry, Listeners, ReconnectPolicy,
    StreamBuilder, SubscriptionJournal,
};

pub use infrastructure::{
    Compression, Deflate, Gzip, Heartbeat, HeartbeatMessage, Identity, ProxyConfig, ProxyKind,
    StreamClient,
};

pub use config::{
    ConfigError, GlobalConfig, StreamConfigFile, StreamEntry, load_config, load_config_from_str,
    load_default_config,
};
