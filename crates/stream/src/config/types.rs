use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::builder::StreamBuilder;
use crate::application::reconnect::ReconnectPolicy;
use crate::infrastructure::connection::Heartbeat;
use crate::infrastructure::decompress::Compression;

/// Environment variable consulted when a stream has no explicit proxy
pub const PROXY_ENV_VAR: &str = "HTTPS_PROXY";

/// Root configuration for all streams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfigFile {
    pub streams: Vec<StreamEntry>,
    #[serde(default)]
    pub global: GlobalConfig,
}

/// Configuration for a single stream endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEntry {
    /// Unique identifier (e.g., "huobi-spot", "binance-futures-usdt")
    pub id: String,
    /// Exchange the stream belongs to (e.g., "huobi", "binance")
    pub exchange: String,
    /// Whether this stream is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// WebSocket URL
    pub url: String,
    /// Proxy URL; falls back to `HTTPS_PROXY` when absent
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub compression: Compression,
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,
    /// Reconnect when no frame arrives for this long
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
    #[serde(default)]
    pub heartbeat: Option<HeartbeatConfig>,
    /// Order book levels kept per side
    #[serde(default = "default_depth_limit")]
    pub depth_limit: usize,
}

/// Client-initiated keep-alive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    #[serde(default = "default_heartbeat_interval")]
    pub interval_ms: u64,
    /// Text frame to send; a WebSocket ping when absent
    #[serde(default)]
    pub text: Option<String>,
}

/// Settings shared by every stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Delay before the first reconnection attempt in milliseconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,
    /// Ceiling for the backoff delay in milliseconds
    #[serde(default = "default_max_reconnect_delay")]
    pub max_reconnect_delay_ms: u64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Random fraction of the delay added to each attempt
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        GlobalConfig {
            reconnect_delay_ms: default_reconnect_delay(),
            max_reconnect_delay_ms: default_max_reconnect_delay(),
            backoff_factor: default_backoff_factor(),
            jitter: default_jitter(),
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

impl GlobalConfig {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::default()
            .with_initial_delay(Duration::from_millis(self.reconnect_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_reconnect_delay_ms))
            .with_backoff_factor(self.backoff_factor)
            .with_jitter(self.jitter)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl StreamEntry {
    /// Explicit proxy, else the `HTTPS_PROXY` environment variable
    pub fn effective_proxy(&self) -> Option<String> {
        self.proxy_url
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(env_proxy)
    }

    /// Builder with every transport option of this entry applied
    ///
    /// The frame parser and listeners are exchange-specific and still have
    /// to be added by the caller.
    pub fn to_builder(&self, global: &GlobalConfig) -> StreamBuilder {
        let mut builder = StreamBuilder::new()
            .url(self.url.clone())
            .compression(self.compression)
            .auto_reconnect(self.auto_reconnect)
            .reconnect_policy(global.reconnect_policy())
            .connect_timeout(global.connect_timeout());

        if let Some(proxy) = self.effective_proxy() {
            builder = builder.proxy_url(proxy);
        }
        if let Some(ms) = self.read_timeout_ms {
            builder = builder.read_timeout(Duration::from_millis(ms));
        }
        if let Some(hb) = &self.heartbeat {
            let interval = Duration::from_millis(hb.interval_ms);
            builder = builder.heartbeat(match &hb.text {
                Some(text) => Heartbeat::text(interval, text.clone()),
                None => Heartbeat::ping(interval),
            });
        }
        builder
    }
}

/// Proxy from `HTTPS_PROXY` (or `https_proxy`), if set and non-empty
pub fn env_proxy() -> Option<String> {
    [PROXY_ENV_VAR, "https_proxy"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|v| !v.trim().is_empty())
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_depth_limit() -> usize {
    20
}

fn default_heartbeat_interval() -> u64 {
    20000
}

fn default_reconnect_delay() -> u64 {
    100
}

fn default_max_reconnect_delay() -> u64 {
    30000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.5
}

fn default_connect_timeout() -> u64 {
    10000
}
