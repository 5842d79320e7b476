use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::dispatcher::FrameDispatcher;
use super::listeners::{ListenerRegistry, Listeners};
use super::reconnect::ReconnectPolicy;
use crate::domain::{Decompressor, DepthListener, FrameParser, TickerListener, TradeListener};
use crate::error::StreamError;
use crate::infrastructure::connection::{ClientSettings, Heartbeat, StreamClient};
use crate::infrastructure::decompress::Compression;
use crate::infrastructure::proxy::ProxyConfig;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Declarative assembly of a [`StreamClient`]
///
/// `build()` validates everything up front and never touches the network;
/// the connection is opened on first use.
///
/// ```ignore
/// let client = StreamBuilder::new()
///     .url("wss://api.huobi.pro/ws")
///     .compression(Compression::Gzip)
///     .frame_parser(HuobiSpotParser::new())
///     .on_depth(|depth: Depth| println!("{depth:?}"))
///     .build()?;
/// ```
pub struct StreamBuilder {
    url: Option<String>,
    proxy_url: Option<String>,
    decompressor: Option<Arc<dyn Decompressor>>,
    parser: Option<Arc<dyn FrameParser>>,
    auto_reconnect: bool,
    reconnect: ReconnectPolicy,
    heartbeat: Option<Heartbeat>,
    read_timeout: Option<Duration>,
    connect_timeout: Duration,
    listeners: Listeners,
}

impl Default for StreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self {
            url: None,
            proxy_url: None,
            decompressor: None,
            parser: None,
            auto_reconnect: true,
            reconnect: ReconnectPolicy::default(),
            heartbeat: None,
            read_timeout: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            listeners: Listeners::default(),
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// `http://`, `socks5://` or `socks5h://` proxy; empty string means none
    pub fn proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        let proxy_url = proxy_url.into();
        self.proxy_url = (!proxy_url.is_empty()).then_some(proxy_url);
        self
    }

    pub fn decompressor(mut self, decompressor: impl Decompressor + 'static) -> Self {
        self.decompressor = Some(Arc::new(decompressor));
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.decompressor = compression.decompressor();
        self
    }

    pub fn frame_parser(self, parser: impl FrameParser + 'static) -> Self {
        self.shared_frame_parser(Arc::new(parser))
    }

    pub fn shared_frame_parser(mut self, parser: Arc<dyn FrameParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn heartbeat(mut self, heartbeat: Heartbeat) -> Self {
        self.heartbeat = Some(heartbeat);
        self
    }

    /// Treat `timeout` without any inbound frame as a dead connection
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn on_depth(mut self, listener: impl DepthListener + 'static) -> Self {
        self.listeners.depth = Some(Arc::new(listener));
        self
    }

    pub fn on_ticker(mut self, listener: impl TickerListener + 'static) -> Self {
        self.listeners.ticker = Some(Arc::new(listener));
        self
    }

    pub fn on_trade(mut self, listener: impl TradeListener + 'static) -> Self {
        self.listeners.trade = Some(Arc::new(listener));
        self
    }

    pub fn build(self) -> Result<StreamClient, StreamError> {
        let raw_url = self
            .url
            .ok_or_else(|| StreamError::InvalidUrl("no endpoint URL configured".into()))?;
        let url = Url::parse(&raw_url).map_err(|e| StreamError::InvalidUrl(format!("{raw_url}: {e}")))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(StreamError::InvalidUrl(format!(
                "{raw_url}: expected ws:// or wss://"
            )));
        }
        if url.host_str().is_none() {
            return Err(StreamError::InvalidUrl(format!("{raw_url}: missing host")));
        }

        let proxy = self.proxy_url.as_deref().map(ProxyConfig::parse).transpose()?;
        let parser = self.parser.ok_or(StreamError::MissingParser)?;

        if let Some(hb) = &self.heartbeat
            && hb.interval.is_zero()
        {
            return Err(StreamError::InvalidConfig("heartbeat interval must be non-zero".into()));
        }

        let dispatcher = FrameDispatcher::new(
            parser,
            self.decompressor,
            Arc::new(ListenerRegistry::new(self.listeners)),
        );

        Ok(StreamClient::from_settings(ClientSettings {
            url,
            proxy,
            auto_reconnect: self.auto_reconnect,
            reconnect: self.reconnect,
            heartbeat: self.heartbeat,
            read_timeout: self.read_timeout,
            connect_timeout: self.connect_timeout,
            dispatcher,
        }))
    }
}
