use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell, watch};
use tokio::time::{Instant, Interval};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use super::proxy::ProxyConfig;
use super::transport::{self, WsSink, WsStream};
use crate::application::dispatcher::{Dispatch, DispatchStats, FrameDispatcher};
use crate::application::journal::SubscriptionJournal;
use crate::application::listeners::Listeners;
use crate::application::reconnect::ReconnectPolicy;
use crate::domain::{ConnectionState, DepthListener, Subscription, TickerListener, TradeListener};
use crate::error::StreamError;

/// Client-initiated keep-alive
#[derive(Debug, Clone, PartialEq)]
pub struct Heartbeat {
    pub interval: Duration,
    pub message: HeartbeatMessage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HeartbeatMessage {
    /// WebSocket ping control frame
    Ping,
    /// Application-level text frame (e.g. `"ping"`)
    Text(String),
}

impl Heartbeat {
    pub fn ping(interval: Duration) -> Self {
        Self {
            interval,
            message: HeartbeatMessage::Ping,
        }
    }

    pub fn text(interval: Duration, text: impl Into<String>) -> Self {
        Self {
            interval,
            message: HeartbeatMessage::Text(text.into()),
        }
    }

    fn to_message(&self) -> Message {
        match &self.message {
            HeartbeatMessage::Ping => Message::Ping(Vec::new().into()),
            HeartbeatMessage::Text(text) => Message::Text(text.clone().into()),
        }
    }
}

/// Everything a client needs, validated by the builder
pub(crate) struct ClientSettings {
    pub url: Url,
    pub proxy: Option<ProxyConfig>,
    pub auto_reconnect: bool,
    pub reconnect: ReconnectPolicy,
    pub heartbeat: Option<Heartbeat>,
    pub read_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub dispatcher: FrameDispatcher,
}

/// Send half plus the journal it replays, guarded together
struct WriterState {
    sink: Option<WsSink>,
    journal: SubscriptionJournal,
    /// Raised when a send fails; the read task drops the socket and reconnects
    sink_lost: watch::Sender<bool>,
}

impl WriterState {
    fn install(&mut self, sink: WsSink) {
        self.sink = Some(sink);
        self.sink_lost.send_replace(false);
    }

    async fn send(&mut self, msg: Message) -> Result<(), StreamError> {
        let sink = self.sink.as_mut().ok_or(StreamError::NotConnected)?;
        if let Err(e) = sink.send(msg).await {
            self.sink = None;
            self.sink_lost.send_replace(true);
            return Err(StreamError::Send(e));
        }
        Ok(())
    }

    /// Resend every journal entry, in registration order
    async fn replay(&mut self) -> Result<usize, StreamError> {
        let frames: Vec<String> = self.journal.iter().map(Subscription::frame).collect();
        for frame in &frames {
            self.send(Message::Text(frame.clone().into())).await?;
        }
        Ok(frames.len())
    }
}

enum ReadExit {
    Shutdown,
    Failed(String),
}

struct Inner {
    url: Url,
    proxy: Option<ProxyConfig>,
    auto_reconnect: bool,
    reconnect: ReconnectPolicy,
    heartbeat: Option<Heartbeat>,
    read_timeout: Option<Duration>,
    connect_timeout: Duration,
    dispatcher: FrameDispatcher,
    writer: Mutex<WriterState>,
    sink_lost: watch::Receiver<bool>,
    started: OnceCell<()>,
    state: watch::Sender<ConnectionState>,
    shutdown: watch::Sender<bool>,
    closed: AtomicBool,
    reconnects: AtomicU64,
}

/// Long-lived streaming connection to one exchange endpoint
///
/// Cloning is cheap; all clones share the same socket, journal and
/// listeners. The socket is opened on the first `subscribe` (or an explicit
/// `connect`) and, with auto-reconnect on, reopened after every failure with
/// all recorded subscriptions replayed in order.
#[derive(Clone)]
pub struct StreamClient {
    inner: Arc<Inner>,
}

impl StreamClient {
    pub(crate) fn from_settings(settings: ClientSettings) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (shutdown, _) = watch::channel(false);
        let (sink_lost_tx, sink_lost) = watch::channel(false);

        StreamClient {
            inner: Arc::new(Inner {
                url: settings.url,
                proxy: settings.proxy,
                auto_reconnect: settings.auto_reconnect,
                reconnect: settings.reconnect,
                heartbeat: settings.heartbeat,
                read_timeout: settings.read_timeout,
                connect_timeout: settings.connect_timeout,
                dispatcher: settings.dispatcher,
                writer: Mutex::new(WriterState {
                    sink: None,
                    journal: SubscriptionJournal::new(),
                    sink_lost: sink_lost_tx,
                }),
                sink_lost,
                started: OnceCell::new(),
                state,
                shutdown,
                closed: AtomicBool::new(false),
                reconnects: AtomicU64::new(0),
            }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Open the connection and start the read task
    ///
    /// Idempotent: concurrent and repeated calls share one physical
    /// connection. A failed first attempt can be retried by calling again.
    pub async fn connect(&self) -> Result<(), StreamError> {
        self.ensure_open()?;

        let inner = &self.inner;
        inner
            .started
            .get_or_try_init(|| async {
                inner.set_state(ConnectionState::Connecting);

                let (sink, stream) = match inner.open().await {
                    Ok(halves) => halves,
                    Err(e) => {
                        error!(url = %inner.url, error = %e, "stream connection failed");
                        inner.set_state(ConnectionState::Disconnected);
                        return Err(e);
                    }
                };

                {
                    let mut writer = inner.writer.lock().await;
                    if inner.closed.load(Ordering::SeqCst) {
                        return Err(StreamError::Closed);
                    }
                    writer.install(sink);
                    writer.replay().await?;
                    inner.set_state(ConnectionState::Connected);
                }

                info!(url = %inner.url, parser = inner.dispatcher.parser_name(), "stream connected");
                tokio::spawn(Arc::clone(&self.inner).run(stream));
                Ok(())
            })
            .await
            .map(|_| ())
    }

    /// Record a subscription and send it
    ///
    /// Connects first if no connection was ever made. While the connection
    /// is down the request is only recorded; it goes out with the replay
    /// after the next reconnect. Returns the journal sequence number.
    pub async fn subscribe(&self, stream_id: impl Into<String>, payload: Value) -> Result<u64, StreamError> {
        self.connect().await?;

        let stream_id = stream_id.into();
        let frame = serde_json::to_string(&payload)?;

        let mut writer = self.inner.writer.lock().await;
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(StreamError::Closed);
        }

        let sequence = writer.journal.record(stream_id.clone(), payload);
        if writer.sink.is_none() {
            debug!(url = %self.inner.url, stream_id = %stream_id, "not connected, subscription queued for replay");
            return Ok(sequence);
        }

        writer.send(Message::Text(frame.into())).await?;
        debug!(url = %self.inner.url, stream_id = %stream_id, sequence, "subscribed");
        Ok(sequence)
    }

    /// Raw write on the serialized send path
    ///
    /// UTF-8 payloads go out as text frames, anything else as binary.
    pub async fn send_message(&self, payload: &[u8]) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.inner.send(outbound(payload)).await
    }

    /// Stop reading, close the socket and suppress reconnects. Idempotent.
    pub async fn close(&self) -> Result<(), StreamError> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.shutdown.send_replace(true);

        let mut writer = self.inner.writer.lock().await;
        if let Some(mut sink) = writer.sink.take() {
            if let Err(e) = sink.send(Message::Close(None)).await {
                debug!(url = %self.inner.url, error = %e, "close frame not sent");
            }
            let _ = sink.close().await;
        }
        self.inner.set_state(ConnectionState::Closed);

        info!(url = %self.inner.url, "stream closed");
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn stats(&self) -> DispatchStats {
        self.inner.dispatcher.stats()
    }

    /// Completed reconnects since the client was built
    pub fn reconnect_count(&self) -> u64 {
        self.inner.reconnects.load(Ordering::Relaxed)
    }

    /// Snapshot of the subscription journal
    pub async fn subscriptions(&self) -> Vec<Subscription> {
        self.inner.writer.lock().await.journal.entries().to_vec()
    }

    pub fn on_depth(&self, listener: impl DepthListener + 'static) {
        self.inner.dispatcher.listeners().set_depth(Arc::new(listener));
    }

    pub fn on_ticker(&self, listener: impl TickerListener + 'static) {
        self.inner.dispatcher.listeners().set_ticker(Arc::new(listener));
    }

    pub fn on_trade(&self, listener: impl TradeListener + 'static) {
        self.inner.dispatcher.listeners().set_trade(Arc::new(listener));
    }

    /// Listeners currently registered
    pub fn listeners(&self) -> Arc<Listeners> {
        self.inner.dispatcher.listeners().load()
    }

    fn ensure_open(&self) -> Result<(), StreamError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            Err(StreamError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Inner {
    async fn open(&self) -> Result<(WsSink, WsStream), StreamError> {
        transport::open(&self.url, self.proxy.as_ref(), self.connect_timeout).await
    }

    async fn send(&self, msg: Message) -> Result<(), StreamError> {
        self.writer.lock().await.send(msg).await
    }

    /// `Closed` is terminal; every other transition is applied as-is
    fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if current.is_closed() || *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    /// Read task: dispatch frames until failure, then reconnect or stop
    async fn run(self: Arc<Self>, mut stream: WsStream) {
        let mut shutdown = self.shutdown.subscribe();

        loop {
            let reason = match self.read_until_failure(&mut stream, &mut shutdown).await {
                ReadExit::Shutdown => break,
                ReadExit::Failed(reason) => reason,
            };

            self.writer.lock().await.sink = None;
            self.set_state(ConnectionState::Disconnected);
            warn!(url = %self.url, reason = %reason, "stream disconnected");

            if !self.auto_reconnect {
                info!(url = %self.url, "auto-reconnect disabled, read task stopping");
                break;
            }

            match self.reconnect(&mut shutdown).await {
                Some(next) => stream = next,
                None => break,
            }
        }

        debug!(url = %self.url, "read task finished");
    }

    async fn read_until_failure(
        &self,
        stream: &mut WsStream,
        shutdown: &mut watch::Receiver<bool>,
    ) -> ReadExit {
        let mut heartbeat = self.heartbeat.as_ref().map(|hb| {
            let mut interval = tokio::time::interval_at(Instant::now() + hb.interval, hb.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval
        });

        let mut deadline = self.read_deadline();
        let mut sink_lost = self.sink_lost.clone();

        loop {
            if *shutdown.borrow() {
                return ReadExit::Shutdown;
            }

            tokio::select! {
                _ = shutdown.changed() => return ReadExit::Shutdown,
                _ = raised(&mut sink_lost) => {
                    return ReadExit::Failed("send failed".to_string());
                }
                _ = tick(heartbeat.as_mut()) => {
                    if let Some(hb) = &self.heartbeat {
                        if let Err(e) = self.send(hb.to_message()).await {
                            return ReadExit::Failed(format!("heartbeat send failed: {e}"));
                        }
                        trace!(url = %self.url, "heartbeat sent");
                    }
                }
                _ = wait_until(deadline) => {
                    return ReadExit::Failed(format!(
                        "no frame within {:?}",
                        self.read_timeout.unwrap_or_default()
                    ));
                }
                next = stream.next() => match next {
                    Some(Ok(msg)) => {
                        deadline = self.read_deadline();
                        self.on_message(msg).await;
                    }
                    Some(Err(e)) => return ReadExit::Failed(format!("read error: {e}")),
                    None => return ReadExit::Failed("stream ended".to_string()),
                },
            }
        }
    }

    fn read_deadline(&self) -> Option<Instant> {
        self.read_timeout.map(|limit| Instant::now() + limit)
    }

    async fn on_message(&self, msg: Message) {
        match msg {
            Message::Text(text) => self.dispatch(text.as_bytes()).await,
            Message::Binary(bytes) => self.dispatch(&bytes).await,
            // tungstenite queues the pong itself and flushes it on the next read
            Message::Ping(payload) => trace!(url = %self.url, len = payload.len(), "ping received"),
            Message::Pong(_) => trace!(url = %self.url, "pong received"),
            Message::Close(frame) => debug!(url = %self.url, frame = ?frame, "close frame received"),
            Message::Frame(_) => {}
        }
    }

    async fn dispatch(&self, raw: &[u8]) {
        match self.dispatcher.handle(raw) {
            Ok(Dispatch::Heartbeat { reply: Some(reply) }) => {
                if let Err(e) = self.send(outbound(&reply)).await {
                    warn!(url = %self.url, error = %e, "failed to answer heartbeat");
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    url = %self.url,
                    parser = self.dispatcher.parser_name(),
                    error = %e,
                    "frame dropped"
                );
            }
        }
    }

    /// Retry until connected (returns the new read half) or closed (`None`)
    async fn reconnect(&self, shutdown: &mut watch::Receiver<bool>) -> Option<WsStream> {
        let mut attempt: u32 = 0;

        loop {
            let delay = self.reconnect.next_delay(attempt);
            info!(
                url = %self.url,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "reconnecting"
            );

            if *shutdown.borrow() {
                return None;
            }
            tokio::select! {
                _ = shutdown.changed() => return None,
                _ = tokio::time::sleep(delay) => {}
            }

            self.set_state(ConnectionState::Connecting);
            let (sink, stream) = match self.open().await {
                Ok(halves) => halves,
                Err(e) => {
                    warn!(url = %self.url, attempt = attempt + 1, error = %e, "reconnect failed");
                    self.set_state(ConnectionState::Disconnected);
                    attempt = attempt.saturating_add(1);
                    continue;
                }
            };

            let mut writer = self.writer.lock().await;
            if self.closed.load(Ordering::SeqCst) {
                return None;
            }
            writer.install(sink);
            match writer.replay().await {
                Ok(replayed) => {
                    self.reconnects.fetch_add(1, Ordering::Relaxed);
                    self.set_state(ConnectionState::Connected);
                    info!(url = %self.url, replayed, "stream reconnected");
                    return Some(stream);
                }
                Err(e) => {
                    warn!(url = %self.url, error = %e, "subscription replay failed");
                    writer.sink = None;
                    self.set_state(ConnectionState::Disconnected);
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn raised(flag: &mut watch::Receiver<bool>) {
    let raised = flag.wait_for(|set| *set).await.is_ok();
    if !raised {
        std::future::pending::<()>().await;
    }
}

async fn tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn outbound(payload: &[u8]) -> Message {
    match std::str::from_utf8(payload) {
        Ok(text) => Message::Text(text.to_string().into()),
        Err(_) => Message::Binary(payload.to_vec().into()),
    }
}
