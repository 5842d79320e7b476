use cambist_core::MarketEvent;
use std::borrow::Cow;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, trace};

use super::listeners::ListenerRegistry;
use crate::domain::{Decompressor, Envelope, FrameParser, MessageKind};
use crate::error::DispatchError;

/// Outcome of handling one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Market data decoded; `delivered` events reached a listener
    Delivered {
        kind: MessageKind,
        events: usize,
        delivered: usize,
    },
    /// Heartbeat probe, with the reply the connection must write back
    Heartbeat { reply: Option<Vec<u8>> },
    /// Parsed but not market data (acks, status messages, unknown channels)
    Unrecognized,
}

/// Point-in-time copy of the dispatcher counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub frames: u64,
    pub events: u64,
    pub delivered: u64,
    pub heartbeats: u64,
    pub unrecognized: u64,
    pub decompress_failures: u64,
    pub parse_failures: u64,
    pub decode_failures: u64,
    pub listener_panics: u64,
}

impl DispatchStats {
    pub fn failures(&self) -> u64 {
        self.decompress_failures + self.parse_failures + self.decode_failures
    }
}

#[derive(Default)]
struct Counters {
    frames: AtomicU64,
    events: AtomicU64,
    delivered: AtomicU64,
    heartbeats: AtomicU64,
    unrecognized: AtomicU64,
    decompress_failures: AtomicU64,
    parse_failures: AtomicU64,
    decode_failures: AtomicU64,
    listener_panics: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Routes raw frames through decompression, the exchange parser, and the
/// registered listeners
///
/// Holds no per-frame state. Frames are handled strictly one at a time in
/// the order they are passed in.
pub struct FrameDispatcher {
    parser: Arc<dyn FrameParser>,
    decompressor: Option<Arc<dyn Decompressor>>,
    listeners: Arc<ListenerRegistry>,
    counters: Counters,
}

impl FrameDispatcher {
    pub fn new(
        parser: Arc<dyn FrameParser>,
        decompressor: Option<Arc<dyn Decompressor>>,
        listeners: Arc<ListenerRegistry>,
    ) -> Self {
        Self {
            parser,
            decompressor,
            listeners,
            counters: Counters::default(),
        }
    }

    pub fn parser_name(&self) -> &str {
        self.parser.name()
    }

    pub fn listeners(&self) -> &Arc<ListenerRegistry> {
        &self.listeners
    }

    /// Handle one inbound frame end to end
    pub fn handle(&self, raw: &[u8]) -> Result<Dispatch, DispatchError> {
        bump(&self.counters.frames);

        let payload = self.decompress(raw)?;

        if let Some(reply) = self.parser.heartbeat_reply(&payload) {
            bump(&self.counters.heartbeats);
            trace!(parser = self.parser.name(), "heartbeat probe");
            return Ok(Dispatch::Heartbeat { reply: Some(reply) });
        }

        let envelope = self.open(raw, payload)?;
        match envelope.kind {
            MessageKind::Heartbeat => {
                bump(&self.counters.heartbeats);
                Ok(Dispatch::Heartbeat { reply: None })
            }
            MessageKind::Unrecognized => {
                bump(&self.counters.unrecognized);
                debug!(
                    parser = self.parser.name(),
                    body = %envelope.body,
                    "unrecognized message dropped"
                );
                Ok(Dispatch::Unrecognized)
            }
            kind => {
                let events = self.parser.decode(kind, &envelope.body).map_err(|e| {
                    bump(&self.counters.decode_failures);
                    DispatchError::from(e)
                })?;
                let count = events.len();
                let delivered = self.deliver(events);
                Ok(Dispatch::Delivered {
                    kind,
                    events: count,
                    delivered,
                })
            }
        }
    }

    /// Parse and classify an already-decompressed payload
    pub fn open<'a>(&self, raw: &'a [u8], payload: Cow<'a, [u8]>) -> Result<Envelope<'a>, DispatchError> {
        let body = serde_json::from_slice(&payload).map_err(|e| {
            bump(&self.counters.parse_failures);
            DispatchError::from(e)
        })?;
        let kind = self.parser.classify(&body);

        Ok(Envelope {
            raw,
            payload,
            body,
            kind,
        })
    }

    pub fn stats(&self) -> DispatchStats {
        let c = &self.counters;
        DispatchStats {
            frames: c.frames.load(Ordering::Relaxed),
            events: c.events.load(Ordering::Relaxed),
            delivered: c.delivered.load(Ordering::Relaxed),
            heartbeats: c.heartbeats.load(Ordering::Relaxed),
            unrecognized: c.unrecognized.load(Ordering::Relaxed),
            decompress_failures: c.decompress_failures.load(Ordering::Relaxed),
            parse_failures: c.parse_failures.load(Ordering::Relaxed),
            decode_failures: c.decode_failures.load(Ordering::Relaxed),
            listener_panics: c.listener_panics.load(Ordering::Relaxed),
        }
    }

    fn decompress<'a>(&self, raw: &'a [u8]) -> Result<Cow<'a, [u8]>, DispatchError> {
        match &self.decompressor {
            None => Ok(Cow::Borrowed(raw)),
            Some(d) => d.decompress(raw).map(Cow::Owned).map_err(|e| {
                bump(&self.counters.decompress_failures);
                DispatchError::from(e)
            }),
        }
    }

    /// Hand events to their listeners; returns how many were delivered
    fn deliver(&self, events: Vec<MarketEvent>) -> usize {
        let listeners = self.listeners.load();
        let mut delivered = 0;

        for event in events {
            bump(&self.counters.events);

            let outcome = match event {
                MarketEvent::Depth(depth) => listeners
                    .depth
                    .as_ref()
                    .map(|l| catch_unwind(AssertUnwindSafe(|| l.on_depth(depth)))),
                MarketEvent::Ticker(ticker) => listeners
                    .ticker
                    .as_ref()
                    .map(|l| catch_unwind(AssertUnwindSafe(|| l.on_ticker(ticker)))),
                MarketEvent::Trade(trade) => listeners
                    .trade
                    .as_ref()
                    .map(|l| catch_unwind(AssertUnwindSafe(|| l.on_trade(trade)))),
            };

            match outcome {
                Some(Ok(())) => {
                    bump(&self.counters.delivered);
                    delivered += 1;
                }
                Some(Err(_)) => {
                    bump(&self.counters.listener_panics);
                    error!(parser = self.parser.name(), "listener panicked, event dropped");
                }
                None => {
                    trace!(parser = self.parser.name(), "no listener registered, event dropped");
                }
            }
        }

        delivered
    }
}
