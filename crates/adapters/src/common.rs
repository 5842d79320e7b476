use cambist_stream::config::env_proxy;
use cambist_stream::{StreamBuilder, StreamClient};
use serde_json::Value;
use tracing::debug;

use crate::error::AdapterError;

/// Builder for `url` with the `HTTPS_PROXY` proxy applied when set
pub(crate) fn base_builder(url: &str) -> StreamBuilder {
    let builder = StreamBuilder::new().url(url);
    match env_proxy() {
        Some(proxy) => {
            debug!(url = %url, proxy = %proxy, "using proxy from environment");
            builder.proxy_url(proxy)
        }
        None => builder,
    }
}

/// Listener slots an event kind can be delivered to
#[derive(Debug, Clone, Copy)]
pub(crate) enum Slot {
    Depth,
    Ticker,
    Trade,
}

impl Slot {
    fn name(self) -> &'static str {
        match self {
            Slot::Depth => "depth",
            Slot::Ticker => "ticker",
            Slot::Trade => "trade",
        }
    }

    fn is_registered(self, client: &StreamClient) -> bool {
        let listeners = client.listeners();
        match self {
            Slot::Depth => listeners.depth.is_some(),
            Slot::Ticker => listeners.ticker.is_some(),
            Slot::Trade => listeners.trade.is_some(),
        }
    }
}

/// Subscribe on `client`, refusing when nobody would receive the events
pub(crate) async fn subscribe_with_listener(
    client: &StreamClient,
    slot: Slot,
    stream_id: &str,
    payload: Value,
) -> Result<u64, AdapterError> {
    if !slot.is_registered(client) {
        return Err(AdapterError::MissingListener(slot.name()));
    }
    Ok(client.subscribe(stream_id, payload).await?)
}
