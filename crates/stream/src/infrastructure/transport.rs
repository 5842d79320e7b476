use futures_util::StreamExt;
use futures_util::stream::{SplitSink, SplitStream};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, client_async_tls, connect_async};
use url::Url;

use super::proxy::ProxyConfig;
use crate::error::StreamError;

pub type WsSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Write half of a connection
pub type WsSink = SplitSink<WsSocket, Message>;

/// Read half of a connection
pub type WsStream = SplitStream<WsSocket>;

/// Open a WebSocket, directly or through `proxy`, and split it
pub async fn open(
    url: &Url,
    proxy: Option<&ProxyConfig>,
    timeout: Duration,
) -> Result<(WsSink, WsStream), StreamError> {
    let handshake = async {
        match proxy {
            None => {
                let (socket, _) = connect_async(url.as_str()).await?;
                Ok::<_, StreamError>(socket)
            }
            Some(proxy) => {
                let host = url
                    .host_str()
                    .ok_or_else(|| StreamError::InvalidUrl(format!("{url}: missing host")))?;
                let port = url
                    .port_or_known_default()
                    .ok_or_else(|| StreamError::InvalidUrl(format!("{url}: missing port")))?;
                let tunnel = proxy.tunnel(host.trim_start_matches('[').trim_end_matches(']'), port).await?;
                let (socket, _) = client_async_tls(url.as_str(), tunnel).await?;
                Ok(socket)
            }
        }
    };

    let socket = tokio::time::timeout(timeout, handshake)
        .await
        .map_err(|_| StreamError::ConnectTimeout(timeout))??;

    Ok(socket.split())
}
