//! Proxy tunnelling for the WebSocket transport
//!
//! Opens a raw TCP stream to the target host through either an HTTP proxy
//! (`CONNECT`) or a SOCKS5 proxy. TLS and the WebSocket handshake then run
//! over the tunnel exactly as they would over a direct connection.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::net::{IpAddr, SocketAddr};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

use crate::error::{ProxyError, StreamError};

/// Upper bound on the proxy's CONNECT response head
const MAX_RESPONSE_HEAD: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// HTTP proxy, tunnelled with `CONNECT`
    Http,
    /// SOCKS5, target resolved locally
    Socks5,
    /// SOCKS5, target resolved by the proxy
    Socks5h,
}

/// Validated proxy endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub kind: ProxyKind,
    pub host: String,
    pub port: u16,
    pub credentials: Option<(String, String)>,
}

impl ProxyConfig {
    /// Parse `http://[user:pass@]host:port`, `socks5://..` or `socks5h://..`
    pub fn parse(proxy_url: &str) -> Result<Self, StreamError> {
        let url = Url::parse(proxy_url)
            .map_err(|e| StreamError::InvalidProxy(format!("{proxy_url}: {e}")))?;

        let kind = match url.scheme() {
            "http" | "https" => ProxyKind::Http,
            "socks5" => ProxyKind::Socks5,
            "socks5h" => ProxyKind::Socks5h,
            other => {
                return Err(StreamError::InvalidProxy(format!(
                    "{proxy_url}: unsupported scheme '{other}'"
                )));
            }
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| StreamError::InvalidProxy(format!("{proxy_url}: missing host")))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        // http(s) falls back to 80/443, socks to the IANA port
        let port = url.port_or_known_default().unwrap_or(1080);

        let credentials = if url.username().is_empty() {
            None
        } else {
            Some((
                url.username().to_string(),
                url.password().unwrap_or_default().to_string(),
            ))
        };

        Ok(Self {
            kind,
            host,
            port,
            credentials,
        })
    }

    /// Connect to the proxy and open a tunnel to `target_host:target_port`
    pub async fn tunnel(&self, target_host: &str, target_port: u16) -> Result<TcpStream, ProxyError> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        stream.set_nodelay(true)?;

        debug!(
            proxy = %format!("{}:{}", self.host, self.port),
            target = %format!("{target_host}:{target_port}"),
            kind = ?self.kind,
            "opening proxy tunnel"
        );

        match self.kind {
            ProxyKind::Http => self.http_connect(&mut stream, target_host, target_port).await?,
            ProxyKind::Socks5 => {
                let addr = resolve(target_host, target_port).await?;
                self.socks5_connect(&mut stream, SocksTarget::Addr(addr)).await?
            }
            ProxyKind::Socks5h => {
                self.socks5_connect(&mut stream, SocksTarget::Domain(target_host, target_port))
                    .await?
            }
        }

        Ok(stream)
    }

    async fn http_connect(
        &self,
        stream: &mut TcpStream,
        host: &str,
        port: u16,
    ) -> Result<(), ProxyError> {
        let authority = if host.contains(':') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };

        let mut request = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n");
        if let Some((user, pass)) = &self.credentials {
            let token = STANDARD.encode(format!("{user}:{pass}"));
            request.push_str(&format!("Proxy-Authorization: Basic {token}\r\n"));
        }
        request.push_str("\r\n");
        stream.write_all(request.as_bytes()).await?;

        // Read byte by byte so nothing past the response head is consumed;
        // the bytes after it belong to the TLS handshake.
        let mut head = Vec::with_capacity(256);
        let mut byte = [0u8; 1];
        while !head.ends_with(b"\r\n\r\n") {
            if head.len() >= MAX_RESPONSE_HEAD {
                return Err(ProxyError::ConnectRefused("response head too large".into()));
            }
            let n = stream.read(&mut byte).await?;
            if n == 0 {
                return Err(ProxyError::ConnectRefused("proxy closed the connection".into()));
            }
            head.push(byte[0]);
        }

        let status_line = String::from_utf8_lossy(&head)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        let status = status_line.split_whitespace().nth(1).unwrap_or_default();
        if status == "200" {
            Ok(())
        } else {
            Err(ProxyError::ConnectRefused(status_line))
        }
    }

    async fn socks5_connect(
        &self,
        stream: &mut TcpStream,
        target: SocksTarget<'_>,
    ) -> Result<(), ProxyError> {
        // Greeting: offer username/password only when we have credentials
        let greeting: &[u8] = if self.credentials.is_some() {
            &[0x05, 0x02, 0x00, 0x02]
        } else {
            &[0x05, 0x01, 0x00]
        };
        stream.write_all(greeting).await?;

        let mut choice = [0u8; 2];
        stream.read_exact(&mut choice).await?;
        if choice[0] != 0x05 {
            return Err(ProxyError::Socks(format!("unexpected version {}", choice[0])));
        }
        match (choice[1], &self.credentials) {
            (0x00, _) => {}
            (0x02, Some((user, pass))) => socks5_authenticate(stream, user, pass).await?,
            (0xFF, _) => return Err(ProxyError::Socks("no acceptable auth method".into())),
            (method, _) => {
                return Err(ProxyError::Socks(format!("unsupported auth method {method:#04x}")));
            }
        }

        let mut request = vec![0x05, 0x01, 0x00];
        let port = match target {
            SocksTarget::Addr(addr) => {
                match addr.ip() {
                    IpAddr::V4(ip) => {
                        request.push(0x01);
                        request.extend_from_slice(&ip.octets());
                    }
                    IpAddr::V6(ip) => {
                        request.push(0x04);
                        request.extend_from_slice(&ip.octets());
                    }
                }
                addr.port()
            }
            SocksTarget::Domain(host, port) => {
                let len = u8::try_from(host.len())
                    .map_err(|_| ProxyError::Socks(format!("host name too long: {host}")))?;
                request.push(0x03);
                request.push(len);
                request.extend_from_slice(host.as_bytes());
                port
            }
        };
        request.extend_from_slice(&port.to_be_bytes());
        stream.write_all(&request).await?;

        let mut reply = [0u8; 4];
        stream.read_exact(&mut reply).await?;
        if reply[1] != 0x00 {
            return Err(ProxyError::Socks(socks5_reply_message(reply[1]).to_string()));
        }

        // Drain the bound address so the stream is positioned at the tunnel
        let skip = match reply[3] {
            0x01 => 4,
            0x04 => 16,
            0x03 => {
                let mut len = [0u8; 1];
                stream.read_exact(&mut len).await?;
                usize::from(len[0])
            }
            other => return Err(ProxyError::Socks(format!("bad address type {other}"))),
        };
        let mut bound = vec![0u8; skip + 2];
        stream.read_exact(&mut bound).await?;

        Ok(())
    }
}

enum SocksTarget<'a> {
    Addr(SocketAddr),
    Domain(&'a str, u16),
}

async fn socks5_authenticate(stream: &mut TcpStream, user: &str, pass: &str) -> Result<(), ProxyError> {
    let user_len = u8::try_from(user.len()).map_err(|_| ProxyError::Socks("username too long".into()))?;
    let pass_len = u8::try_from(pass.len()).map_err(|_| ProxyError::Socks("password too long".into()))?;

    let mut request = Vec::with_capacity(3 + user.len() + pass.len());
    request.push(0x01);
    request.push(user_len);
    request.extend_from_slice(user.as_bytes());
    request.push(pass_len);
    request.extend_from_slice(pass.as_bytes());
    stream.write_all(&request).await?;

    let mut status = [0u8; 2];
    stream.read_exact(&mut status).await?;
    if status[1] != 0x00 {
        return Err(ProxyError::Socks("authentication rejected".into()));
    }
    Ok(())
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, ProxyError> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| ProxyError::Resolve(host.to_string()))
}

fn socks5_reply_message(code: u8) -> &'static str {
    match code {
        0x01 => "general SOCKS server failure",
        0x02 => "connection not allowed by ruleset",
        0x03 => "network unreachable",
        0x04 => "host unreachable",
        0x05 => "connection refused",
        0x06 => "TTL expired",
        0x07 => "command not supported",
        0x08 => "address type not supported",
        _ => "unknown SOCKS5 failure",
    }
}
