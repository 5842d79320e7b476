#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Connected { conn_id: usize },
    Text { conn_id: usize, text: String },
    Binary { conn_id: usize, bytes: Vec<u8> },
    Ping { conn_id: usize },
    Pong { conn_id: usize, bytes: Vec<u8> },
    Disconnected { conn_id: usize },
}

#[derive(Debug, Clone)]
pub enum MockCmd {
    SendText(String),
    SendBinary(Vec<u8>),
    SendPing(Vec<u8>),
    /// Close handshake
    Close,
    /// Drop the TCP connection without a close handshake
    Drop,
}

/// Local WebSocket server standing in for an exchange
///
/// Every accepted connection gets an id (1, 2, ...). Tests drive connections
/// through `send`/`drop_conn` and observe what the client did through
/// `next_event`.
pub struct MockExchange {
    pub addr: SocketAddr,
    events: mpsc::UnboundedReceiver<MockEvent>,
    conns: Arc<Mutex<HashMap<usize, mpsc::UnboundedSender<MockCmd>>>>,
    accepted: Arc<AtomicUsize>,
    refuse: Arc<AtomicUsize>,
    refused: Arc<AtomicUsize>,
}

impl MockExchange {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (evt_tx, events) = mpsc::unbounded_channel();
        let conns: Arc<Mutex<HashMap<usize, mpsc::UnboundedSender<MockCmd>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let accepted = Arc::new(AtomicUsize::new(0));
        let refuse = Arc::new(AtomicUsize::new(0));
        let refused = Arc::new(AtomicUsize::new(0));

        tokio::spawn({
            let conns = conns.clone();
            let accepted = accepted.clone();
            let refuse = refuse.clone();
            let refused = refused.clone();
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let refusing = refuse
                        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                        .is_ok();
                    if refusing {
                        // Hang up before the WebSocket handshake
                        drop(stream);
                        refused.fetch_add(1, Ordering::SeqCst);
                        continue;
                    }

                    let conn_id = accepted.fetch_add(1, Ordering::SeqCst) + 1;
                    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
                    conns.lock().await.insert(conn_id, cmd_tx);

                    let evt_tx = evt_tx.clone();
                    let conns = conns.clone();
                    tokio::spawn(async move {
                        serve(conn_id, stream, cmd_rx, evt_tx.clone()).await;
                        conns.lock().await.remove(&conn_id);
                        let _ = evt_tx.send(MockEvent::Disconnected { conn_id });
                    });
                }
            }
        });

        MockExchange {
            addr,
            events,
            conns,
            accepted,
            refuse,
            refused,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Connections accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Hang up on the next `n` connection attempts without a handshake.
    /// Refused attempts get no connection id.
    pub fn refuse_next(&self, n: usize) {
        self.refuse.store(n, Ordering::SeqCst);
    }

    /// Connection attempts refused so far
    pub fn refused(&self) -> usize {
        self.refused.load(Ordering::SeqCst)
    }

    /// Poll until at least `n` attempts were refused, failing after two seconds
    pub async fn wait_refused(&self, n: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.refused() < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {n} refused attempts, got {}",
                self.refused()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub async fn send_text(&self, conn_id: usize, text: impl Into<String>) {
        self.command(conn_id, MockCmd::SendText(text.into())).await;
    }

    pub async fn send_binary(&self, conn_id: usize, bytes: Vec<u8>) {
        self.command(conn_id, MockCmd::SendBinary(bytes)).await;
    }

    pub async fn send_ping(&self, conn_id: usize, bytes: Vec<u8>) {
        self.command(conn_id, MockCmd::SendPing(bytes)).await;
    }

    pub async fn drop_conn(&self, conn_id: usize) {
        self.command(conn_id, MockCmd::Drop).await;
    }

    pub async fn close_conn(&self, conn_id: usize) {
        self.command(conn_id, MockCmd::Close).await;
    }

    async fn command(&self, conn_id: usize, cmd: MockCmd) {
        let tx = self.conns.lock().await.get(&conn_id).cloned();
        tx.expect("unknown connection").send(cmd).unwrap();
    }

    /// Next event, failing the test after two seconds
    pub async fn next_event(&mut self) -> MockEvent {
        tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("timed out waiting for mock exchange event")
            .expect("mock exchange stopped")
    }

    /// Skip events until a connection is accepted; returns its id
    pub async fn wait_connected(&mut self) -> usize {
        loop {
            if let MockEvent::Connected { conn_id } = self.next_event().await {
                return conn_id;
            }
        }
    }

    /// Skip events until `conn_id` delivers a text frame
    pub async fn next_text(&mut self, conn_id: usize) -> String {
        loop {
            match self.next_event().await {
                MockEvent::Text { conn_id: id, text } if id == conn_id => return text,
                _ => {}
            }
        }
    }

    /// Assert nothing arrives for `window`
    pub async fn assert_quiet(&mut self, window: Duration) {
        if let Ok(Some(event)) = tokio::time::timeout(window, self.events.recv()).await {
            panic!("unexpected event: {event:?}");
        }
    }
}

async fn serve(
    conn_id: usize,
    stream: tokio::net::TcpStream,
    mut cmd_rx: mpsc::UnboundedReceiver<MockCmd>,
    evt_tx: mpsc::UnboundedSender<MockEvent>,
) {
    let Ok(mut ws) = accept_async(stream).await else {
        return;
    };
    let _ = evt_tx.send(MockEvent::Connected { conn_id });

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    MockCmd::SendText(text) => {
                        let _ = ws.send(Message::Text(text.into())).await;
                    }
                    MockCmd::SendBinary(bytes) => {
                        let _ = ws.send(Message::Binary(bytes.into())).await;
                    }
                    MockCmd::SendPing(bytes) => {
                        let _ = ws.send(Message::Ping(bytes.into())).await;
                    }
                    MockCmd::Close => {
                        let _ = ws.close(None).await;
                        break;
                    }
                    MockCmd::Drop => break,
                }
            }

            msg = ws.next() => {
                let Some(Ok(msg)) = msg else { break };
                let event = match msg {
                    Message::Text(text) => MockEvent::Text { conn_id, text: text.to_string() },
                    Message::Binary(bytes) => MockEvent::Binary { conn_id, bytes: bytes.to_vec() },
                    Message::Ping(_) => MockEvent::Ping { conn_id },
                    Message::Pong(bytes) => MockEvent::Pong { conn_id, bytes: bytes.to_vec() },
                    Message::Close(_) => break,
                    Message::Frame(_) => continue,
                };
                let _ = evt_tx.send(event);
            }
        }
    }
}
