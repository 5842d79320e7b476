//! Exchange facades driven against a local WebSocket server speaking the
//! exchange wire format

use cambist_adapters::{BinanceSpotParser, BinanceSpotWs, HuobiSpotParser, HuobiSpotWs};
use cambist_core::{CurrencyPair, Depth, Ticker, Trade, TradeSide};
use cambist_stream::{Compression, StreamBuilder};
use flate2::Compression as Level;
use flate2::write::GzEncoder;
use futures_util::{SinkExt, StreamExt};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::io::Write;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

type ServerSocket = WebSocketStream<TcpStream>;

async fn listen() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    (listener, url)
}

async fn accept(listener: &TcpListener) -> ServerSocket {
    let (stream, _) = tokio::time::timeout(Duration::from_secs(2), listener.accept())
        .await
        .expect("client never connected")
        .unwrap();
    accept_async(stream).await.unwrap()
}

/// Next text frame from the client as JSON
async fn recv_json(ws: &mut ServerSocket) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for client frame")
            .expect("client went away")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

fn gzip(value: &Value) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Level::default());
    encoder.write_all(value.to_string().as_bytes()).unwrap();
    encoder.finish().unwrap()
}

async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("listener dropped")
}

// ============================================================================
// Huobi spot: gzip frames, ping/pong heartbeat
// ============================================================================

#[tokio::test]
async fn test_huobi_spot_heartbeat_and_depth() {
    let (listener, url) = listen().await;
    let builder = StreamBuilder::new().url(url).compression(Compression::Gzip);
    let ws = HuobiSpotWs::from_builder(builder, HuobiSpotParser::new(5)).unwrap();

    let (tx, mut depths) = mpsc::unbounded_channel::<Depth>();
    ws.on_depth(move |depth: Depth| {
        let _ = tx.send(depth);
    });

    let pair = CurrencyPair::new("BTC", "USDT");
    let subscribe = tokio::spawn(async move {
        ws.subscribe_depth(&pair).await.unwrap();
        ws
    });
    let mut server = accept(&listener).await;
    let ws = subscribe.await.unwrap();

    let sub = recv_json(&mut server).await;
    assert_eq!(sub, json!({"id": "spot.depth", "sub": "market.btcusdt.mbp.refresh.20"}));

    // Heartbeat probe is answered with the matching pong
    server
        .send(Message::Binary(gzip(&json!({"ping": 1492420473027i64})).into()))
        .await
        .unwrap();
    assert_eq!(recv_json(&mut server).await, json!({"pong": 1492420473027i64}));

    let levels: Vec<Value> = (0..8).map(|i| json!([50000 - i, 1])).collect();
    let frame = json!({
        "ch": "market.btcusdt.mbp.refresh.20",
        "ts": 1630000000000i64,
        "tick": {"seqNum": 1, "bids": levels, "asks": [[50001, 1], [50003, 2], [50002, 3]]}
    });
    server.send(Message::Binary(gzip(&frame).into())).await.unwrap();

    let depth = recv(&mut depths).await;
    assert_eq!(depth.pair, CurrencyPair::new("BTC", "USDT"));
    assert_eq!(depth.bids.len(), 5);
    assert_eq!(depth.bids[0].price, dec!(50000));
    let asks: Vec<_> = depth.asks.iter().map(|r| r.price).collect();
    assert_eq!(asks, vec![dec!(50003), dec!(50002), dec!(50001)]);

    let stats = ws.client().stats();
    assert_eq!(stats.heartbeats, 1);
    assert_eq!(stats.failures(), 0);

    ws.close().await.unwrap();
}

#[tokio::test]
async fn test_huobi_spot_subscriptions_replayed_after_drop() {
    let (listener, url) = listen().await;
    let builder = StreamBuilder::new()
        .url(url)
        .compression(Compression::Gzip)
        .reconnect_policy(cambist_stream::ReconnectPolicy::fixed(Duration::from_millis(50)));
    let ws = HuobiSpotWs::from_builder(builder, HuobiSpotParser::default()).unwrap();
    ws.on_depth(|_: Depth| {});
    ws.on_ticker(|_: Ticker| {});

    let pair = CurrencyPair::new("ETH", "BTC");
    let subscribe = tokio::spawn(async move {
        ws.subscribe_depth(&pair).await.unwrap();
        ws.subscribe_ticker(&pair).await.unwrap();
        ws
    });
    let mut first = accept(&listener).await;
    let ws = subscribe.await.unwrap();

    let depth_sub = recv_json(&mut first).await;
    let ticker_sub = recv_json(&mut first).await;
    assert_eq!(ticker_sub["sub"], "market.ethbtc.detail");

    drop(first);

    let mut second = accept(&listener).await;
    assert_eq!(recv_json(&mut second).await, depth_sub);
    assert_eq!(recv_json(&mut second).await, ticker_sub);

    ws.close().await.unwrap();
}

// ============================================================================
// Binance spot: combined stream, SUBSCRIBE ids
// ============================================================================

#[tokio::test]
async fn test_binance_spot_ticker_and_trade() {
    let (listener, url) = listen().await;
    let ws = BinanceSpotWs::from_builder(StreamBuilder::new().url(url), BinanceSpotParser::default())
        .unwrap();

    let (ticker_tx, mut tickers) = mpsc::unbounded_channel::<Ticker>();
    let (trade_tx, mut trades) = mpsc::unbounded_channel::<Trade>();
    ws.on_ticker(move |t: Ticker| {
        let _ = ticker_tx.send(t);
    });
    ws.on_trade(move |t: Trade| {
        let _ = trade_tx.send(t);
    });

    let pair = CurrencyPair::new("BTC", "USDT");
    let subscribe = tokio::spawn(async move {
        ws.subscribe_ticker(&pair).await.unwrap();
        ws.subscribe_trade(&pair).await.unwrap();
        ws
    });
    let mut server = accept(&listener).await;
    let ws = subscribe.await.unwrap();

    assert_eq!(
        recv_json(&mut server).await,
        json!({"method": "SUBSCRIBE", "params": ["btcusdt@ticker"], "id": 1})
    );
    assert_eq!(
        recv_json(&mut server).await,
        json!({"method": "SUBSCRIBE", "params": ["btcusdt@trade"], "id": 2})
    );

    let ack = json!({"result": null, "id": 1});
    let ticker = json!({
        "stream": "btcusdt@ticker",
        "data": {"e": "24hrTicker", "E": 1700000000000i64, "s": "BTCUSDT",
                 "c": "37000.1", "b": "37000.0", "a": "37000.2", "h": "38000", "l": "36000", "v": "1500"}
    });
    let trade = json!({
        "stream": "btcusdt@trade",
        "data": {"e": "trade", "E": 1, "s": "BTCUSDT", "t": 42, "p": "37000.1", "q": "0.5", "T": 1700000000001i64, "m": false}
    });
    for frame in [ack, ticker, trade] {
        server.send(Message::Text(frame.to_string().into())).await.unwrap();
    }

    let ticker = recv(&mut tickers).await;
    assert_eq!(ticker.last, dec!(37000.1));
    assert_eq!(ticker.buy, dec!(37000.0));
    assert_eq!(ticker.sell, dec!(37000.2));

    let trade = recv(&mut trades).await;
    assert_eq!(trade.tid, 42);
    assert_eq!(trade.side, TradeSide::Buy);
    assert_eq!(trade.amount, dec!(0.5));

    assert_eq!(ws.client().stats().unrecognized, 1);
    ws.close().await.unwrap();
}
