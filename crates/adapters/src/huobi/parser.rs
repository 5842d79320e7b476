//! Wire helpers shared by the Huobi spot and swap streams
//!
//! Every Huobi market frame is gzip-compressed JSON of the form
//! `{"ch": "market.<symbol>.<topic>", "ts": <ms>, "tick": {...}}`. Heartbeats
//! arrive as `{"ping": <ts>}` and must be echoed back as `{"pong": <ts>}`.

use cambist_core::{CurrencyPair, DepthRecord, Timestamp, Trade, TradeSide, coerce, normalize};
use cambist_stream::{DecodeError, MessageKind};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Heartbeat probe detection by byte substitution
///
/// The server probe carries its own timestamp; answering with the same
/// payload and `ping` swapped for `pong` keeps the session alive.
pub fn heartbeat_reply(payload: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(payload).ok()?;
    if !text.contains("\"ping\"") {
        return None;
    }
    Some(text.replace("ping", "pong").into_bytes())
}

/// The `ch` field; `None` when absent or empty (subscription acks)
pub fn channel(msg: &Value) -> Option<&str> {
    msg.get("ch").and_then(Value::as_str).filter(|ch| !ch.is_empty())
}

/// Map a channel to the message kind it carries
///
/// `trade.detail` has to be checked before `.detail`, which is the ticker.
pub fn classify_channel(ch: &str) -> MessageKind {
    if ch.contains(".mbp.refresh") || ch.contains(".depth.") {
        MessageKind::Depth
    } else if ch.ends_with(".trade.detail") {
        MessageKind::Trade
    } else if ch.ends_with(".detail") {
        MessageKind::Ticker
    } else {
        MessageKind::Unrecognized
    }
}

/// Second segment of `market.<symbol>.<topic>`
pub fn channel_symbol(ch: &str) -> Option<&str> {
    ch.split('.').nth(1).filter(|s| !s.is_empty())
}

pub fn tick(msg: &Value) -> Result<&Value, DecodeError> {
    msg.get("tick")
        .filter(|t| t.is_object())
        .ok_or(DecodeError::MissingField("tick"))
}

/// Frame timestamp, falling back to the local clock when `ts` is missing
pub fn frame_time(msg: &Value) -> Timestamp {
    let ts = coerce::field_i64(msg, "ts");
    if ts > 0 {
        DateTime::<Utc>::from_timestamp_millis(ts).unwrap_or_else(Utc::now)
    } else {
        Utc::now()
    }
}

/// Bid and ask lists of a book tick, normalized and cut to `limit`
pub fn depth_levels(
    tick: &Value,
    limit: usize,
) -> Result<(Vec<DepthRecord>, Vec<DepthRecord>), DecodeError> {
    let bids = side(tick, "bids")?;
    let asks = side(tick, "asks")?;
    Ok(normalize(bids, asks, limit))
}

fn side<'a>(tick: &'a Value, key: &'static str) -> Result<&'a [Value], DecodeError> {
    match tick.get(key) {
        Some(Value::Array(levels)) => Ok(levels),
        // An emptied side is sent as null
        Some(Value::Null) => Ok(&[]),
        _ => Err(DecodeError::MissingField(key)),
    }
}

/// Fan a `trade.detail` tick out into one trade per print
pub fn trades(tick: &Value, pair: &CurrencyPair, contract_type: Option<&str>) -> Result<Vec<Trade>, DecodeError> {
    let data = tick
        .get("data")
        .and_then(Value::as_array)
        .ok_or(DecodeError::MissingField("data"))?;

    data.iter()
        .map(|print| {
            let direction = print.get("direction").and_then(Value::as_str).unwrap_or_default();
            let side = TradeSide::adapt(direction)
                .ok_or_else(|| DecodeError::Malformed(format!("trade direction {direction:?}")))?;
            // `tradeId` fits an i64, the legacy `id` often does not
            let tid = match print.get("tradeId") {
                Some(id) => coerce::to_i64(id),
                None => coerce::field_i64(print, "id"),
            };
            Ok(Trade {
                tid,
                side,
                amount: coerce::field_decimal(print, "amount"),
                price: coerce::field_decimal(print, "price"),
                date: coerce::field_i64(print, "ts"),
                pair: pair.clone(),
                contract_type: contract_type.map(str::to_string),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_heartbeat_reply() {
        let reply = heartbeat_reply(br#"{"ping":1492420473027}"#).unwrap();
        assert_eq!(reply, br#"{"pong":1492420473027}"#);
        assert!(heartbeat_reply(br#"{"ch":"market.btcusdt.detail"}"#).is_none());
        assert!(heartbeat_reply(&[0xff, 0xfe]).is_none());
    }

    #[test]
    fn test_classify_channel() {
        assert_eq!(classify_channel("market.btcusdt.mbp.refresh.20"), MessageKind::Depth);
        assert_eq!(classify_channel("market.BTC-USD.depth.step6"), MessageKind::Depth);
        assert_eq!(classify_channel("market.btcusdt.trade.detail"), MessageKind::Trade);
        assert_eq!(classify_channel("market.btcusdt.detail"), MessageKind::Ticker);
        assert_eq!(classify_channel("market.btcusdt.kline.1min"), MessageKind::Unrecognized);
    }

    #[test]
    fn test_channel_ignores_acks() {
        assert_eq!(channel(&json!({"id": "spot.depth", "status": "ok", "subbed": "x"})), None);
        assert_eq!(channel(&json!({"ch": ""})), None);
        assert_eq!(channel(&json!({"ch": "market.btcusdt.detail"})), Some("market.btcusdt.detail"));
        assert_eq!(channel_symbol("market.btcusdt.detail"), Some("btcusdt"));
        assert_eq!(channel_symbol("market"), None);
    }

    #[test]
    fn test_null_side_is_empty() {
        let tick = json!({"bids": [[100.0, 1.0]], "asks": null});
        let (bids, asks) = depth_levels(&tick, 20).unwrap();
        assert_eq!(bids.len(), 1);
        assert!(asks.is_empty());
        assert!(matches!(
            depth_levels(&json!({"bids": []}), 20),
            Err(DecodeError::MissingField("asks"))
        ));
    }

    #[test]
    fn test_trades_fan_out() {
        let tick = json!({
            "id": 1, "ts": 1,
            "data": [
                {"id": 10, "tradeId": 100, "price": 50000.5, "amount": 0.1, "direction": "buy", "ts": 1630000000000i64},
                {"id": 11, "tradeId": 101, "price": "50001", "amount": "2", "direction": "sell", "ts": 1630000000001i64}
            ]
        });
        let pair = CurrencyPair::new("BTC", "USDT");
        let trades = trades(&tick, &pair, None).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].tid, 100);
        assert_eq!(trades[0].side, TradeSide::Buy);
        assert_eq!(trades[0].price, dec!(50000.5));
        assert_eq!(trades[1].side, TradeSide::Sell);
        assert_eq!(trades[1].amount, dec!(2));
        assert_eq!(trades[1].date, 1630000000001);
    }

    #[test]
    fn test_trade_with_unknown_direction_is_rejected() {
        let tick = json!({"data": [{"id": 1, "price": 1, "amount": 1, "direction": "hold", "ts": 1}]});
        assert!(trades(&tick, &CurrencyPair::unknown(), None).is_err());
    }

    #[test]
    fn test_frame_time() {
        let t = frame_time(&json!({"ts": 1630000000000i64}));
        assert_eq!(t.timestamp_millis(), 1630000000000);
    }
}
