//! Depth normalization
//!
//! Turns the bid/ask arrays of one wire-format book message into the
//! canonical [`DepthRecord`] lists used by [`crate::Depth`].
//!
//! Ordering contract:
//! - duplicate prices collapse into one level carrying the latest amount,
//!   at the position where the price first appeared
//! - each side is truncated to `limit` levels in exchange-delivered order
//! - asks are then sorted ascending and reversed, i.e. strictly descending
//! - bids keep the exchange-delivered order
//!
//! The bid/ask asymmetry is kept on purpose: it matches the order the feed
//! has always handed to callers, and [`crate::Depth::best_ask`] relies on it.

use serde_json::Value;
use std::collections::HashMap;

use crate::coerce::to_decimal;
use crate::entities::DepthRecord;
use crate::values::Price;

/// Normalize raw bid and ask levels into fresh `(bids, asks)` lists.
///
/// Each raw level is either a `[price, amount, ..]` array or an object with
/// `price`/`amount` style keys; numbers and numeric strings are both accepted
/// and anything unparseable becomes zero.
pub fn normalize(
    raw_bids: &[Value],
    raw_asks: &[Value],
    limit: usize,
) -> (Vec<DepthRecord>, Vec<DepthRecord>) {
    normalize_records(
        raw_bids.iter().map(parse_level),
        raw_asks.iter().map(parse_level),
        limit,
    )
}

/// Same as [`normalize`] for levels that are already typed
pub fn normalize_records<B, A>(bids: B, asks: A, limit: usize) -> (Vec<DepthRecord>, Vec<DepthRecord>)
where
    B: IntoIterator<Item = DepthRecord>,
    A: IntoIterator<Item = DepthRecord>,
{
    let bids = collapse_and_truncate(bids, limit);

    let mut asks = collapse_and_truncate(asks, limit);
    asks.sort_by(|a, b| a.price.cmp(&b.price));
    asks.reverse();

    (bids, asks)
}

/// Parse one wire-format price level
pub fn parse_level(level: &Value) -> DepthRecord {
    match level {
        Value::Array(items) => DepthRecord::new(
            items.first().map(to_decimal).unwrap_or_default(),
            items.get(1).map(to_decimal).unwrap_or_default(),
        ),
        Value::Object(_) => DepthRecord::new(
            first_field(level, &["price", "p", "px"]),
            first_field(level, &["amount", "qty", "quantity", "size", "q", "sz"]),
        ),
        _ => DepthRecord::default(),
    }
}

fn first_field(object: &Value, keys: &[&str]) -> Price {
    keys.iter()
        .find_map(|key| object.get(*key))
        .map(to_decimal)
        .unwrap_or_default()
}

fn collapse_and_truncate<I>(records: I, limit: usize) -> Vec<DepthRecord>
where
    I: IntoIterator<Item = DepthRecord>,
{
    let mut levels: Vec<DepthRecord> = Vec::new();
    let mut positions: HashMap<Price, usize> = HashMap::new();

    for record in records {
        match positions.get(&record.price) {
            Some(&idx) => levels[idx].amount = record.amount,
            None => {
                positions.insert(record.price, levels.len());
                levels.push(record);
            }
        }
    }

    levels.truncate(limit);
    levels
}
