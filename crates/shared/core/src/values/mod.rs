use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Price value - uses Decimal so that price levels have a total order
pub type Price = Decimal;

/// Amount (size) at a price level or of a trade
pub type Amount = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;
