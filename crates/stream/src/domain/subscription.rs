use serde_json::Value;

/// A subscribe request as it was issued on a logical stream
///
/// Immutable once recorded; replayed verbatim after every reconnect.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    /// Caller-chosen identifier (e.g. `"spot.depth"`)
    pub stream_id: String,
    /// Outbound request exactly as sent to the exchange
    pub payload: Value,
    /// Position in the journal, starting at 1
    pub sequence: u64,
}

impl Subscription {
    /// Text frame sent on the wire
    pub fn frame(&self) -> String {
        self.payload.to_string()
    }
}
