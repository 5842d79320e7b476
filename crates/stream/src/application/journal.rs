use serde_json::Value;

use crate::domain::Subscription;

/// Every subscribe request issued on one logical stream, in issue order
///
/// Append-only for the lifetime of the client. Owned by the connection's
/// writer state so that appends, sends and replays share one lock.
#[derive(Debug, Default)]
pub struct SubscriptionJournal {
    entries: Vec<Subscription>,
}

impl SubscriptionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request and return its sequence number
    pub fn record(&mut self, stream_id: impl Into<String>, payload: Value) -> u64 {
        let sequence = self.entries.len() as u64 + 1;
        self.entries.push(Subscription {
            stream_id: stream_id.into(),
            payload,
            sequence,
        });
        sequence
    }

    /// Entries in registration order
    pub fn entries(&self) -> &[Subscription] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, stream_id: &str) -> bool {
        self.entries.iter().any(|s| s.stream_id == stream_id)
    }
}
