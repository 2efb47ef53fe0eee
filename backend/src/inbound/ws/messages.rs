//! Wire-level message definitions for the observer channel.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.

use serde::Serialize;

use crate::domain::{CounterSnapshot, FeedbackUpdate};

/// Greeting sent once per connection before the first snapshot.
pub const CONNECTED_MESSAGE: &str = "Connected to live feed";

/// Outbound frames pushed to observers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ObserverMessage {
    /// Connection accepted.
    Connected { message: &'static str },
    /// Full counter state, sent right after `connected`.
    CountersSnapshot(CounterSnapshot),
    /// One successful submission and the counters it produced.
    FeedbackUpdate(FeedbackUpdate),
}

impl ObserverMessage {
    /// Greeting frame.
    #[must_use]
    pub fn connected() -> Self {
        Self::Connected {
            message: CONNECTED_MESSAGE,
        }
    }
}
