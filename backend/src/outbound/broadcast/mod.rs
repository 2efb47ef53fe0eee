//! In-process broadcast hub for feedback updates.
//!
//! Backed by a bounded [`tokio::sync::broadcast`] channel: publishers never
//! wait for observers, and an observer that falls more than `capacity`
//! events behind skips the oldest ones.

use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::FeedbackUpdate;
use crate::domain::ports::{FeedbackBroadcastError, FeedbackBroadcaster};

/// Default number of buffered events per observer.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Fan-out hub shared by the feedback service and WebSocket sessions.
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    sender: broadcast::Sender<FeedbackUpdate>,
}

impl BroadcastHub {
    /// Create a hub buffering up to `capacity` events per observer.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_CAPACITY)
    }
}

impl FeedbackBroadcaster for BroadcastHub {
    fn publish(&self, update: FeedbackUpdate) -> Result<usize, FeedbackBroadcastError> {
        match self.sender.send(update) {
            Ok(observers) => Ok(observers),
            Err(_) => {
                debug!("no observers subscribed; feedback update dropped");
                Ok(0)
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<FeedbackUpdate> {
        self.sender.subscribe()
    }

    fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
