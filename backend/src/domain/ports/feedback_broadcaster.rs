//! Port abstraction for fanning feedback events out to observers.

use tokio::sync::broadcast;

use crate::domain::FeedbackUpdate;

use super::define_port_error;

define_port_error! {
    /// Errors raised by broadcast adapters.
    pub enum FeedbackBroadcastError {
        /// The transport refused the event.
        Rejected { message: String } => "feedback broadcast rejected: {message}",
    }
}

/// Delivery is best-effort and at-most-once: observers that fall behind skip
/// events instead of slowing publishers.
#[cfg_attr(test, mockall::automock)]
pub trait FeedbackBroadcaster: Send + Sync {
    /// Send `update` to every current observer, returning how many received it.
    fn publish(&self, update: FeedbackUpdate) -> Result<usize, FeedbackBroadcastError>;

    /// Register a new observer.
    fn subscribe(&self) -> broadcast::Receiver<FeedbackUpdate>;

    /// Number of observers currently subscribed.
    fn observer_count(&self) -> usize;
}
