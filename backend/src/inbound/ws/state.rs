//! Shared WebSocket adapter state.
//!
//! The observer endpoint depends on the query port for the initial snapshot
//! and on the broadcaster port for subsequent updates, keeping the adapter
//! testable with in-memory doubles.

use std::sync::Arc;

use crate::domain::ports::{FeedbackBroadcaster, FeedbackQuery};

/// Dependency bundle for WebSocket handlers.
#[derive(Clone)]
pub struct WsState {
    pub query: Arc<dyn FeedbackQuery>,
    pub broadcaster: Arc<dyn FeedbackBroadcaster>,
}

impl WsState {
    /// Construct state from explicit port implementations.
    pub fn new(query: Arc<dyn FeedbackQuery>, broadcaster: Arc<dyn FeedbackBroadcaster>) -> Self {
        Self { query, broadcaster }
    }
}
