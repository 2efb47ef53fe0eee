//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{FeedbackCommand, FeedbackQuery, LoginService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub feedback: Arc<dyn FeedbackCommand>,
    pub feedback_query: Arc<dyn FeedbackQuery>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mess_feedback::domain::{FeedbackService, UserLoginService};
    /// use mess_feedback::inbound::http::state::HttpState;
    /// use mess_feedback::outbound::broadcast::BroadcastHub;
    /// use mess_feedback::outbound::counters::InProcessCounterCache;
    /// use mess_feedback::outbound::memory::InMemoryStore;
    /// use mockable::DefaultClock;
    ///
    /// let store = Arc::new(InMemoryStore::new(Arc::new(DefaultClock)));
    /// let service = Arc::new(FeedbackService::new(
    ///     store.clone(),
    ///     Arc::new(InProcessCounterCache::new()),
    ///     Arc::new(BroadcastHub::default()),
    ///     Arc::new(DefaultClock),
    /// ));
    /// let state = HttpState::new(
    ///     Arc::new(UserLoginService::new(store)),
    ///     service.clone(),
    ///     service,
    /// );
    /// let _login = state.login.clone();
    /// ```
    pub fn new(
        login: Arc<dyn LoginService>,
        feedback: Arc<dyn FeedbackCommand>,
        feedback_query: Arc<dyn FeedbackQuery>,
    ) -> Self {
        Self {
            login,
            feedback,
            feedback_query,
        }
    }
}
