//! Shared wiring for integration tests.
//!
//! Integration tests under `backend/tests/` compile as separate crates; these
//! helpers assemble the in-memory stack once so each suite stays focused on
//! behaviour.

#![allow(dead_code, reason = "each test crate uses a different subset")]

use std::sync::Arc;

use mess_feedback::domain::ports::{CounterCache, LoginService};
use mess_feedback::domain::{
    FeedbackService, FeedbackSubmission, LoginDetails, User, UserLoginService,
};
use mess_feedback::outbound::broadcast::BroadcastHub;
use mess_feedback::outbound::counters::InProcessCounterCache;
use mess_feedback::outbound::memory::InMemoryStore;
use mockable::DefaultClock;

pub type Service = FeedbackService<InMemoryStore, dyn CounterCache, BroadcastHub>;

/// In-memory ledger, a counter cache and a broadcast hub wired together.
pub struct Stack {
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<dyn CounterCache>,
    pub hub: Arc<BroadcastHub>,
    pub service: Service,
    pub login: Arc<UserLoginService<InMemoryStore>>,
}

impl Stack {
    /// Build a stack over the given cache with a fresh store.
    pub fn with_cache(cache: Arc<dyn CounterCache>) -> Self {
        Self::over(Arc::new(InMemoryStore::new(Arc::new(DefaultClock))), cache)
    }

    /// Build a stack over an existing store, as a restarted worker would.
    pub fn over(store: Arc<InMemoryStore>, cache: Arc<dyn CounterCache>) -> Self {
        let hub = Arc::new(BroadcastHub::new(64));
        let service = FeedbackService::new(
            Arc::clone(&store),
            Arc::clone(&cache),
            Arc::clone(&hub),
            Arc::new(DefaultClock),
        );
        let login = Arc::new(UserLoginService::new(Arc::clone(&store)));
        Self {
            store,
            cache,
            hub,
            service,
            login,
        }
    }

    /// Build a stack with in-process counters.
    pub fn in_process() -> Self {
        Self::with_cache(Arc::new(InProcessCounterCache::new()))
    }

    /// Log in a student whose college id and email derive from `n`.
    pub async fn student(&self, n: usize) -> User {
        let details = LoginDetails::try_from_parts(
            format!("Student {n}"),
            format!("CS{n:04}"),
            format!("student{n}@example.edu"),
        )
        .expect("valid login details");
        self.login.login(&details).await.expect("login succeeds")
    }
}

/// Build a submission for `user`.
pub fn submission(user: &User, meal: &str, feedback_type: &str) -> FeedbackSubmission {
    FeedbackSubmission {
        user_id: *user.id(),
        user_name: user.name().to_owned(),
        meal: meal.to_owned(),
        feedback_type: feedback_type.to_owned(),
    }
}
