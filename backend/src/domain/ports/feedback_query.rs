//! Driving port for reading counters and feedback listings.

use async_trait::async_trait;

use crate::domain::{CounterSnapshot, Error, FeedbackTableEntry, UserFeedback, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackQuery: Send + Sync {
    /// Current live counters.
    async fn counters(&self) -> Result<CounterSnapshot, Error>;

    /// The caller's current rating per meal.
    async fn feedback_for_user(&self, user_id: &UserId) -> Result<UserFeedback, Error>;

    /// Every record, newest update first.
    async fn feedback_table(&self) -> Result<Vec<FeedbackTableEntry>, Error>;

    /// Distinct users with at least one record.
    async fn active_user_count(&self) -> Result<u64, Error>;
}
