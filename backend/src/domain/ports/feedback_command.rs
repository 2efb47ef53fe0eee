//! Driving port for submitting feedback.

use async_trait::async_trait;

use crate::domain::{Error, FeedbackResult, FeedbackSubmission};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackCommand: Send + Sync {
    /// Validate, persist, count and broadcast one submission.
    ///
    /// # Errors
    ///
    /// - `invalid_request` with `details.field` for an unknown meal or rating.
    /// - `unauthorized` when the submitting user does not exist.
    /// - `service_unavailable` when the ledger timed out.
    /// - `internal_error` for any other ledger failure.
    async fn submit(&self, submission: FeedbackSubmission) -> Result<FeedbackResult, Error>;
}
