//! Port abstraction for the durable feedback ledger.
//!
//! The ledger is the source of truth for every counter: one record per
//! `(user, meal)` plus an append-only history of submissions.

use async_trait::async_trait;

use crate::domain::{
    CounterTable, FeedbackTableEntry, FeedbackType, HistoryEntry, Meal, UpsertOutcome,
    UserFeedback, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by feedback ledger adapters.
    pub enum FeedbackLedgerError {
        /// The submitting user has no account row.
        UnknownUser { user_id: UserId } => "user {user_id} does not exist",
        /// Pool checkout or statement timed out, or the store is unreachable.
        Unavailable { message: String } => "feedback ledger unavailable: {message}",
        /// Query or transaction failed during execution.
        Query { message: String } => "feedback ledger query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackLedger: Send + Sync {
    /// Create or replace the caller's record for `meal` in one transaction.
    ///
    /// Concurrent writers on the same key serialise; exactly one of them
    /// observes [`crate::domain::FeedbackAction::Created`].
    async fn upsert_feedback(
        &self,
        user_id: &UserId,
        meal: Meal,
        feedback_type: FeedbackType,
    ) -> Result<UpsertOutcome, FeedbackLedgerError>;

    /// Append one audit row.
    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), FeedbackLedgerError>;

    /// Count records for every `(meal, rating)` pair.
    async fn count_feedback(&self) -> Result<CounterTable, FeedbackLedgerError>;

    /// Current rating per meal for one user.
    async fn feedback_for_user(&self, user_id: &UserId)
    -> Result<UserFeedback, FeedbackLedgerError>;

    /// Every record joined with its author, newest update first.
    async fn feedback_table(&self) -> Result<Vec<FeedbackTableEntry>, FeedbackLedgerError>;

    /// Distinct users holding at least one record.
    async fn active_user_count(&self) -> Result<u64, FeedbackLedgerError>;
}
