//! Feedback records, submission outcomes and observer events.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{CounterSnapshot, FeedbackType, Meal, UserId};

/// Whether a submission created the user's record for a meal or replaced it.
///
/// The first submission is reported to clients as `submitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FeedbackAction {
    #[serde(rename = "submitted")]
    Created,
    #[serde(rename = "updated")]
    Updated,
}

impl FeedbackAction {
    /// Wire and history representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "submitted",
            Self::Updated => "updated",
        }
    }

    /// Human-readable confirmation returned to the submitter.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Created => "Feedback submitted successfully",
            Self::Updated => "Feedback updated successfully",
        }
    }
}

/// Result of a ledger upsert for one `(user, meal)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub action: FeedbackAction,
    /// Rating held before the write; `None` when the record was created.
    pub previous: Option<FeedbackType>,
}

impl UpsertOutcome {
    /// Outcome of a first submission.
    #[must_use]
    pub const fn created() -> Self {
        Self {
            action: FeedbackAction::Created,
            previous: None,
        }
    }

    /// Outcome of replacing `previous`.
    #[must_use]
    pub const fn updated(previous: FeedbackType) -> Self {
        Self {
            action: FeedbackAction::Updated,
            previous: Some(previous),
        }
    }

    /// Counter adjustments implied by moving the record to `current`.
    ///
    /// Re-submitting the same rating yields no adjustments.
    ///
    /// # Examples
    /// ```
    /// use mess_feedback::domain::{FeedbackType, UpsertOutcome};
    ///
    /// let deltas = UpsertOutcome::updated(FeedbackType::Good).counter_deltas(FeedbackType::Poor);
    /// assert_eq!(deltas, vec![(FeedbackType::Good, -1), (FeedbackType::Poor, 1)]);
    /// ```
    #[must_use]
    pub fn counter_deltas(&self, current: FeedbackType) -> Vec<(FeedbackType, i32)> {
        match self.previous {
            Some(previous) if previous == current => Vec::new(),
            Some(previous) => vec![(previous, -1), (current, 1)],
            None => vec![(current, 1)],
        }
    }
}

/// Raw submission as received from an inbound adapter.
///
/// Meal and rating stay unparsed until the feedback service validates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSubmission {
    pub user_id: UserId,
    pub user_name: String,
    pub meal: String,
    pub feedback_type: String,
}

/// Successful submission result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackResult {
    pub action: FeedbackAction,
}

/// Immutable audit row written once per submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub user_id: UserId,
    pub meal: Meal,
    pub feedback_type: FeedbackType,
    pub action: FeedbackAction,
    pub recorded_at: DateTime<Utc>,
}

/// One row of the feedback table listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackTableEntry {
    pub name: String,
    pub college_id: String,
    pub email: String,
    pub meal: Meal,
    pub feedback_type: FeedbackType,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller's current rating per meal.
pub type UserFeedback = BTreeMap<Meal, FeedbackType>;

/// Event fanned out to observers after every successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackUpdate {
    pub counters: CounterSnapshot,
    pub meal: Meal,
    pub feedback_type: FeedbackType,
    #[schema(value_type = String)]
    pub user_id: UserId,
    pub user_name: String,
}
