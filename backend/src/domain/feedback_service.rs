//! Feedback domain service.
//!
//! Implements the feedback driving ports: the ledger write is the only step
//! whose failure aborts a submission. Counter deltas, history and broadcast
//! run after the ledger commit and only log on failure.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{Instrument, debug, info, warn};

use crate::domain::ports::{
    CounterCache, FeedbackBroadcaster, FeedbackCommand, FeedbackLedger, FeedbackLedgerError,
    FeedbackQuery,
};
use crate::domain::{
    CounterSnapshot, Error, FeedbackResult, FeedbackSubmission, FeedbackTableEntry, FeedbackType,
    FeedbackUpdate, HistoryEntry, Meal, MealParseError, TraceId, UpsertOutcome, UserFeedback,
    UserId,
};

/// Map ledger failures onto the domain error taxonomy.
pub(crate) fn map_ledger_error(error: FeedbackLedgerError) -> Error {
    match error {
        FeedbackLedgerError::UnknownUser { user_id } => {
            debug!(%user_id, "submission from unknown user");
            Error::unauthorized("login required")
        }
        FeedbackLedgerError::Unavailable { message } => {
            Error::service_unavailable(format!("feedback store unavailable: {message}"))
        }
        FeedbackLedgerError::Query { message } => {
            Error::internal(format!("feedback store error: {message}"))
        }
    }
}

fn invalid_field(error: MealParseError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({
        "field": error.field(),
        "value": error.value(),
        "code": "invalid_value",
    }))
}

/// Feedback service wiring the ledger, the counter cache and the broadcaster.
///
/// Type parameters may be trait objects so backings chosen at startup can be
/// injected behind `Arc<dyn _>`.
pub struct FeedbackService<L: ?Sized, C: ?Sized, B: ?Sized> {
    ledger: Arc<L>,
    cache: Arc<C>,
    broadcaster: Arc<B>,
    clock: Arc<dyn Clock>,
}

impl<L: ?Sized, C: ?Sized, B: ?Sized> Clone for FeedbackService<L, C, B> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            cache: Arc::clone(&self.cache),
            broadcaster: Arc::clone(&self.broadcaster),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<L: ?Sized, C: ?Sized, B: ?Sized> FeedbackService<L, C, B> {
    /// Create a service over the given collaborators.
    pub fn new(
        ledger: Arc<L>,
        cache: Arc<C>,
        broadcaster: Arc<B>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            cache,
            broadcaster,
            clock,
        }
    }
}

impl<L, C, B> FeedbackService<L, C, B>
where
    L: FeedbackLedger + ?Sized + 'static,
    C: CounterCache + ?Sized,
    B: FeedbackBroadcaster + ?Sized,
{
    fn apply_deltas(&self, meal: Meal, outcome: &UpsertOutcome, current: FeedbackType) {
        for (feedback_type, delta) in outcome.counter_deltas(current) {
            if let Err(err) = self.cache.apply_delta(meal, feedback_type, delta) {
                warn!(
                    error = %err,
                    %meal,
                    %feedback_type,
                    delta,
                    "failed to apply counter delta; counters drift until the next rebuild"
                );
            }
        }
    }

    /// Append the history entry on a detached task carrying the caller's
    /// trace id. The submission result does not wait for it.
    fn spawn_history(
        &self,
        user_id: UserId,
        meal: Meal,
        feedback_type: FeedbackType,
        outcome: &UpsertOutcome,
    ) {
        let entry = HistoryEntry {
            user_id,
            meal,
            feedback_type,
            action: outcome.action,
            recorded_at: self.clock.utc(),
        };
        let ledger = Arc::clone(&self.ledger);
        let append = async move {
            if let Err(err) = ledger.append_history(&entry).await {
                warn!(error = %err, %user_id, %meal, "failed to append feedback history");
            }
        }
        .in_current_span();
        match TraceId::current() {
            Some(trace_id) => drop(tokio::spawn(TraceId::scope(trace_id, append))),
            None => drop(tokio::spawn(append)),
        }
    }

    fn publish(&self, update: FeedbackUpdate) {
        match self.broadcaster.publish(update) {
            Ok(observers) => debug!(observers, "feedback update published"),
            Err(err) => warn!(error = %err, "failed to publish feedback update"),
        }
    }

    async fn ledger_snapshot(&self) -> Result<CounterSnapshot, Error> {
        let table = self
            .ledger
            .count_feedback()
            .await
            .map_err(map_ledger_error)?;
        Ok(table.to_snapshot())
    }
}

#[async_trait]
impl<L, C, B> FeedbackCommand for FeedbackService<L, C, B>
where
    L: FeedbackLedger + ?Sized + 'static,
    C: CounterCache + ?Sized,
    B: FeedbackBroadcaster + ?Sized,
{
    async fn submit(&self, submission: FeedbackSubmission) -> Result<FeedbackResult, Error> {
        let FeedbackSubmission {
            user_id,
            user_name,
            meal,
            feedback_type,
        } = submission;
        let meal: Meal = meal.parse().map_err(invalid_field)?;
        let feedback_type: FeedbackType = feedback_type.parse().map_err(invalid_field)?;

        let outcome = self
            .ledger
            .upsert_feedback(&user_id, meal, feedback_type)
            .await
            .map_err(map_ledger_error)?;

        self.apply_deltas(meal, &outcome, feedback_type);

        match self.cache.snapshot() {
            Ok(counters) => self.publish(FeedbackUpdate {
                counters,
                meal,
                feedback_type,
                user_id,
                user_name,
            }),
            Err(err) => warn!(error = %err, "counter snapshot unavailable; skipping broadcast"),
        }
        self.spawn_history(user_id, meal, feedback_type, &outcome);

        info!(
            %user_id,
            %meal,
            %feedback_type,
            action = outcome.action.as_str(),
            previous = outcome.previous.map(FeedbackType::as_str),
            "feedback recorded"
        );
        Ok(FeedbackResult {
            action: outcome.action,
        })
    }
}

#[async_trait]
impl<L, C, B> FeedbackQuery for FeedbackService<L, C, B>
where
    L: FeedbackLedger + ?Sized + 'static,
    C: CounterCache + ?Sized,
    B: FeedbackBroadcaster + ?Sized,
{
    async fn counters(&self) -> Result<CounterSnapshot, Error> {
        match self.cache.snapshot() {
            Ok(snapshot) => Ok(snapshot),
            Err(err) => {
                warn!(error = %err, "counter cache unavailable; counting from the ledger");
                self.ledger_snapshot().await
            }
        }
    }

    async fn feedback_for_user(&self, user_id: &UserId) -> Result<UserFeedback, Error> {
        self.ledger
            .feedback_for_user(user_id)
            .await
            .map_err(map_ledger_error)
    }

    async fn feedback_table(&self) -> Result<Vec<FeedbackTableEntry>, Error> {
        self.ledger.feedback_table().await.map_err(map_ledger_error)
    }

    async fn active_user_count(&self) -> Result<u64, Error> {
        self.ledger
            .active_user_count()
            .await
            .map_err(map_ledger_error)
    }
}

#[cfg(test)]
#[path = "feedback_service_tests.rs"]
mod tests;
