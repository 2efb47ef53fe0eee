//! In-memory ledger and user store.
//!
//! Used when no database is configured and by integration tests. The store
//! mirrors the relational schema: accounts are unique by college id and by
//! email, feedback is unique by `(user, meal)`, and history is append-only.
//! A seeded administrator account matches the database migration.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;

use crate::domain::ports::{
    FeedbackLedger, FeedbackLedgerError, UserPersistenceError, UserRepository,
};
use crate::domain::{
    CounterTable, FeedbackTableEntry, FeedbackType, HistoryEntry, LoginDetails, Meal, Role,
    UpsertOutcome, User, UserFeedback, UserId,
};

/// College id of the seeded administrator.
pub const ADMIN_COLLEGE_ID: &str = "ADMIN001";
/// Email of the seeded administrator.
pub const ADMIN_EMAIL: &str = "admin@ch.students.amrita.edu";
/// Display name of the seeded administrator.
pub const ADMIN_NAME: &str = "Admin User";

#[derive(Debug, Clone, Copy)]
struct FeedbackRow {
    feedback_type: FeedbackType,
    submitted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    feedback: HashMap<(UserId, Meal), FeedbackRow>,
    history: Vec<HistoryEntry>,
}

/// Process-local implementation of the ledger and user ports.
pub struct InMemoryStore {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    /// Create a store holding only the seeded administrator.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let mut state = State::default();
        if let Ok(details) = LoginDetails::try_from_parts(ADMIN_NAME, ADMIN_COLLEGE_ID, ADMIN_EMAIL)
        {
            let admin = User::new(UserId::random(), details, Role::Admin);
            state.users.insert(*admin.id(), admin);
        }
        Self {
            state: Mutex::new(state),
            clock,
        }
    }

    /// Number of history rows appended so far.
    pub fn history_len(&self) -> usize {
        self.state().map(|state| state.history.len()).unwrap_or_default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, PoisonedStore> {
        self.state.lock().map_err(|_| PoisonedStore)
    }
}

struct PoisonedStore;

impl From<PoisonedStore> for FeedbackLedgerError {
    fn from(_: PoisonedStore) -> Self {
        FeedbackLedgerError::query("in-memory store lock poisoned")
    }
}

impl From<PoisonedStore> for UserPersistenceError {
    fn from(_: PoisonedStore) -> Self {
        UserPersistenceError::query("in-memory store lock poisoned")
    }
}

#[async_trait]
impl FeedbackLedger for InMemoryStore {
    async fn upsert_feedback(
        &self,
        user_id: &UserId,
        meal: Meal,
        feedback_type: FeedbackType,
    ) -> Result<UpsertOutcome, FeedbackLedgerError> {
        let now = self.clock.utc();
        let mut state = self.state()?;
        if !state.users.contains_key(user_id) {
            return Err(FeedbackLedgerError::unknown_user(*user_id));
        }
        match state.feedback.get_mut(&(*user_id, meal)) {
            Some(row) => {
                let previous = row.feedback_type;
                row.feedback_type = feedback_type;
                row.updated_at = now;
                Ok(UpsertOutcome::updated(previous))
            }
            None => {
                state.feedback.insert(
                    (*user_id, meal),
                    FeedbackRow {
                        feedback_type,
                        submitted_at: now,
                        updated_at: now,
                    },
                );
                Ok(UpsertOutcome::created())
            }
        }
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), FeedbackLedgerError> {
        self.state()?.history.push(entry.clone());
        Ok(())
    }

    async fn count_feedback(&self) -> Result<CounterTable, FeedbackLedgerError> {
        let state = self.state()?;
        let mut table = CounterTable::zeroed();
        for ((_, meal), row) in &state.feedback {
            table.apply(*meal, row.feedback_type, 1);
        }
        Ok(table)
    }

    async fn feedback_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<UserFeedback, FeedbackLedgerError> {
        let state = self.state()?;
        Ok(state
            .feedback
            .iter()
            .filter(|((owner, _), _)| owner == user_id)
            .map(|((_, meal), row)| (*meal, row.feedback_type))
            .collect())
    }

    async fn feedback_table(&self) -> Result<Vec<FeedbackTableEntry>, FeedbackLedgerError> {
        let state = self.state()?;
        let mut entries: Vec<FeedbackTableEntry> = state
            .feedback
            .iter()
            .filter_map(|((user_id, meal), row)| {
                state.users.get(user_id).map(|user| FeedbackTableEntry {
                    name: user.name().to_owned(),
                    college_id: user.college_id().to_owned(),
                    email: user.email().to_owned(),
                    meal: *meal,
                    feedback_type: row.feedback_type,
                    submitted_at: row.submitted_at,
                    updated_at: row.updated_at,
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.college_id.cmp(&b.college_id))
                .then_with(|| a.meal.cmp(&b.meal))
        });
        Ok(entries)
    }

    async fn active_user_count(&self) -> Result<u64, FeedbackLedgerError> {
        let state = self.state()?;
        let mut users: Vec<&UserId> = state.feedback.keys().map(|(user_id, _)| user_id).collect();
        users.sort();
        users.dedup();
        Ok(users.len() as u64)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn upsert_by_account(
        &self,
        details: &LoginDetails,
    ) -> Result<User, UserPersistenceError> {
        let mut state = self.state()?;
        let by_college = state
            .users
            .values()
            .find(|user| user.college_id() == details.college_id())
            .map(|user| *user.id());
        let by_email = state
            .users
            .values()
            .find(|user| user.email() == details.email())
            .map(|user| *user.id());

        match (by_college, by_email) {
            (Some(a), Some(b)) if a == b => {
                let existing = state
                    .users
                    .get_mut(&a)
                    .ok_or_else(|| UserPersistenceError::query("account vanished mid-login"))?;
                if existing.name() != details.name() {
                    *existing = User::new(a, details.clone(), existing.role());
                }
                Ok(existing.clone())
            }
            (None, None) => {
                let user = User::new(UserId::random(), details.clone(), Role::Student);
                state.users.insert(*user.id(), user.clone());
                Ok(user)
            }
            _ => Err(UserPersistenceError::account_conflict(format!(
                "college id {} or email {} is registered to another account",
                details.college_id(),
                details.email()
            ))),
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.state()?.users.get(id).cloned())
    }
}
