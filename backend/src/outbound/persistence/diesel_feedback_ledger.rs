//! PostgreSQL-backed `FeedbackLedger` implementation using Diesel ORM.
//!
//! The upsert runs in one read-committed transaction: the existing row is
//! locked with `SELECT ... FOR UPDATE`; when none exists the insert uses
//! `ON CONFLICT (user_id, meal) DO NOTHING`, and a writer that loses the
//! insert race re-reads the now-committed row and takes the update branch.

use async_trait::async_trait;
use diesel::dsl::{count_distinct, count_star, exists, now};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{FeedbackLedger, FeedbackLedgerError};
use crate::domain::{
    CounterTable, FeedbackTableEntry, FeedbackType, HistoryEntry, Meal, UpsertOutcome,
    UserFeedback, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{FeedbackListingRow, NewFeedbackRow, NewHistoryRow};
use super::pool::{DbPool, PoolError};
use super::schema::{feedback, feedback_history, users};

/// Diesel-backed implementation of the `FeedbackLedger` port.
#[derive(Clone)]
pub struct DieselFeedbackLedger {
    pool: DbPool,
}

impl DieselFeedbackLedger {
    /// Create a new ledger with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> FeedbackLedgerError {
    map_basic_pool_error(error, FeedbackLedgerError::unavailable)
}

fn map_diesel_error(error: diesel::result::Error) -> FeedbackLedgerError {
    map_basic_diesel_error(
        error,
        FeedbackLedgerError::query,
        FeedbackLedgerError::unavailable,
    )
}

/// Failures raised inside the upsert transaction.
#[derive(Debug)]
enum UpsertError {
    UnknownUser,
    CorruptRow(String),
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for UpsertError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn parse_feedback_type(raw: &str) -> Result<FeedbackType, UpsertError> {
    raw.parse()
        .map_err(|_| UpsertError::CorruptRow(format!("stored feedback type {raw:?} is unknown")))
}

/// Lock and return the current rating for `(user_id, meal)`, if any.
async fn lock_existing(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    meal: Meal,
) -> Result<Option<FeedbackType>, UpsertError> {
    let current: Option<String> = feedback::table
        .filter(feedback::user_id.eq(user_id))
        .filter(feedback::meal.eq(meal.as_str()))
        .select(feedback::feedback_type)
        .for_update()
        .first(conn)
        .await
        .optional()?;
    current.as_deref().map(parse_feedback_type).transpose()
}

async fn overwrite(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    meal: Meal,
    feedback_type: FeedbackType,
) -> Result<(), UpsertError> {
    diesel::update(
        feedback::table
            .filter(feedback::user_id.eq(user_id))
            .filter(feedback::meal.eq(meal.as_str())),
    )
    .set((
        feedback::feedback_type.eq(feedback_type.as_str()),
        feedback::updated_at.eq(now),
    ))
    .execute(conn)
    .await?;
    Ok(())
}

async fn upsert_in_transaction(
    conn: &mut AsyncPgConnection,
    timeout_sql: &str,
    user_id: Uuid,
    meal: Meal,
    feedback_type: FeedbackType,
) -> Result<UpsertOutcome, UpsertError> {
    diesel::sql_query(timeout_sql).execute(conn).await?;

    let user_exists: bool = diesel::select(exists(users::table.filter(users::id.eq(user_id))))
        .get_result(conn)
        .await?;
    if !user_exists {
        return Err(UpsertError::UnknownUser);
    }

    if let Some(previous) = lock_existing(conn, user_id, meal).await? {
        overwrite(conn, user_id, meal, feedback_type).await?;
        return Ok(UpsertOutcome::updated(previous));
    }

    let inserted = diesel::insert_into(feedback::table)
        .values(&NewFeedbackRow {
            user_id,
            meal: meal.as_str(),
            feedback_type: feedback_type.as_str(),
        })
        .on_conflict((feedback::user_id, feedback::meal))
        .do_nothing()
        .execute(conn)
        .await?;
    if inserted == 1 {
        return Ok(UpsertOutcome::created());
    }

    debug!(%user_id, %meal, "lost insert race; retrying as update");
    let previous = lock_existing(conn, user_id, meal)
        .await?
        .ok_or_else(|| UpsertError::CorruptRow("conflicting row vanished".to_owned()))?;
    overwrite(conn, user_id, meal, feedback_type).await?;
    Ok(UpsertOutcome::updated(previous))
}

#[async_trait]
impl FeedbackLedger for DieselFeedbackLedger {
    async fn upsert_feedback(
        &self,
        user_id: &UserId,
        meal: Meal,
        feedback_type: FeedbackType,
    ) -> Result<UpsertOutcome, FeedbackLedgerError> {
        let mut pooled = self.pool.get().await.map_err(map_pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        let timeout_sql = self.pool.statement_timeout_sql();
        let uuid = *user_id.as_uuid();

        conn.transaction::<_, UpsertError, _>(|conn| {
            async move { upsert_in_transaction(conn, &timeout_sql, uuid, meal, feedback_type).await }
                .scope_boxed()
        })
        .await
        .map_err(|err| match err {
            UpsertError::UnknownUser => FeedbackLedgerError::unknown_user(*user_id),
            UpsertError::CorruptRow(message) => FeedbackLedgerError::query(message),
            UpsertError::Diesel(error) => map_diesel_error(error),
        })
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), FeedbackLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(feedback_history::table)
            .values(&NewHistoryRow {
                user_id: *entry.user_id.as_uuid(),
                meal: entry.meal.as_str(),
                feedback_type: entry.feedback_type.as_str(),
                action: entry.action.as_str(),
                recorded_at: entry.recorded_at,
            })
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn count_feedback(&self) -> Result<CounterTable, FeedbackLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(String, String, i64)> = feedback::table
            .group_by((feedback::meal, feedback::feedback_type))
            .select((feedback::meal, feedback::feedback_type, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut table = CounterTable::zeroed();
        for (meal, feedback_type, count) in rows {
            let (Ok(meal), Ok(kind)) = (meal.parse::<Meal>(), feedback_type.parse::<FeedbackType>())
            else {
                warn!(%meal, %feedback_type, count, "skipping unrecognised feedback rows");
                continue;
            };
            let count = i32::try_from(count).map_err(|_| {
                FeedbackLedgerError::query(format!("count for {meal}/{kind} overflows"))
            })?;
            table.set(meal, kind, count);
        }
        Ok(table)
    }

    async fn feedback_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<UserFeedback, FeedbackLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(String, String)> = feedback::table
            .filter(feedback::user_id.eq(user_id.as_uuid()))
            .select((feedback::meal, feedback::feedback_type))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|(meal, feedback_type)| {
                match (meal.parse::<Meal>(), feedback_type.parse::<FeedbackType>()) {
                    (Ok(meal), Ok(kind)) => Some((meal, kind)),
                    _ => {
                        warn!(%user_id, %meal, %feedback_type, "skipping unrecognised feedback row");
                        None
                    }
                }
            })
            .collect())
    }

    async fn feedback_table(&self) -> Result<Vec<FeedbackTableEntry>, FeedbackLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<FeedbackListingRow> = feedback::table
            .inner_join(users::table)
            .select((
                users::name,
                users::college_id,
                users::email,
                feedback::meal,
                feedback::feedback_type,
                feedback::submitted_at,
                feedback::updated_at,
            ))
            .order((feedback::updated_at.desc(), feedback::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let (Ok(meal), Ok(feedback_type)) = (
                    row.meal.parse::<Meal>(),
                    row.feedback_type.parse::<FeedbackType>(),
                ) else {
                    warn!(
                        meal = %row.meal,
                        feedback_type = %row.feedback_type,
                        "skipping unrecognised feedback row"
                    );
                    return None;
                };
                Some(FeedbackTableEntry {
                    name: row.name,
                    college_id: row.college_id,
                    email: row.email,
                    meal,
                    feedback_type,
                    submitted_at: row.submitted_at,
                    updated_at: row.updated_at,
                })
            })
            .collect())
    }

    async fn active_user_count(&self) -> Result<u64, FeedbackLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = feedback::table
            .select(count_distinct(feedback::user_id))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        u64::try_from(count).map_err(|_| FeedbackLedgerError::query("negative active user count"))
    }
}
