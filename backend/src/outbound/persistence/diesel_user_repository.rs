//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Accounts are matched by college id or email under a row lock. Exactly one
//! matching row holding both keys is a returning user; no row is a new user;
//! anything else means the two keys belong to different accounts.

use async_trait::async_trait;
use diesel::dsl::now;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{LoginDetails, Role, User, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

/// Convert a database row into a domain user.
fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let role = row.role.parse::<Role>().unwrap_or_else(|_| {
        warn!(user_id = %row.id, role = %row.role, "unrecognised role, treating as student");
        Role::Student
    });
    let details = LoginDetails::try_from_parts(row.name, row.college_id, row.email)
        .map_err(|err| UserPersistenceError::query(format!("stored user {} invalid: {err}", row.id)))?;
    Ok(User::new(UserId::from_uuid(row.id), details, role))
}

#[derive(Debug)]
enum AccountError {
    Conflict,
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for AccountError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

async fn lock_matching(
    conn: &mut AsyncPgConnection,
    details: &LoginDetails,
) -> Result<Vec<UserRow>, AccountError> {
    let rows = users::table
        .filter(
            users::college_id
                .eq(details.college_id())
                .or(users::email.eq(details.email())),
        )
        .select(UserRow::as_select())
        .for_update()
        .load(conn)
        .await?;
    Ok(rows)
}

async fn refresh_name(
    conn: &mut AsyncPgConnection,
    mut row: UserRow,
    name: &str,
) -> Result<UserRow, AccountError> {
    if row.name == name {
        return Ok(row);
    }
    diesel::update(users::table.filter(users::id.eq(row.id)))
        .set((users::name.eq(name), users::updated_at.eq(now)))
        .execute(conn)
        .await?;
    name.clone_into(&mut row.name);
    Ok(row)
}

async fn upsert_in_transaction(
    conn: &mut AsyncPgConnection,
    details: &LoginDetails,
) -> Result<UserRow, AccountError> {
    // Two passes: the second runs only after losing a concurrent first-login race.
    for _ in 0..2 {
        let mut rows = lock_matching(conn, details).await?;
        match rows.len() {
            0 => {
                let inserted = diesel::insert_into(users::table)
                    .values(&NewUserRow {
                        id: Uuid::new_v4(),
                        college_id: details.college_id(),
                        email: details.email(),
                        name: details.name(),
                        role: Role::Student.as_str(),
                    })
                    .on_conflict_do_nothing()
                    .returning(UserRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                if let Some(row) = inserted {
                    return Ok(row);
                }
                debug!(college_id = details.college_id(), "lost first-login race; retrying");
            }
            1 => {
                let row = rows.remove(0);
                if row.college_id != details.college_id() || row.email != details.email() {
                    return Err(AccountError::Conflict);
                }
                return refresh_name(conn, row, details.name()).await;
            }
            _ => return Err(AccountError::Conflict),
        }
    }
    Err(AccountError::Conflict)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn upsert_by_account(
        &self,
        details: &LoginDetails,
    ) -> Result<User, UserPersistenceError> {
        let mut pooled = self.pool.get().await.map_err(map_pool_error)?;
        let conn: &mut AsyncPgConnection = &mut pooled;
        let row = conn
            .transaction::<_, AccountError, _>(|conn| {
                async move { upsert_in_transaction(conn, details).await }.scope_boxed()
            })
            .await
            .map_err(|err| match err {
                AccountError::Conflict => UserPersistenceError::account_conflict(format!(
                    "college id {} or email {} is registered to another account",
                    details.college_id(),
                    details.email()
                )),
                AccountError::Diesel(error) => map_diesel_error(error),
            })?;
        row_to_user(row)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for row conversion and error mapping.
    use super::*;
    use rstest::rstest;

    fn row(role: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            college_id: "CS1".to_owned(),
            email: "ada@example.edu".to_owned(),
            name: "Ada".to_owned(),
            role: role.to_owned(),
        }
    }

    #[rstest]
    #[case("admin", Role::Admin)]
    #[case("student", Role::Student)]
    #[case("janitor", Role::Student)]
    fn rows_convert_roles(#[case] stored: &str, #[case] expected: Role) {
        let user = row_to_user(row(stored)).expect("valid row");
        assert_eq!(user.role(), expected);
        assert_eq!(user.college_id(), "CS1");
    }

    #[rstest]
    fn blank_names_are_query_errors() {
        let mut blank = row("student");
        blank.name = "  ".to_owned();
        let err = row_to_user(blank).expect_err("invalid row");
        assert!(matches!(err, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(err, UserPersistenceError::Connection { .. }));
        assert!(err.to_string().contains("connection refused"));
    }
}
