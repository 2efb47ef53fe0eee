//! Diesel ledger and user repository against PostgreSQL.
//!
//! Each test gets a temporary database on an embedded cluster. Set
//! `FEEDBACK_TEST_DATABASE_URL` to run against an existing server instead;
//! rows are keyed by fresh UUIDs so runs against a shared database do not
//! collide. Cluster setup failures fail the suite unless `SKIP_TEST_CLUSTER`
//! is set.

use std::sync::Arc;

use mess_feedback::domain::ports::{FeedbackLedger, FeedbackLedgerError, UserRepository};
use mess_feedback::domain::{FeedbackAction, FeedbackType, LoginDetails, Meal, User, UserId};
use mess_feedback::outbound::persistence::{
    DbPool, DieselFeedbackLedger, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use pg_embedded_setup_unpriv::{TemporaryDatabase, TestCluster};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use uuid::Uuid;

#[path = "support/pg_embed.rs"]
mod pg_embed;

use pg_embed::{handle_cluster_setup_failure, test_cluster};

const DATABASE_URL_ENV: &str = "FEEDBACK_TEST_DATABASE_URL";

struct Database {
    /// Runtime shared by every async call in one test.
    runtime: Runtime,
    ledger: Arc<DieselFeedbackLedger>,
    users: DieselUserRepository,
    _database: Option<TemporaryDatabase>,
    _cluster: Option<TestCluster>,
}

fn setup_database() -> Result<Database, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let (url, cluster, database) = match std::env::var(DATABASE_URL_ENV) {
        Ok(url) => (url, None, None),
        Err(_) => {
            let cluster = test_cluster()?;
            let name = format!("feedback_{}", Uuid::new_v4().simple());
            let database = cluster
                .temporary_database(name.as_str())
                .map_err(|err| format!("create database: {err:?}"))?;
            (database.url().to_owned(), Some(cluster), Some(database))
        }
    };

    runtime
        .block_on(run_pending_migrations(&url))
        .map_err(|err| err.to_string())?;
    let pool = runtime
        .block_on(DbPool::new(PoolConfig::new(url).with_max_size(8)))
        .map_err(|err| err.to_string())?;

    Ok(Database {
        runtime,
        ledger: Arc::new(DieselFeedbackLedger::new(pool.clone())),
        users: DieselUserRepository::new(pool),
        _database: database,
        _cluster: cluster,
    })
}

#[fixture]
fn database() -> Option<Database> {
    match setup_database() {
        Ok(db) => Some(db),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

impl Database {
    fn fresh_user(&self) -> User {
        let tag = Uuid::new_v4().simple().to_string();
        let details = LoginDetails::try_from_parts(
            "Diesel Student",
            format!("T{tag}"),
            format!("{tag}@example.edu"),
        )
        .expect("valid details");
        self.runtime
            .block_on(self.users.upsert_by_account(&details))
            .expect("user upserts")
    }
}

#[rstest]
fn upsert_reports_created_then_previous_rating(database: Option<Database>) {
    let Some(db) = database else { return };
    let user = db.fresh_user();

    let (first, second, mine) = db.runtime.block_on(async {
        let first = db
            .ledger
            .upsert_feedback(user.id(), Meal::Lunch, FeedbackType::Good)
            .await
            .expect("first upsert");
        let second = db
            .ledger
            .upsert_feedback(user.id(), Meal::Lunch, FeedbackType::Poor)
            .await
            .expect("second upsert");
        let mine = db.ledger.feedback_for_user(user.id()).await.expect("mine");
        (first, second, mine)
    });

    assert_eq!(first.action, FeedbackAction::Created);
    assert!(first.previous.is_none());
    assert_eq!(second.action, FeedbackAction::Updated);
    assert_eq!(second.previous, Some(FeedbackType::Good));
    assert_eq!(mine.get(&Meal::Lunch), Some(&FeedbackType::Poor));
}

#[rstest]
fn unknown_users_are_rejected(database: Option<Database>) {
    let Some(db) = database else { return };

    let err = db
        .runtime
        .block_on(
            db.ledger
                .upsert_feedback(&UserId::random(), Meal::Dinner, FeedbackType::Good),
        )
        .expect_err("unknown user");

    assert!(matches!(err, FeedbackLedgerError::UnknownUser { .. }));
}

#[rstest]
fn concurrent_distinct_users_raise_the_count_by_each(database: Option<Database>) {
    let Some(db) = database else { return };
    let users: Vec<User> = (0..8).map(|_| db.fresh_user()).collect();

    let (before, after) = db.runtime.block_on(async {
        let before = db.ledger.count_feedback().await.expect("count before");
        let tasks: Vec<_> = users
            .into_iter()
            .map(|user| {
                let ledger = Arc::clone(&db.ledger);
                tokio::spawn(async move {
                    ledger
                        .upsert_feedback(user.id(), Meal::Snacks, FeedbackType::Average)
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.expect("task joins").expect("upsert succeeds");
        }
        let after = db.ledger.count_feedback().await.expect("count after");
        (before, after)
    });

    assert_eq!(
        after.get(Meal::Snacks, FeedbackType::Average)
            - before.get(Meal::Snacks, FeedbackType::Average),
        8
    );
}

#[rstest]
fn racing_upserts_on_one_key_create_exactly_one_row(database: Option<Database>) {
    const WRITERS: usize = 8;
    let Some(db) = database else { return };
    let user = db.fresh_user();
    let ratings = [FeedbackType::Good, FeedbackType::Average, FeedbackType::Poor];

    let (outcomes, rows) = db.runtime.block_on(async {
        let tasks: Vec<_> = (0..WRITERS)
            .map(|n| {
                let ledger = Arc::clone(&db.ledger);
                let user_id = *user.id();
                let rating = ratings[n % ratings.len()];
                tokio::spawn(async move {
                    ledger
                        .upsert_feedback(&user_id, Meal::Lunch, rating)
                        .await
                })
            })
            .collect();
        let mut outcomes = Vec::with_capacity(WRITERS);
        for task in tasks {
            outcomes.push(task.await.expect("task joins").expect("upsert succeeds"));
        }
        let rows: Vec<_> = db
            .ledger
            .feedback_table()
            .await
            .expect("feedback table")
            .into_iter()
            .filter(|entry| entry.college_id == user.college_id())
            .collect();
        (outcomes, rows)
    });

    let created = outcomes
        .iter()
        .filter(|outcome| outcome.action == FeedbackAction::Created)
        .count();
    assert_eq!(created, 1);
    assert!(
        outcomes
            .iter()
            .filter(|outcome| outcome.action == FeedbackAction::Updated)
            .all(|outcome| outcome.previous.is_some())
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].meal, Meal::Lunch);
    assert!(ratings.contains(&rows[0].feedback_type));
    let mine = db
        .runtime
        .block_on(db.ledger.feedback_for_user(user.id()))
        .expect("mine");
    assert_eq!(mine.get(&Meal::Lunch), Some(&rows[0].feedback_type));
}

#[rstest]
fn returning_accounts_keep_their_id(database: Option<Database>) {
    let Some(db) = database else { return };
    let user = db.fresh_user();
    let renamed = LoginDetails::try_from_parts("Renamed", user.college_id(), user.email())
        .expect("valid details");

    let (again, found) = db.runtime.block_on(async {
        let again = db.users.upsert_by_account(&renamed).await.expect("relogin");
        let found = db
            .users
            .find_by_id(user.id())
            .await
            .expect("lookup")
            .expect("user exists");
        (again, found)
    });

    assert_eq!(again.id(), user.id());
    assert_eq!(again.name(), "Renamed");
    assert_eq!(found.name(), "Renamed");
}
