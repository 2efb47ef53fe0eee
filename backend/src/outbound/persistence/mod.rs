//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the ledger and user ports backed by
//! PostgreSQL via `diesel-async` with `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and
//!   domain types; the consistency rules they enforce are the ones the
//!   schema cannot express (row locks, insert-race retries).
//! - **Internal models**: `models.rs` and `schema.rs` never leak into the
//!   domain.
//! - **Strongly typed errors**: Diesel and pool failures map onto port
//!   error variants; timeouts become retryable `Unavailable` errors.
//!
//! # Example
//!
//! ```no_run
//! use mess_feedback::outbound::persistence::{
//!     DbPool, DieselFeedbackLedger, PoolConfig, run_pending_migrations,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let url = "postgres://localhost/feedback";
//! run_pending_migrations(url).await?;
//! let pool = DbPool::new(PoolConfig::new(url)).await?;
//! let ledger = DieselFeedbackLedger::new(pool);
//! # let _ = ledger;
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_feedback_ledger;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_feedback_ledger::DieselFeedbackLedger;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
