//! Domain primitives, services and ports.
//!
//! Purpose: define the strongly typed feedback model, the services that keep
//! live counters consistent with the ledger, and the ports adapters plug
//! into. Nothing here knows about HTTP, WebSockets or Diesel.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Meal / FeedbackType: closed vocabularies indexing the counter table.
//! - CounterTable / CounterSnapshot: raw and public views of the counters.
//! - FeedbackService: submission and query use-cases.
//! - rebuild_counters: startup recovery of the counter cache.

pub mod counter_rebuild;
pub mod counters;
pub mod error;
pub mod feedback;
pub mod feedback_service;
pub mod meal;
pub mod ports;
pub mod trace_id;
pub mod user;
pub mod user_login_service;

pub use self::counter_rebuild::rebuild_counters;
pub use self::counters::{COUNTER_SLOTS, CounterSnapshot, CounterTable, MealCounts};
pub use self::error::{Error, ErrorCode};
pub use self::feedback::{
    FeedbackAction, FeedbackResult, FeedbackSubmission, FeedbackTableEntry, FeedbackUpdate,
    HistoryEntry, UpsertOutcome, UserFeedback,
};
pub use self::feedback_service::FeedbackService;
pub use self::meal::{FeedbackType, Meal, MealParseError};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{LoginDetails, Role, User, UserId, UserValidationError};
pub use self::user_login_service::UserLoginService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use mess_feedback::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::unauthorized("login required"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
