//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod counter_cache;
mod feedback_broadcaster;
mod feedback_command;
mod feedback_ledger;
mod feedback_query;
mod login_service;
mod user_repository;

#[cfg(test)]
pub use counter_cache::MockCounterCache;
pub use counter_cache::{CounterBacking, CounterCache, CounterCacheError};
#[cfg(test)]
pub use feedback_broadcaster::MockFeedbackBroadcaster;
pub use feedback_broadcaster::{FeedbackBroadcastError, FeedbackBroadcaster};
#[cfg(test)]
pub use feedback_command::MockFeedbackCommand;
pub use feedback_command::FeedbackCommand;
#[cfg(test)]
pub use feedback_ledger::MockFeedbackLedger;
pub use feedback_ledger::{FeedbackLedger, FeedbackLedgerError};
#[cfg(test)]
pub use feedback_query::MockFeedbackQuery;
pub use feedback_query::FeedbackQuery;
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
