//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{LoginDetails, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The college id or email already belongs to a different account.
        AccountConflict { message: String } => "account conflict: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find the account keyed by `(college_id, email)`, creating it as a
    /// student when absent and refreshing the name when it changed.
    async fn upsert_by_account(&self, details: &LoginDetails)
    -> Result<User, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;
}
