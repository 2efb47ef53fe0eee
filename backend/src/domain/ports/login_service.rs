//! Driving port for login use-cases.
//!
//! Inbound adapters call this port to resolve an account without knowing the
//! backing store, so handler tests can substitute a double.

use async_trait::async_trait;

use crate::domain::{Error, LoginDetails, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Resolve (or create) the account named by `details`.
    async fn login(&self, details: &LoginDetails) -> Result<User, Error>;
}
