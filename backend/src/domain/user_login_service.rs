//! Login domain service backed by the user repository.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{LoginService, UserPersistenceError, UserRepository};
use crate::domain::{Error, LoginDetails, User};

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user store unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user store error: {message}"))
        }
        UserPersistenceError::AccountConflict { message } => {
            Error::invalid_request("college id and email belong to different accounts")
                .with_details(json!({ "field": "collegeId", "reason": message }))
        }
    }
}

/// Resolves logins by upserting the account keyed by college id and email.
pub struct UserLoginService<R: ?Sized> {
    users: Arc<R>,
}

impl<R: ?Sized> UserLoginService<R> {
    pub fn new(users: Arc<R>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<R> LoginService for UserLoginService<R>
where
    R: UserRepository + ?Sized,
{
    async fn login(&self, details: &LoginDetails) -> Result<User, Error> {
        let user = self
            .users
            .upsert_by_account(details)
            .await
            .map_err(map_user_error)?;
        info!(user_id = %user.id(), role = user.role().as_str(), "user logged in");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockUserRepository;
    use crate::domain::{ErrorCode, Role, UserId};
    use rstest::rstest;

    fn details() -> LoginDetails {
        LoginDetails::try_from_parts("Ada", "CS1", "ada@example.edu").expect("valid details")
    }

    #[tokio::test]
    async fn returns_repository_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_upsert_by_account()
            .times(1)
            .returning(|details| Ok(User::new(UserId::random(), details.clone(), Role::Student)));
        let service = UserLoginService::new(Arc::new(repo));

        let user = service.login(&details()).await.expect("login");
        assert_eq!(user.name(), "Ada");
        assert_eq!(user.role(), Role::Student);
    }

    #[rstest]
    #[case(UserPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(UserPersistenceError::query("syntax"), ErrorCode::InternalError)]
    #[case(
        UserPersistenceError::account_conflict("email registered to CS2"),
        ErrorCode::InvalidRequest
    )]
    #[tokio::test]
    async fn maps_repository_failures(
        #[case] failure: UserPersistenceError,
        #[case] expected: ErrorCode,
    ) {
        let mut repo = MockUserRepository::new();
        repo.expect_upsert_by_account()
            .return_once(move |_| Err(failure));
        let service = UserLoginService::new(Arc::new(repo));

        let err = service.login(&details()).await.expect_err("failure");
        assert_eq!(err.code(), expected);
    }
}
