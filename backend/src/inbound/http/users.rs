//! Login and logout handlers.
//!
//! ```text
//! POST /api/v1/login {"name":"Ada","collegeId":"CS001","email":"ada@example.edu"}
//! POST /api/v1/logout
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::domain::{Error, LoginDetails, User, UserValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "CS2024001")]
    pub college_id: String,
    #[schema(example = "ada@example.edu")]
    pub email: String,
}

impl TryFrom<LoginRequest> for LoginDetails {
    type Error = UserValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(value.name, value.college_id, value.email)
    }
}

fn map_login_validation_error(err: UserValidationError) -> Error {
    let field = err.field();
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": field, "code": "empty_field" }))
}

/// Resolve the account and establish a session.
///
/// The first login for a college id and email creates a student account;
/// later logins refresh the stored name.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = User,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "User store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<User>> {
    let details =
        LoginDetails::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let user = state.login.login(&details).await?;
    session.persist_user(&user)?;
    Ok(web::Json(user))
}

/// Clear the session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    if let Ok(Some(user)) = session.user() {
        debug!(user_id = %user.id, "user logged out");
    }
    session.clear();
    HttpResponse::NoContent().finish()
}
