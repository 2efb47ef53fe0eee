//! Feedback submission and counter read handlers.
//!
//! ```text
//! POST /api/v1/feedback {"meal":"lunch","feedbackType":"good"}
//! GET  /api/v1/counters
//! GET  /api/v1/feedback/mine
//! GET  /api/v1/feedback
//! GET  /api/v1/active-users
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    CounterSnapshot, Error, FeedbackAction, FeedbackSubmission, FeedbackTableEntry, UserFeedback,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/feedback`.
///
/// Fields are optional at the wire level so a missing value is reported with
/// the same `details.field` shape as an unknown one.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[schema(example = "lunch")]
    pub meal: Option<String>,
    #[serde(alias = "feedback_type")]
    #[schema(example = "good")]
    pub feedback_type: Option<String>,
}

/// Response body for a successful submission.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub success: bool,
    pub action: FeedbackAction,
    #[schema(example = "Feedback submitted successfully")]
    pub message: String,
}

/// Response body for `GET /api/v1/active-users`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUsersResponse {
    pub active_users: u64,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, Error> {
    value.ok_or_else(|| {
        Error::invalid_request(format!("{field} is required"))
            .with_details(json!({ "field": field, "code": "missing_field" }))
    })
}

/// Record or replace the caller's rating for one meal.
#[utoipa::path(
    post,
    path = "/api/v1/feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback recorded", body = FeedbackResponse),
        (status = 400, description = "Unknown or missing meal or rating", body = Error),
        (status = 401, description = "Login required", body = Error),
        (status = 503, description = "Feedback store unavailable", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["feedback"],
    operation_id = "submitFeedback"
)]
#[post("/feedback")]
pub async fn submit_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<FeedbackRequest>,
) -> ApiResult<web::Json<FeedbackResponse>> {
    let user = session.require_user()?;
    let FeedbackRequest {
        meal,
        feedback_type,
    } = payload.into_inner();
    let submission = FeedbackSubmission {
        user_id: user.id,
        user_name: user.name,
        meal: required(meal, "meal")?,
        feedback_type: required(feedback_type, "feedbackType")?,
    };

    let result = state.feedback.submit(submission).await?;
    Ok(web::Json(FeedbackResponse {
        success: true,
        action: result.action,
        message: result.action.message().to_owned(),
    }))
}

/// Live counters for every meal and rating. No login required.
#[utoipa::path(
    get,
    path = "/api/v1/counters",
    responses(
        (status = 200, description = "Current counters", body = CounterSnapshot),
        (status = 503, description = "Counters unavailable", body = Error)
    ),
    tags = ["feedback"],
    operation_id = "getCounters",
    security([])
)]
#[get("/counters")]
pub async fn counters(state: web::Data<HttpState>) -> ApiResult<web::Json<CounterSnapshot>> {
    state.feedback_query.counters().await.map(web::Json)
}

/// The caller's current rating per meal.
#[utoipa::path(
    get,
    path = "/api/v1/feedback/mine",
    responses(
        (status = 200, description = "Ratings keyed by meal",
            body = std::collections::BTreeMap<String, crate::domain::FeedbackType>),
        (status = 401, description = "Login required", body = Error)
    ),
    tags = ["feedback"],
    operation_id = "getMyFeedback"
)]
#[get("/feedback/mine")]
pub async fn my_feedback(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserFeedback>> {
    let user_id = session.require_user_id()?;
    state
        .feedback_query
        .feedback_for_user(&user_id)
        .await
        .map(web::Json)
}

/// Every feedback record, most recently updated first.
#[utoipa::path(
    get,
    path = "/api/v1/feedback",
    responses(
        (status = 200, description = "Feedback records", body = [FeedbackTableEntry]),
        (status = 401, description = "Login required", body = Error)
    ),
    tags = ["feedback"],
    operation_id = "listFeedback"
)]
#[get("/feedback")]
pub async fn feedback_table(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<FeedbackTableEntry>>> {
    session.require_user_id()?;
    state.feedback_query.feedback_table().await.map(web::Json)
}

/// Number of distinct users with at least one rating.
#[utoipa::path(
    get,
    path = "/api/v1/active-users",
    responses(
        (status = 200, description = "Active user count", body = ActiveUsersResponse),
        (status = 503, description = "Feedback store unavailable", body = Error)
    ),
    tags = ["feedback"],
    operation_id = "getActiveUsers",
    security([])
)]
#[get("/active-users")]
pub async fn active_users(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<ActiveUsersResponse>> {
    let active_users = state.feedback_query.active_user_count().await?;
    Ok(web::Json(ActiveUsersResponse { active_users }))
}

#[cfg(test)]
#[path = "feedback_tests.rs"]
mod tests;
