//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint in the inbound layer together
//! with the domain payloads they exchange and the session cookie security
//! scheme. Swagger UI serves the document in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    CounterSnapshot, Error, ErrorCode, FeedbackAction, FeedbackTableEntry, FeedbackType,
    FeedbackUpdate, Meal, MealCounts, Role, User,
};
use crate::inbound::http::feedback::{ActiveUsersResponse, FeedbackRequest, FeedbackResponse};
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;
use crate::inbound::http::users::LoginRequest;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE_NAME,
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Mess feedback API",
        description = "Meal ratings, live counters and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::feedback::submit_feedback,
        crate::inbound::http::feedback::counters,
        crate::inbound::http::feedback::my_feedback,
        crate::inbound::http::feedback::feedback_table,
        crate::inbound::http::feedback::active_users,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        Role,
        LoginRequest,
        FeedbackRequest,
        FeedbackResponse,
        ActiveUsersResponse,
        CounterSnapshot,
        MealCounts,
        Meal,
        FeedbackType,
        FeedbackAction,
        FeedbackTableEntry,
        FeedbackUpdate,
    )),
    tags(
        (name = "users", description = "Login and logout"),
        (name = "feedback", description = "Meal ratings and live counters"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
