//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod feedback;
pub mod health;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api/v1` handler on `cfg`.
///
/// Callers wrap the enclosing scope with the session middleware and provide
/// [`state::HttpState`] as app data.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use mess_feedback::inbound::http::configure_api;
///
/// let _app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .service(users::login)
        .service(users::logout)
        .service(feedback::submit_feedback)
        .service(feedback::counters)
        .service(feedback::my_feedback)
        .service(feedback::feedback_table)
        .service(feedback::active_users);
}
