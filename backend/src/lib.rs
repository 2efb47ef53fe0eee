//! Mess feedback backend library.
//!
//! Domain services and ports live in [`domain`]; HTTP and WebSocket adapters
//! in [`inbound`]; Diesel, counter cache and broadcast adapters in
//! [`outbound`].

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
