//! Inbound adapters translating external requests into domain service calls.
//!
//! [`http`] carries the session-authenticated REST surface and health probes;
//! [`ws`] carries the read-only live counter feed.

pub mod http;
pub mod ws;
