//! HTTP server configuration object.

use std::net::SocketAddr;

use mess_feedback::inbound::http::session_config::SessionSettings;

/// Settings needed to build and bind the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
}

impl ServerConfig {
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            session,
            bind_addr,
        }
    }
}
