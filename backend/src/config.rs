//! Application settings loaded via OrthoConfig.
//!
//! Values come from `FEEDBACK_*` environment variables, an optional
//! configuration file and command-line flags, in increasing precedence.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::broadcast::DEFAULT_BROADCAST_CAPACITY;
use crate::outbound::counters::CounterCacheOptions;

const DEFAULT_PORT: u16 = 8080;

/// Runtime settings for the feedback server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FEEDBACK")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL URL; when absent the server keeps feedback in memory.
    pub database_url: Option<String>,
    /// Shared counter segment path; when absent counters stay in-process.
    pub counter_segment_path: Option<PathBuf>,
    /// Remove the segment on shutdown if this process created it.
    #[ortho_config(default = false)]
    pub counter_segment_remove_on_shutdown: bool,
    /// Upper bound on pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Per-statement timeout for ledger writes, in milliseconds.
    pub statement_timeout_ms: Option<u64>,
    /// How long a request waits for a pooled connection, in milliseconds.
    pub pool_checkout_timeout_ms: Option<u64>,
    /// Buffered updates per observer before it starts skipping.
    pub broadcast_capacity: Option<usize>,
}

impl AppSettings {
    /// Return the bind address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(SocketAddr::V4(SocketAddrV4::new(
            Ipv4Addr::UNSPECIFIED,
            DEFAULT_PORT,
        )))
    }

    /// Return the broadcast buffer size, defaulting to
    /// [`DEFAULT_BROADCAST_CAPACITY`].
    pub fn broadcast_capacity(&self) -> usize {
        self.broadcast_capacity
            .unwrap_or(DEFAULT_BROADCAST_CAPACITY)
    }

    /// Return the ledger statement timeout, if overridden.
    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_ms.map(Duration::from_millis)
    }

    /// Return the pool checkout timeout, if overridden.
    pub fn pool_checkout_timeout(&self) -> Option<Duration> {
        self.pool_checkout_timeout_ms.map(Duration::from_millis)
    }

    /// Counter cache selection derived from these settings.
    pub fn counter_cache_options(&self) -> CounterCacheOptions {
        CounterCacheOptions {
            segment_path: self.counter_segment_path.clone(),
            remove_on_shutdown: self.counter_segment_remove_on_shutdown,
        }
    }
}
