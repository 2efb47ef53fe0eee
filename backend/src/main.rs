//! Backend entry-point: loads configuration, wires adapters, rebuilds the
//! counter cache and serves REST, WebSocket and health endpoints.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use mess_feedback::config::AppSettings;
use mess_feedback::inbound::http::health::HealthState;
use mess_feedback::inbound::http::session_config::{BuildMode, session_settings_from_env};

use server::{ServerConfig, build_adapters, build_states, create_server, restore_counters};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        eprintln!("tracing init failed: {e}");
    }

    let settings = AppSettings::load().wrap_err("failed to load configuration")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;

    let adapters = build_adapters(&settings).await?;
    if let Err(err) = restore_counters(&adapters).await {
        if let Err(shutdown_err) = adapters.cache.shutdown() {
            error!(error = %shutdown_err, "counter cache shutdown failed");
        }
        return Err(err);
    }

    let (http_state, ws_state) = build_states(&adapters);
    let health_state = web::Data::new(HealthState::new());
    let bind_addr = settings.bind_addr();
    let server = create_server(
        health_state.clone(),
        http_state,
        ws_state,
        ServerConfig::new(session, bind_addr),
    )
    .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;

    health_state.mark_ready();
    info!(%bind_addr, backing = %adapters.cache.backing(), "serving");
    let outcome = server.await;

    health_state.mark_unhealthy();
    if let Err(err) = adapters.cache.shutdown() {
        error!(error = %err, "counter cache shutdown failed");
    }
    outcome.wrap_err("server terminated abnormally")
}
