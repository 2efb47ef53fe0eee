//! Adapter selection and service wiring.
//!
//! A configured database URL selects the Diesel adapters; otherwise both the
//! ledger and the user store live in memory. Counter cache backing is chosen
//! independently from the segment settings.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use mockable::{Clock, DefaultClock};
use tracing::warn;

use mess_feedback::config::AppSettings;
use mess_feedback::domain::ports::{CounterCache, FeedbackLedger, UserRepository};
use mess_feedback::domain::{
    CounterSnapshot, FeedbackService, UserLoginService, rebuild_counters,
};
use mess_feedback::inbound::http::state::HttpState;
use mess_feedback::inbound::ws::state::WsState;
use mess_feedback::outbound::broadcast::BroadcastHub;
use mess_feedback::outbound::counters::select_counter_cache;
use mess_feedback::outbound::memory::InMemoryStore;
use mess_feedback::outbound::persistence::{
    DbPool, DieselFeedbackLedger, DieselUserRepository, PoolConfig, run_pending_migrations,
};

/// Outbound adapters chosen at startup.
pub struct Adapters {
    pub ledger: Arc<dyn FeedbackLedger>,
    pub users: Arc<dyn UserRepository>,
    pub cache: Arc<dyn CounterCache>,
    pub hub: Arc<BroadcastHub>,
}

fn pool_config(settings: &AppSettings, url: &str) -> PoolConfig {
    let mut config = PoolConfig::new(url);
    if let Some(max_size) = settings.pool_max_size {
        config = config.with_max_size(max_size);
    }
    if let Some(timeout) = settings.pool_checkout_timeout() {
        config = config.with_connection_timeout(timeout);
    }
    if let Some(timeout) = settings.statement_timeout() {
        config = config.with_statement_timeout(timeout);
    }
    config
}

async fn connect_database(settings: &AppSettings, url: &str) -> Result<DbPool> {
    run_pending_migrations(url)
        .await
        .wrap_err("failed to apply database migrations")?;
    DbPool::new(pool_config(settings, url))
        .await
        .wrap_err("failed to build database pool")
}

/// Build every outbound adapter from settings.
///
/// # Errors
/// Fails when a database URL is configured but migrations or the pool
/// cannot be set up.
pub async fn build_adapters(settings: &AppSettings) -> Result<Adapters> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let ledger: Arc<dyn FeedbackLedger>;
    let users: Arc<dyn UserRepository>;
    if let Some(url) = settings.database_url.as_deref() {
        let pool = connect_database(settings, url).await?;
        ledger = Arc::new(DieselFeedbackLedger::new(pool.clone()));
        users = Arc::new(DieselUserRepository::new(pool));
    } else {
        warn!("FEEDBACK_DATABASE_URL not set; feedback is kept in memory only");
        let store = Arc::new(InMemoryStore::new(clock));
        ledger = store.clone();
        users = store;
    }

    Ok(Adapters {
        ledger,
        users,
        cache: select_counter_cache(&settings.counter_cache_options()),
        hub: Arc::new(BroadcastHub::new(settings.broadcast_capacity())),
    })
}

/// Reload the counter cache from the ledger before any traffic is served.
///
/// # Errors
/// Fails when the ledger cannot be counted or the cache rejects the table;
/// the server must not start on unverified counters.
pub async fn restore_counters(adapters: &Adapters) -> Result<CounterSnapshot> {
    rebuild_counters(adapters.ledger.as_ref(), adapters.cache.as_ref())
        .await
        .wrap_err("failed to rebuild counters from the feedback ledger")
}

/// Wire domain services over the adapters and expose them to the inbound
/// layers.
pub fn build_states(adapters: &Adapters) -> (HttpState, WsState) {
    let service = Arc::new(FeedbackService::new(
        Arc::clone(&adapters.ledger),
        Arc::clone(&adapters.cache),
        adapters.hub.clone(),
        Arc::new(DefaultClock),
    ));
    let login = Arc::new(UserLoginService::new(Arc::clone(&adapters.users)));
    let http_state = HttpState::new(login, service.clone(), service.clone());
    let ws_state = WsState::new(service, adapters.hub.clone());
    (http_state, ws_state)
}
