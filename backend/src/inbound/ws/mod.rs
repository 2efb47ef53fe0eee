//! WebSocket observer channel for live counters.
//!
//! `GET /ws` upgrades the connection, sends a `connected` greeting and a
//! `countersSnapshot`, then forwards one `feedbackUpdate` per successful
//! submission until either side goes away.

use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::{error, info};

mod session;

pub mod messages;
pub mod state;

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<state::WsState>,
    req: HttpRequest,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(%error, "WebSocket upgrade failed");
        error
    })?;

    let updates = state.broadcaster.subscribe();
    let observers = state.broadcaster.observer_count();
    info!(observers, "observer connected");

    let state = state.into_inner();
    actix_web::rt::spawn(async move {
        session::ObserverSession::new(state.query.as_ref(), updates)
            .run(session, messages)
            .await;
    });
    Ok(response)
}
