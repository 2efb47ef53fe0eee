//! Per-connection observer loop.
//!
//! Keeps WebSocket framing and heartbeats at the edge. Each connection owns
//! one broadcast receiver; a slow connection lags and skips updates instead
//! of holding up submissions. The public contract pings every 5s and drops
//! a connection after 10s without client traffic. Tests shorten both.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time;
use tracing::{debug, warn};

use crate::domain::FeedbackUpdate;
use crate::domain::ports::FeedbackQuery;
use crate::inbound::ws::messages::ObserverMessage;

/// Time between heartbeats to the client.
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(50);

/// Max idle time before disconnecting the client.
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(300);

enum SessionError {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    FeedClosed,
    Network(Closed),
}

pub(super) struct ObserverSession<'a> {
    query: &'a dyn FeedbackQuery,
    updates: broadcast::Receiver<FeedbackUpdate>,
}

impl<'a> ObserverSession<'a> {
    /// `updates` must be subscribed before the initial snapshot is read so no
    /// submission falls between the two.
    pub(super) fn new(
        query: &'a dyn FeedbackQuery,
        updates: broadcast::Receiver<FeedbackUpdate>,
    ) -> Self {
        Self { query, updates }
    }

    pub(super) async fn run(mut self, mut session: Session, mut stream: MessageStream) {
        if let Err(error) = self.greet(&mut session).await {
            self.shut_down(session, error).await;
            return;
        }

        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::handle_heartbeat_tick(&mut session, last_heartbeat).await
                }
                message = stream.recv() => {
                    Self::handle_stream_message(&mut session, &mut last_heartbeat, message).await
                }
                update = self.updates.recv() => {
                    Self::handle_update(&mut session, update).await
                }
            };

            if let Err(error) = result {
                self.shut_down(session, error).await;
                return;
            }
        }
    }

    async fn greet(&self, session: &mut Session) -> Result<(), SessionError> {
        send_json(session, &ObserverMessage::connected()).await?;
        match self.query.counters().await {
            Ok(snapshot) => {
                send_json(session, &ObserverMessage::CountersSnapshot(snapshot)).await
            }
            Err(error) => {
                warn!(%error, "initial counter snapshot unavailable");
                Ok(())
            }
        }
    }

    async fn handle_heartbeat_tick(
        session: &mut Session,
        last_heartbeat: Instant,
    ) -> Result<(), SessionError> {
        if last_heartbeat.elapsed() > CLIENT_TIMEOUT {
            return Err(SessionError::HeartbeatTimeout);
        }
        session.ping(b"").await.map_err(SessionError::Network)
    }

    async fn handle_stream_message(
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionError> {
        let message = match message {
            Some(Ok(message)) => message,
            Some(Err(error)) => return Err(SessionError::Protocol(error)),
            None => return Err(SessionError::StreamClosed),
        };

        *last_heartbeat = Instant::now();
        match message {
            Message::Ping(payload) => session.pong(&payload).await.map_err(SessionError::Network),
            Message::Close(reason) => Err(SessionError::ClientClosed(reason)),
            // Observers only listen; anything else just counts as liveness.
            Message::Text(_)
            | Message::Binary(_)
            | Message::Pong(_)
            | Message::Continuation(_)
            | Message::Nop => Ok(()),
        }
    }

    async fn handle_update(
        session: &mut Session,
        update: Result<FeedbackUpdate, RecvError>,
    ) -> Result<(), SessionError> {
        match update {
            Ok(update) => send_json(session, &ObserverMessage::FeedbackUpdate(update)).await,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "observer lagged behind feedback updates");
                Ok(())
            }
            Err(RecvError::Closed) => Err(SessionError::FeedClosed),
        }
    }

    async fn shut_down(&self, session: Session, error: SessionError) {
        let reason = match error {
            SessionError::HeartbeatTimeout => {
                warn!("observer heartbeat timeout; closing connection");
                Some(CloseReason {
                    code: CloseCode::Normal,
                    description: Some("heartbeat timeout".to_owned()),
                })
            }
            SessionError::Protocol(error) => {
                warn!(%error, "observer protocol error");
                Some(CloseReason {
                    code: CloseCode::Protocol,
                    description: Some("protocol error".to_owned()),
                })
            }
            SessionError::FeedClosed => Some(CloseReason {
                code: CloseCode::Away,
                description: Some("server shutting down".to_owned()),
            }),
            SessionError::ClientClosed(reason) => reason,
            SessionError::Network(error) => {
                debug!(%error, "observer send failed; dropping connection");
                return;
            }
            SessionError::StreamClosed => return,
        };

        if let Err(error) = session.close(reason).await {
            debug!(%error, "failed to close observer session");
        }
    }
}

async fn send_json(session: &mut Session, payload: &ObserverMessage) -> Result<(), SessionError> {
    match serde_json::to_string(payload) {
        Ok(body) => session.text(body).await.map_err(SessionError::Network),
        Err(error) => {
            warn!(%error, "failed to serialise observer frame");
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
