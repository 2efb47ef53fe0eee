//! HTTP submissions reaching WebSocket observers over real sockets.

use std::sync::Arc;

use actix_web::cookie::{Key, SameSite};
use actix_web::dev::ServerHandle;
use actix_web::{App, HttpServer, web};
use awc::ws::Frame;
use futures_util::StreamExt;
use mess_feedback::Trace;
use mess_feedback::domain::ports::FeedbackBroadcaster;
use mess_feedback::inbound::http::configure_api;
use mess_feedback::inbound::http::session_config::{SESSION_COOKIE_NAME, SessionSettings};
use mess_feedback::inbound::http::state::HttpState;
use mess_feedback::inbound::ws;
use mess_feedback::inbound::ws::state::WsState;
use serde_json::{Value, json};

mod support;

use support::Stack;

type Socket = actix_codec::Framed<awc::BoxedSocket, awc::ws::Codec>;

struct Running {
    base: String,
    _server: ServerHandle,
}

fn start(stack: &Stack) -> Running {
    let service = Arc::new(stack.service.clone());
    let login = Arc::clone(&stack.login);
    let http_state = web::Data::new(HttpState::new(login, service.clone(), service.clone()));
    let ws_state = web::Data::new(WsState::new(service, stack.hub.clone()));
    let session = SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
    };

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let server = HttpServer::new(move || {
        App::new()
            .app_data(http_state.clone())
            .app_data(ws_state.clone())
            .wrap(Trace)
            .service(
                web::scope("/api/v1")
                    .wrap(session.middleware())
                    .configure(configure_api),
            )
            .service(ws::ws_entry)
    })
    .listen(listener)
    .expect("listen")
    .disable_signals()
    .workers(1)
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    Running {
        base: format!("http://{addr}"),
        _server: handle,
    }
}

async fn next_event(socket: &mut Socket) -> Value {
    loop {
        match socket.next().await.expect("frame").expect("valid frame") {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json frame"),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

#[actix_rt::test]
async fn submission_reaches_connected_observer() {
    let stack = Stack::in_process();
    let running = start(&stack);
    let client = awc::Client::default();

    let (_resp, mut socket) = client
        .ws(format!("{}/ws", running.base))
        .connect()
        .await
        .expect("websocket connect");
    assert_eq!(next_event(&mut socket).await["event"], "connected");
    let snapshot = next_event(&mut socket).await;
    assert_eq!(snapshot["event"], "countersSnapshot");
    assert_eq!(snapshot["data"]["lunch"]["good"], 0);

    let login = client
        .post(format!("{}/api/v1/login", running.base))
        .send_json(&json!({
            "name": "Ada Lovelace",
            "collegeId": "CS0001",
            "email": "ada@example.edu"
        }))
        .await
        .expect("login request");
    assert!(login.status().is_success());
    let cookie = login.cookie(SESSION_COOKIE_NAME).expect("session cookie");

    let mut submit = client
        .post(format!("{}/api/v1/feedback", running.base))
        .cookie(cookie)
        .send_json(&json!({ "meal": "lunch", "feedbackType": "good" }))
        .await
        .expect("submit request");
    assert!(submit.status().is_success());
    let body: Value = submit.json().await.expect("submit body");
    assert_eq!(body["action"], "submitted");

    let update = next_event(&mut socket).await;
    assert_eq!(update["event"], "feedbackUpdate");
    assert_eq!(update["data"]["meal"], "lunch");
    assert_eq!(update["data"]["feedbackType"], "good");
    assert_eq!(update["data"]["userName"], "Ada Lovelace");
    assert_eq!(update["data"]["counters"]["lunch"]["good"], 1);
}

#[actix_rt::test]
async fn anonymous_submission_is_rejected_and_not_broadcast() {
    let stack = Stack::in_process();
    let running = start(&stack);
    let client = awc::Client::default();

    let mut res = client
        .post(format!("{}/api/v1/feedback", running.base))
        .send_json(&json!({ "meal": "lunch", "feedbackType": "good" }))
        .await
        .expect("submit request");

    assert_eq!(res.status().as_u16(), 401);
    assert!(res.headers().contains_key("trace-id"));
    let body: Value = res.json().await.expect("error body");
    assert_eq!(body["code"], "unauthorized");
    assert_eq!(stack.hub.observer_count(), 0);
}
