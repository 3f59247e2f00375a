//! HTTP event-stream transport.
//!
//! `GET /sse` opens a session and streams its outgoing messages; the first
//! event (`endpoint`) tells the client where to `POST` requests. Posted
//! requests are acknowledged with `202 Accepted` straight away and their
//! results arrive later on the stream as `message` events.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use sdlc_toolbox_core::ToolRegistry;

use crate::server::McpServer;

const KEEP_ALIVE: Duration = Duration::from_secs(15);

struct Session {
    server: Arc<Mutex<McpServer>>,
    outbox: mpsc::UnboundedSender<String>,
}

type Sessions = Arc<Mutex<HashMap<Uuid, Session>>>;

#[derive(Clone)]
struct SseState {
    registry: Arc<ToolRegistry>,
    sessions: Sessions,
}

fn lock(sessions: &Sessions) -> MutexGuard<'_, HashMap<Uuid, Session>> {
    sessions.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes its session once the event stream that owns it is dropped.
struct SessionGuard {
    id: Uuid,
    sessions: Sessions,
}

impl SessionGuard {
    fn message(&self, data: String) -> Result<Event, Infallible> {
        tracing::trace!(session = %self.id, "sending message");
        Ok(Event::default().event("message").data(data))
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        lock(&self.sessions).remove(&self.id);
        tracing::info!(session = %self.id, "session closed");
    }
}

pub fn router(registry: Arc<ToolRegistry>) -> Router {
    let state = SseState {
        registry,
        sessions: Arc::new(Mutex::new(HashMap::new())),
    };

    Router::new()
        .route("/sse", get(open_session))
        .route("/messages/", post(post_message))
        .route("/messages", post(post_message))
        .with_state(state)
}

pub async fn serve_sse(registry: Arc<ToolRegistry>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("serving {} on http://{}/sse", registry.name(), listener.local_addr()?);
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(interrupted())
        .await
}

async fn interrupted() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("interrupted, shutting down"),
        Err(e) => {
            tracing::warn!("cannot listen for ctrl-c: {}", e);
            std::future::pending::<()>().await
        }
    }
}

async fn open_session(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = Uuid::new_v4();
    let (outbox, inbox) = mpsc::unbounded_channel();

    lock(&state.sessions).insert(
        id,
        Session {
            server: Arc::new(Mutex::new(McpServer::new(state.registry.clone()))),
            outbox,
        },
    );
    tracing::info!(session = %id, "session opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages/?session_id={}", id.simple()));

    let guard = SessionGuard {
        id,
        sessions: state.sessions.clone(),
    };
    let messages = UnboundedReceiverStream::new(inbox).map(move |data| guard.message(data));

    let stream = tokio_stream::once(Ok(endpoint)).chain(messages);
    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE))
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(raw_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "session_id is required").into_response();
    };
    let Ok(id) = Uuid::parse_str(&raw_id) else {
        return (StatusCode::BAD_REQUEST, "Invalid session ID").into_response();
    };

    let session = lock(&state.sessions)
        .get(&id)
        .map(|s| (s.server.clone(), s.outbox.clone()));
    let Some((server, outbox)) = session else {
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    };

    // Tools make blocking HTTP calls, so they run off the async workers.
    tokio::task::spawn_blocking(move || {
        let messages = server
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handle_request(&body);

        for message in messages {
            if outbox.send(message).is_err() {
                tracing::debug!(session = %id, "stream closed before delivery");
                break;
            }
        }
    });

    (StatusCode::ACCEPTED, "Accepted").into_response()
}
