//! MCP Streamable HTTP endpoint handlers.
//!
//! Implements the MCP 2025-03-26 Streamable HTTP transport.
//!
//! ## Endpoints
//!
//! - `POST /mcp` - Send JSON-RPC requests, answered with a JSON body
//! - `GET /mcp` - Open an SSE stream of the session's events, resumable
//!   with `Last-Event-Id`
//! - `DELETE /mcp` - Terminate a session
//!
//! Requests within one session are serialized on the session's request
//! lock. Requests for different sessions never wait on each other.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::stream::{self, Stream};
use futures::{future, StreamExt};
use podgate_types::{JsonRpcRequest, JsonRpcResponse};
use serde_json::Value;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::mcp::{EventId, McpSession, StoredEvent, StreamGuard};
use crate::state::AppState;

/// Header name for MCP session ID.
pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

/// Header carrying the id of the last event a reconnecting client saw.
pub const LAST_EVENT_ID_HEADER: &str = "last-event-id";

const INITIALIZE: &str = "initialize";

/// Extract session ID from headers.
fn get_session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(MCP_SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Extract the resume point. Anything that is not an event id means "from the start".
fn get_last_event_id(headers: &HeaderMap) -> Option<EventId> {
    headers
        .get(LAST_EVENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Parse and check a JSON-RPC envelope.
fn parse_request(body: &[u8]) -> Result<JsonRpcRequest, TransportError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| TransportError::ParseError(e.to_string()))?;
    if value.is_array() {
        return Err(TransportError::InvalidRequest(
            "batch requests are not supported".to_string(),
        ));
    }
    let request: JsonRpcRequest = serde_json::from_value(value)
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
    if !request.is_well_formed() {
        return Err(TransportError::InvalidRequest(
            "expected jsonrpc \"2.0\" and a method".to_string(),
        ));
    }
    Ok(request)
}

/// Serialize a response into a JSON body, optionally tagged with a session id.
fn json_response(body: String, session_id: Option<&str>) -> Response {
    let mut resp = (StatusCode::OK, body).into_response();
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    if let Some(sid) = session_id {
        if let Ok(hv) = HeaderValue::from_str(sid) {
            resp.headers_mut()
                .insert(HeaderName::from_static(MCP_SESSION_ID_HEADER), hv);
        }
    }
    resp
}

/// Record a response in the session's event log and send it as JSON.
///
/// A session closed while the request ran gets neither an event nor a reply.
fn record_and_respond(
    session: &McpSession,
    response: &JsonRpcResponse,
) -> Result<Response, TransportError> {
    let body = serde_json::to_string(response).unwrap_or_default();
    let event = session.record(body.clone()).ok_or_else(|| {
        warn!("MCP: Dropping response for closed session {}", session.id);
        TransportError::SessionNotActive(session.id.clone())
    })?;
    debug!("MCP: Recorded event {} in session {}", event.id, session.id);
    Ok(json_response(body, Some(&session.id)))
}

/// POST /mcp - Handle JSON-RPC requests.
///
/// Without an `Mcp-Session-Id` header only `initialize` is accepted; it
/// creates the session and returns its id in the response header. With the
/// header, the request runs inside that session. Notifications are answered
/// with 202 and no body.
#[utoipa::path(
    post,
    path = "/mcp",
    tag = "mcp",
    request_body = JsonRpcRequest,
    params(
        ("Mcp-Session-Id" = Option<String>, Header, description = "Session id, required after initialize")
    ),
    responses(
        (status = 200, description = "JSON-RPC response", body = JsonRpcResponse),
        (status = 202, description = "Notification accepted"),
        (status = 400, description = "Missing or unknown session, or malformed envelope", body = JsonRpcResponse),
        (status = 401, description = "API key missing", body = JsonRpcResponse),
        (status = 403, description = "API key invalid", body = JsonRpcResponse)
    )
)]
pub async fn mcp_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, TransportError> {
    let request = parse_request(&body)?;
    let session_id = get_session_id(&headers);
    debug!(
        "MCP POST: method={}, session={:?}",
        request.method, session_id
    );

    match session_id {
        None => initialize_session(&state, request).await,
        Some(id) => handle_in_session(&state, &id, request).await,
    }
}

async fn initialize_session(
    state: &AppState,
    request: JsonRpcRequest,
) -> Result<Response, TransportError> {
    if request.method != INITIALIZE {
        warn!(
            "MCP: Rejecting {} without a session id",
            request.method
        );
        return Err(TransportError::MissingSession);
    }
    if request.is_notification() {
        return Err(TransportError::NotInitialize);
    }

    let session = state.sessions().create_session().await;
    let _request_guard = session.lock_requests().await;
    let Some(response) = state.handler().handle_request(request).await else {
        state.sessions().terminate(&session.id).await;
        return Err(TransportError::NotInitialize);
    };

    if response.is_error() {
        // No session survives a failed initialize
        state.sessions().terminate(&session.id).await;
        let body = serde_json::to_string(&response).unwrap_or_default();
        return Ok(json_response(body, None));
    }

    if !session.activate() {
        return Err(TransportError::SessionNotActive(session.id.clone()));
    }
    info!("MCP: New session initialized: {}", session.id);
    record_and_respond(&session, &response)
}

async fn handle_in_session(
    state: &AppState,
    session_id: &str,
    request: JsonRpcRequest,
) -> Result<Response, TransportError> {
    let session = state
        .sessions()
        .get_session(session_id)
        .await
        .ok_or_else(|| TransportError::UnknownSession(session_id.to_string()))?;

    let _request_guard = session.lock_requests().await;
    // A DELETE may have won the lock while we waited
    if !session.is_active() {
        return Err(TransportError::SessionNotActive(session_id.to_string()));
    }
    session.touch();

    match state.handler().handle_request(request).await {
        Some(response) => record_and_respond(&session, &response),
        None => Ok(StatusCode::ACCEPTED.into_response()),
    }
}

/// GET /mcp - Open SSE stream of the session's events.
///
/// With `Last-Event-Id`, events after that id are replayed before live
/// events. A session has at most one open stream.
#[utoipa::path(
    get,
    path = "/mcp",
    tag = "mcp",
    params(
        ("Mcp-Session-Id" = String, Header, description = "Session id"),
        ("Last-Event-Id" = Option<String>, Header, description = "Resume after this event id")
    ),
    responses(
        (status = 200, description = "text/event-stream of session events"),
        (status = 400, description = "Missing or unknown session", body = JsonRpcResponse),
        (status = 409, description = "Session already has an open stream", body = JsonRpcResponse)
    )
)]
pub async fn mcp_get(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, TransportError> {
    let session_id = get_session_id(&headers).ok_or(TransportError::MissingSession)?;
    let session = state
        .sessions()
        .get_session(&session_id)
        .await
        .ok_or_else(|| TransportError::UnknownSession(session_id.clone()))?;
    if !session.is_active() {
        return Err(TransportError::SessionNotActive(session_id));
    }

    let guard = session
        .try_open_stream()
        .ok_or_else(|| TransportError::StreamConflict(session_id.clone()))?;

    let last_event_id = get_last_event_id(&headers);
    if let Some(requested) = last_event_id {
        if session.events().last_id().map_or(true, |head| requested > head) {
            warn!(
                "MCP: Last-Event-Id {} was never issued in session {}, replaying from the start",
                requested, session_id
            );
        }
    }
    let (replay, live) = session.events().subscribe_after(last_event_id);
    session.touch();
    info!(
        "MCP: SSE stream opened for session {} (after {:?}, replaying {} events)",
        session_id,
        last_event_id,
        replay.len()
    );

    let stream = create_sse_stream(replay, live, session.closed_token(), guard);
    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response())
}

/// Replayed events followed by live ones, ending when the session closes.
///
/// The stream owns the session's stream slot; dropping it (client gone)
/// frees the slot but leaves the session and its log intact.
fn create_sse_stream(
    replay: Vec<StoredEvent>,
    live: broadcast::Receiver<StoredEvent>,
    closed: CancellationToken,
    guard: StreamGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    // A lagging receiver ends the stream; the client resumes from the log
    let live = BroadcastStream::new(live)
        .take_while(|result| {
            if let Err(BroadcastStreamRecvError::Lagged(skipped)) = result {
                warn!("MCP: SSE stream lagged by {} events, closing", skipped);
            }
            future::ready(result.is_ok())
        })
        .filter_map(|result| future::ready(result.ok()));

    stream::iter(replay)
        .chain(live)
        .take_until(closed.cancelled_owned())
        .map(move |event| {
            let _slot = &guard;
            Ok(Event::default().id(event.id.to_string()).data(event.payload))
        })
}

/// DELETE /mcp - Terminate a session.
///
/// Terminates the session identified by the `Mcp-Session-Id` header,
/// closing its stream and discarding its event log.
#[utoipa::path(
    delete,
    path = "/mcp",
    tag = "mcp",
    params(
        ("Mcp-Session-Id" = String, Header, description = "Session id")
    ),
    responses(
        (status = 204, description = "Session terminated"),
        (status = 400, description = "Missing or unknown session", body = JsonRpcResponse)
    )
)]
pub async fn mcp_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, TransportError> {
    let session_id = get_session_id(&headers).ok_or(TransportError::MissingSession)?;
    let session = state
        .sessions()
        .get_session(&session_id)
        .await
        .ok_or_else(|| TransportError::UnknownSession(session_id.clone()))?;

    // Wait for any in-flight request of this session
    let _request_guard = session.lock_requests().await;
    if !state.sessions().terminate(&session_id).await {
        return Err(TransportError::UnknownSession(session_id));
    }

    info!("MCP: Session terminated: {}", session_id);
    Ok(StatusCode::NO_CONTENT)
}
