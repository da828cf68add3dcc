//! MCP session management.
//!
//! Manages session lifecycle for MCP Streamable HTTP connections.
//! Sessions are identified by random UUIDs, own a replayable event log,
//! and allow at most one SSE stream at a time.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{MutexGuard, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::event_log::{EventLog, StoredEvent};

/// How responses to POSTed requests are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// One synchronous `application/json` body per request.
    Json,
    /// Responses delivered as `text/event-stream` events.
    Stream,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, `initialize` not yet answered.
    Initializing,
    /// Handling requests.
    Active,
    /// Terminated. Never leaves this state.
    Closed,
}

/// An MCP session.
#[derive(Debug)]
pub struct McpSession {
    /// Unique session identifier.
    pub id: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Fixed at creation.
    pub response_mode: ResponseMode,
    last_activity: Mutex<Instant>,
    state: Mutex<SessionState>,
    events: EventLog,
    /// Serializes request handling within this session.
    request_lock: tokio::sync::Mutex<()>,
    stream_open: AtomicBool,
    /// Cancelled when the session closes; ends any open stream.
    closed: CancellationToken,
}

impl McpSession {
    /// Create a new session with a unique ID.
    pub fn new(max_events: Option<usize>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            response_mode: ResponseMode::Json,
            last_activity: Mutex::new(Instant::now()),
            state: Mutex::new(SessionState::Initializing),
            events: EventLog::new(max_events),
            request_lock: tokio::sync::Mutex::new(()),
            stream_open: AtomicBool::new(false),
            closed: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Move from `Initializing` to `Active`. Returns false for any other state.
    pub fn activate(&self) -> bool {
        let mut state = self.state.lock();
        if *state == SessionState::Initializing {
            *state = SessionState::Active;
            debug!("MCP session {} marked as active", self.id);
            true
        } else {
            false
        }
    }

    /// Close the session: end any open stream and discard the event log.
    ///
    /// Callers that can race an in-flight request hold the request lock.
    pub fn close(&self) {
        *self.state.lock() = SessionState::Closed;
        self.closed.cancel();
        self.events.clear();
    }

    /// Wait for exclusive use of this session.
    ///
    /// Held for the whole handling of one request; concurrent requests for
    /// the same session queue here. Other sessions are unaffected.
    pub async fn lock_requests(&self) -> MutexGuard<'_, ()> {
        self.request_lock.lock().await
    }

    /// The request lock, if no request is being handled right now.
    pub fn try_lock_requests(&self) -> Option<MutexGuard<'_, ()>> {
        self.request_lock.try_lock().ok()
    }

    /// Record activity on the session.
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Time since the last recorded activity.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// The session's event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Append an outbound message to the event log.
    ///
    /// Returns `None` unless the session is active. The state lock is held
    /// across the append, so nothing lands in the log after `close`.
    pub fn record(&self, payload: impl Into<String>) -> Option<StoredEvent> {
        let state = self.state.lock();
        (*state == SessionState::Active).then(|| self.events.append(payload))
    }

    /// Token cancelled when the session closes.
    pub fn closed_token(&self) -> CancellationToken {
        self.closed.clone()
    }

    pub fn has_open_stream(&self) -> bool {
        self.stream_open.load(Ordering::SeqCst)
    }

    /// Claim the session's single stream slot.
    ///
    /// Returns `None` when a stream is already open. The slot is released
    /// when the returned guard is dropped.
    pub fn try_open_stream(self: &Arc<Self>) -> Option<StreamGuard> {
        self.stream_open
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| StreamGuard {
                session: Arc::clone(self),
            })
    }
}

/// Holds a session's stream slot for as long as the stream lives.
#[derive(Debug)]
pub struct StreamGuard {
    session: Arc<McpSession>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.session.stream_open.store(false, Ordering::SeqCst);
        info!("MCP: SSE stream closed for session {}", self.session.id);
    }
}

/// Manager for MCP sessions.
///
/// Cheap to clone; clones share the same session table.
#[derive(Clone, Debug)]
pub struct McpSessionManager {
    sessions: Arc<RwLock<HashMap<String, Arc<McpSession>>>>,
    max_events: Option<usize>,
}

impl McpSessionManager {
    /// Create a new session manager with unbounded event logs.
    pub fn new() -> Self {
        Self::with_max_events(None)
    }

    /// Create a session manager whose sessions retain at most `max_events` events.
    pub fn with_max_events(max_events: Option<usize>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_events,
        }
    }

    /// Create a new session in the `Initializing` state.
    pub async fn create_session(&self) -> Arc<McpSession> {
        let session = Arc::new(McpSession::new(self.max_events));
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), Arc::clone(&session));
        info!("Created MCP session: {}", session.id);
        session
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &str) -> Option<Arc<McpSession>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Check if a session exists.
    pub async fn session_exists(&self, id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(id)
    }

    /// Terminate a session. Removing an unknown id is a no-op returning false.
    pub async fn terminate(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(session) => {
                session.close();
                info!("Terminated MCP session: {}", id);
                true
            }
            None => false,
        }
    }

    /// Get the number of active sessions.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Close sessions idle for longer than `max_idle`.
    ///
    /// A session with a request in flight or a listening stream is not idle,
    /// whatever its last activity.
    pub async fn cleanup_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            if session.idle_for() < max_idle || session.has_open_stream() {
                return true;
            }
            let Some(_request_guard) = session.try_lock_requests() else {
                debug!("Skipping busy MCP session {} in idle sweep", id);
                return true;
            };
            info!(
                "Cleaning up idle MCP session: {} (idle: {}s)",
                id,
                session.idle_for().as_secs()
            );
            session.close();
            false
        });
        before - sessions.len()
    }

    /// Periodically close sessions idle for longer than `max_idle`.
    ///
    /// The task runs until aborted.
    pub fn spawn_idle_sweeper(&self, max_idle: Duration) -> tokio::task::JoinHandle<()> {
        let manager = self.clone();
        let period = (max_idle / 4).clamp(Duration::from_millis(100), Duration::from_secs(60));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let closed = manager.cleanup_idle(max_idle).await;
                if closed > 0 {
                    info!("Closed {} idle MCP sessions", closed);
                }
            }
        })
    }

    /// Close every session. Used at shutdown.
    ///
    /// Each session is closed once its in-flight request, if any, finishes.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<_> = self.sessions.write().await.drain().collect();
        for (id, session) in &drained {
            let _request_guard = session.lock_requests().await;
            session.close();
            debug!("Closed MCP session {} at shutdown", id);
        }
        drained.len()
    }
}

impl Default for McpSessionManager {
    fn default() -> Self {
        Self::new()
    }
}
