//! Per-session replayable event log.
//!
//! Every outbound JSON-RPC message of a session is appended here with a
//! strictly increasing id. A reconnecting SSE client sends the id of the last
//! event it saw (`Last-Event-Id`) and gets everything after it replayed
//! before live delivery resumes.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::broadcast;

/// Identifier of an event within one session. Starts at 1.
pub type EventId = u64;

/// Capacity of the live fan-out channel feeding open SSE streams.
const LIVE_CHANNEL_CAPACITY: usize = 256;

/// A stored outbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    pub id: EventId,
    /// Serialized JSON-RPC message.
    pub payload: String,
}

#[derive(Debug)]
struct LogInner {
    next_id: EventId,
    events: VecDeque<StoredEvent>,
}

/// Append-only ordered buffer of a session's outbound events.
///
/// Appends and snapshots share one lock, and live subscribers are notified
/// while that lock is held, so a subscriber never observes events out of
/// append order and never misses one between its snapshot and its first
/// live event.
#[derive(Debug)]
pub struct EventLog {
    inner: Mutex<LogInner>,
    live_tx: broadcast::Sender<StoredEvent>,
    /// Maximum number of retained events, `None` for unbounded.
    max_events: Option<usize>,
}

impl EventLog {
    /// Create an empty log retaining at most `max_events` events.
    pub fn new(max_events: Option<usize>) -> Self {
        let (live_tx, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(LogInner {
                next_id: 1,
                events: VecDeque::new(),
            }),
            live_tx,
            max_events: max_events.filter(|max| *max > 0),
        }
    }

    /// Append a payload, assigning it the next id.
    pub fn append(&self, payload: impl Into<String>) -> StoredEvent {
        let mut inner = self.inner.lock();
        let event = StoredEvent {
            id: inner.next_id,
            payload: payload.into(),
        };
        inner.next_id += 1;
        inner.events.push_back(event.clone());

        if let Some(max) = self.max_events {
            while inner.events.len() > max {
                inner.events.pop_front();
            }
        }

        // No receivers is the normal case when no stream is open
        let _ = self.live_tx.send(event.clone());
        event
    }

    /// Events strictly after `last_event_id`, in order.
    ///
    /// An absent or unknown id (never issued, or already evicted) yields the
    /// whole retained log. Each call computes a fresh snapshot, so the result
    /// can be requested again at any time.
    pub fn after(&self, last_event_id: Option<EventId>) -> Vec<StoredEvent> {
        let inner = self.inner.lock();
        Self::suffix(&inner.events, last_event_id)
    }

    /// Snapshot events after `last_event_id` and subscribe to live events.
    ///
    /// Both happen under the log lock: the receiver yields exactly the events
    /// appended after the snapshot was taken.
    pub fn subscribe_after(
        &self,
        last_event_id: Option<EventId>,
    ) -> (Vec<StoredEvent>, broadcast::Receiver<StoredEvent>) {
        let inner = self.inner.lock();
        let rx = self.live_tx.subscribe();
        (Self::suffix(&inner.events, last_event_id), rx)
    }

    /// Drop all stored events. Ids keep counting from where they were.
    pub fn clear(&self) {
        self.inner.lock().events.clear();
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Id of the most recently appended event, if any was ever appended.
    pub fn last_id(&self) -> Option<EventId> {
        let inner = self.inner.lock();
        (inner.next_id > 1).then(|| inner.next_id - 1)
    }

    fn suffix(events: &VecDeque<StoredEvent>, last_event_id: Option<EventId>) -> Vec<StoredEvent> {
        let start = last_event_id
            .and_then(|last| events.binary_search_by_key(&last, |e| e.id).ok())
            .map(|index| index + 1)
            .unwrap_or(0);
        events.range(start..).cloned().collect()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(events: &[StoredEvent]) -> Vec<EventId> {
        events.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let log = EventLog::default();
        assert_eq!(log.last_id(), None);

        let first = log.append("a");
        let second = log.append("b");

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(log.last_id(), Some(2));
    }

    #[test]
    fn test_after_returns_suffix() {
        let log = EventLog::default();
        for payload in ["a", "b", "c", "d"] {
            log.append(payload);
        }

        assert_eq!(ids(&log.after(Some(2))), vec![3, 4]);
        assert_eq!(ids(&log.after(Some(4))), Vec::<EventId>::new());
    }

    #[test]
    fn test_after_unknown_id_returns_full_log() {
        let log = EventLog::default();
        log.append("a");
        log.append("b");

        assert_eq!(ids(&log.after(None)), vec![1, 2]);
        assert_eq!(ids(&log.after(Some(99))), vec![1, 2]);
    }

    #[test]
    fn test_after_is_restartable() {
        let log = EventLog::default();
        log.append("a");
        log.append("b");

        let first = log.after(Some(1));
        let second = log.after(Some(1));
        assert_eq!(first, second);
    }

    #[test]
    fn test_clear_does_not_reuse_ids() {
        let log = EventLog::default();
        log.append("a");
        log.append("b");
        log.clear();

        assert!(log.is_empty());
        assert_eq!(log.append("c").id, 3);
    }

    #[test]
    fn test_retention_evicts_oldest() {
        let log = EventLog::new(Some(2));
        for payload in ["a", "b", "c"] {
            log.append(payload);
        }

        assert_eq!(log.len(), 2);
        assert_eq!(ids(&log.after(None)), vec![2, 3]);
        // Evicted id behaves like an unknown one
        assert_eq!(ids(&log.after(Some(1))), vec![2, 3]);
    }

    #[test]
    fn test_zero_retention_means_unbounded() {
        let log = EventLog::new(Some(0));
        for _ in 0..10 {
            log.append("x");
        }
        assert_eq!(log.len(), 10);
    }

    #[tokio::test]
    async fn test_subscribe_after_sees_only_new_events() {
        let log = EventLog::default();
        log.append("a");

        let (replay, mut rx) = log.subscribe_after(None);
        assert_eq!(ids(&replay), vec![1]);

        log.append("b");
        let live = rx.recv().await.unwrap();
        assert_eq!(live.id, 2);
        assert_eq!(live.payload, "b");
    }
}
