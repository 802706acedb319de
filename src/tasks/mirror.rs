//! In-memory task list
//!
//! The mirror is what observers read. It is updated synchronously when a task
//! is created, ahead of the write-behind log, and is hydrated once from the
//! log at startup.

use crate::tasks::record::TaskRecord;
use parking_lot::Mutex as ParkingMutex;
use std::collections::HashSet;
use tokio::sync::broadcast;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 256;

/// Notifications raised by [`TaskMirror::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    Added(TaskRecord),
    Changed,
}

#[derive(Default)]
struct MirrorState {
    /// Newest first
    tasks: Vec<TaskRecord>,
    ids: HashSet<Uuid>,
}

pub struct TaskMirror {
    state: ParkingMutex<MirrorState>,
    events: broadcast::Sender<MirrorEvent>,
}

impl Default for TaskMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskMirror {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: ParkingMutex::new(MirrorState::default()),
            events,
        }
    }

    /// Subscribe to `Added`/`Changed` notifications.
    ///
    /// Events are sent after the lock is released, so a subscriber may call
    /// back into the mirror. Slow subscribers see `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<MirrorEvent> {
        self.events.subscribe()
    }

    /// Insert `record` unless its id is already present.
    ///
    /// Returns whether the record was inserted. Duplicates change nothing and
    /// raise no events.
    pub fn add(&self, record: TaskRecord) -> bool {
        {
            let mut state = self.state.lock();
            if !state.ids.insert(record.id()) {
                return false;
            }
            // Ahead of anything older or equally old.
            let at = state
                .tasks
                .partition_point(|existing| existing.created_at() > record.created_at());
            state.tasks.insert(at, record.clone());
        }

        // No receivers is fine.
        let _ = self.events.send(MirrorEvent::Added(record));
        let _ = self.events.send(MirrorEvent::Changed);
        true
    }

    /// Replace the whole list without raising events.
    ///
    /// Input is stably sorted newest-first, so records with identical
    /// timestamps keep their input order; the first occurrence of an id wins.
    pub fn hydrate<I>(&self, records: I)
    where
        I: IntoIterator<Item = TaskRecord>,
    {
        let mut sorted: Vec<TaskRecord> = records.into_iter().collect();
        sorted.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        let mut ids = HashSet::with_capacity(sorted.len());
        sorted.retain(|record| ids.insert(record.id()));

        let mut state = self.state.lock();
        state.tasks = sorted;
        state.ids = ids;
    }

    /// Copy of the current list, newest first
    pub fn snapshot(&self) -> Vec<TaskRecord> {
        self.state.lock().tasks.clone()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.state.lock().ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use tokio::sync::broadcast::error::TryRecvError;

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).unwrap()
    }

    fn record(title: &str, ts: &str) -> TaskRecord {
        TaskRecord::new(title, at(ts))
    }

    #[test]
    fn test_add_is_idempotent() {
        let mirror = TaskMirror::new();
        let r = record("one", "2024-05-01T10:00:00+00:00");

        assert!(mirror.add(r.clone()));
        let once = mirror.snapshot();
        assert!(!mirror.add(r.clone()));

        assert_eq!(mirror.snapshot(), once);
        assert_eq!(mirror.len(), 1);
        assert!(mirror.contains(r.id()));
    }

    #[test]
    fn test_duplicate_add_raises_no_events() {
        let mirror = TaskMirror::new();
        let r = record("one", "2024-05-01T10:00:00+00:00");
        mirror.add(r.clone());

        let mut events = mirror.subscribe();
        mirror.add(r);
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_add_raises_added_then_changed() {
        let mirror = TaskMirror::new();
        let mut events = mirror.subscribe();
        let r = record("one", "2024-05-01T10:00:00+00:00");

        mirror.add(r.clone());

        assert_eq!(events.try_recv().unwrap(), MirrorEvent::Added(r));
        assert_eq!(events.try_recv().unwrap(), MirrorEvent::Changed);
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_add_orders_by_timestamp_not_arrival() {
        let mirror = TaskMirror::new();
        let late = record("late", "2024-05-01T10:05:00+00:00");
        let early = record("early", "2024-05-01T10:00:00+00:00");
        let middle = record("middle", "2024-05-01T10:02:00+00:00");

        mirror.add(late.clone());
        mirror.add(early.clone());
        mirror.add(middle.clone());

        assert_eq!(mirror.snapshot(), vec![late, middle, early]);
    }

    #[test]
    fn test_add_compares_instants_across_offsets() {
        let mirror = TaskMirror::new();
        // 10:00 UTC vs 11:30+02:00 (= 09:30 UTC)
        let utc = record("utc", "2024-05-01T10:00:00+00:00");
        let plus_two = record("plus-two", "2024-05-01T11:30:00+02:00");

        mirror.add(plus_two.clone());
        mirror.add(utc.clone());

        assert_eq!(mirror.snapshot(), vec![utc, plus_two]);
    }

    #[test]
    fn test_hydrate_sorts_newest_first() {
        let mirror = TaskMirror::new();
        let r1 = record("r1", "2024-05-01T10:00:00+00:00");
        let r2 = record("r2", "2024-05-01T10:05:00+00:00");

        mirror.hydrate(vec![r1.clone(), r2.clone()]);

        assert_eq!(mirror.snapshot(), vec![r2, r1]);
    }

    #[test]
    fn test_hydrate_dedups_and_is_silent() {
        let mirror = TaskMirror::new();
        mirror.add(record("stale", "2024-04-01T00:00:00+00:00"));
        let mut events = mirror.subscribe();

        let r1 = record("r1", "2024-05-01T10:00:00+00:00");
        let copy = TaskRecord::with_id(r1.id(), "r1 copy", r1.created_at());
        mirror.hydrate(vec![r1.clone(), copy]);

        assert_eq!(mirror.snapshot(), vec![r1]);
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_hydrate_ties_keep_input_order() {
        let mirror = TaskMirror::new();
        let a = record("a", "2024-05-01T10:00:00+00:00");
        let b = record("b", "2024-05-01T10:00:00+00:00");
        let c = record("c", "2024-05-01T10:00:00+00:00");

        mirror.hydrate(vec![b.clone(), a.clone(), c.clone()]);

        assert_eq!(mirror.snapshot(), vec![b, a, c]);
    }

    #[test]
    fn test_add_after_hydrate_respects_hydrated_ids() {
        let mirror = TaskMirror::new();
        let r1 = record("r1", "2024-05-01T10:00:00+00:00");
        mirror.hydrate(vec![r1.clone()]);

        assert!(!mirror.add(r1));
        assert_eq!(mirror.len(), 1);
    }
}
