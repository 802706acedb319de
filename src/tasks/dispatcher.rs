use crate::error::{WaterflowError, WaterflowResult};
use crate::storage::WriteQueue;
use crate::tasks::mirror::TaskMirror;
use crate::tasks::record::{normalize_title, TaskRecord};
use std::sync::Arc;

/// Entry point for "create task".
///
/// The mirror is updated before `create_task` returns; durability is left to
/// the write-behind queue so callers never wait on disk I/O.
pub struct TaskDispatcher {
    mirror: Arc<TaskMirror>,
    queue: WriteQueue,
}

impl TaskDispatcher {
    pub fn new(mirror: Arc<TaskMirror>, queue: WriteQueue) -> Self {
        Self { mirror, queue }
    }

    /// Create a task from user input.
    ///
    /// The title is trimmed and cut to 200 characters. A title that is empty
    /// after trimming is rejected with `InvalidArgument` and nothing changes.
    pub fn create_task(&self, title: &str) -> WaterflowResult<TaskRecord> {
        let title = normalize_title(title).ok_or_else(|| {
            WaterflowError::InvalidArgument("Task title cannot be empty".to_string())
        })?;

        let record = TaskRecord::now(title);
        self.mirror.add(record.clone());
        self.queue.enqueue(record.clone());

        tracing::debug!("Created task {}", record.id());
        Ok(record)
    }

    pub fn mirror(&self) -> &Arc<TaskMirror> {
        &self.mirror
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FlushOutcome, JsonlTaskLog, TaskLog, WriteQueueConfig};
    use crate::tasks::record::MAX_TITLE_CHARS;
    use tempfile::TempDir;

    fn dispatcher(dir: &TempDir) -> (TaskDispatcher, WriteQueue, Arc<JsonlTaskLog>) {
        let log = Arc::new(JsonlTaskLog::open(dir.path()).unwrap());
        let queue = WriteQueue::start(log.clone(), WriteQueueConfig::default());
        let dispatcher = TaskDispatcher::new(Arc::new(TaskMirror::new()), queue.clone());
        (dispatcher, queue, log)
    }

    #[tokio::test]
    async fn test_blank_titles_are_rejected() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, queue, _log) = dispatcher(&dir);

        for title in ["", " ", "\t\n", "\u{3000}"] {
            let err = dispatcher.create_task(title).unwrap_err();
            assert!(matches!(err, WaterflowError::InvalidArgument(_)), "{:?}", title);
        }

        assert!(dispatcher.mirror().is_empty());
        assert_eq!(queue.flush_now().await, FlushOutcome::Empty);
    }

    #[tokio::test]
    async fn test_created_task_is_visible_immediately() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, _queue, _log) = dispatcher(&dir);

        let record = dispatcher.create_task("  water the plants  ").unwrap();

        assert_eq!(record.title(), "water the plants");
        assert_eq!(dispatcher.mirror().snapshot(), vec![record]);
    }

    #[tokio::test]
    async fn test_long_title_is_truncated() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, _queue, _log) = dispatcher(&dir);

        let long = format!("  {}  ", "x".repeat(MAX_TITLE_CHARS + 1));
        let record = dispatcher.create_task(&long).unwrap();

        assert_eq!(record.title(), "x".repeat(MAX_TITLE_CHARS));
    }

    #[tokio::test]
    async fn test_created_tasks_reach_the_log() {
        let dir = TempDir::new().unwrap();
        let (dispatcher, queue, log) = dispatcher(&dir);

        let first = dispatcher.create_task("first").unwrap();
        let second = dispatcher.create_task("second").unwrap();
        assert!(log.load_all().await.unwrap().is_empty());

        assert_eq!(queue.flush_now().await, FlushOutcome::Flushed(2));

        let ids: Vec<_> = log.load_all().await.unwrap().iter().map(|r| r.id()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first.id()));
        assert!(ids.contains(&second.id()));
    }
}
