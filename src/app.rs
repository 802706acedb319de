//! Application wiring
//!
//! Opens the task log, hydrates the mirror, starts the write-behind queue and
//! the message bridge, and tears them down in the reverse order.

use crate::capture::{InputMonitor, MessageBridge};
use crate::config::Settings;
use crate::error::{WaterflowError, WaterflowResult};
use crate::gesture::GestureEvent;
use crate::storage::{JsonlTaskLog, QueueStats, TaskLog, WriteQueue};
use crate::tasks::{TaskDispatcher, TaskMirror};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct Waterflow {
    dispatcher: TaskDispatcher,
    mirror: Arc<TaskMirror>,
    queue: WriteQueue,
    bridge: MessageBridge,
    gesture_events: Option<mpsc::UnboundedReceiver<GestureEvent>>,
    shutdown_timeout: Duration,
}

impl Waterflow {
    /// Start against the JSONL log in the configured data directory.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(settings: Settings, monitor: Box<dyn InputMonitor>) -> WaterflowResult<Self> {
        let log = JsonlTaskLog::open(&settings.data_dir())?;
        tracing::info!("Task log at {:?}", log.path());
        Self::start_with_log(settings, Arc::new(log), monitor).await
    }

    pub async fn start_with_log(
        settings: Settings,
        log: Arc<dyn TaskLog>,
        monitor: Box<dyn InputMonitor>,
    ) -> WaterflowResult<Self> {
        let records = log.load_all().await?;
        let mirror = Arc::new(TaskMirror::new());
        mirror.hydrate(records);
        tracing::info!("Hydrated {} tasks", mirror.len());

        let queue = WriteQueue::start(log, settings.write_queue_config());
        let dispatcher = TaskDispatcher::new(mirror.clone(), queue.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let mut bridge = MessageBridge::new(monitor, settings.gesture.clone());
        if !bridge.start(tx) {
            let err = WaterflowError::TransportUnavailable(
                "global pointer capture could not be installed".to_string(),
            );
            tracing::warn!("{}; continuing without gestures", err);
        }

        Ok(Self {
            dispatcher,
            mirror,
            queue,
            bridge,
            gesture_events: Some(rx),
            shutdown_timeout: settings.shutdown_timeout(),
        })
    }

    pub fn dispatcher(&self) -> &TaskDispatcher {
        &self.dispatcher
    }

    pub fn mirror(&self) -> &Arc<TaskMirror> {
        &self.mirror
    }

    /// Recognized gestures. Can be taken once.
    pub fn take_gesture_events(&mut self) -> Option<mpsc::UnboundedReceiver<GestureEvent>> {
        self.gesture_events.take()
    }

    /// Whether the global pointer capture is live
    pub fn transport_available(&self) -> bool {
        self.bridge.is_running()
    }

    /// Stop capture, then drain the queue within the configured timeout
    pub async fn shutdown(mut self) -> WaterflowResult<QueueStats> {
        self.bridge.stop();
        let outcome = self.queue.shutdown(self.shutdown_timeout).await?;
        let stats = self.queue.stats();
        tracing::info!(
            "Shutdown complete ({:?}); {} records flushed, {} dropped",
            outcome,
            stats.flushed_records,
            stats.dropped_records
        );
        Ok(stats)
    }
}
