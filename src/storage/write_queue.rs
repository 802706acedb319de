//! Write-behind queue
//!
//! `enqueue` never touches the disk. It pushes onto an unbounded channel and
//! moves a single debounce deadline forward; a background task flushes the
//! whole backlog to the [`TaskLog`] once the deadline passes without another
//! enqueue. Only one flush runs at a time: the receiving half of the channel
//! is the flush gate, and a flush that cannot take it returns immediately.

use crate::error::{WaterflowError, WaterflowResult};
use crate::storage::{TaskLog, WriteBatch};
use crate::tasks::TaskRecord;
use parking_lot::Mutex as ParkingMutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteQueueConfig {
    /// Quiet period after the last enqueue before a flush
    pub flush_delay: Duration,
    /// Extra append attempts before a batch is dropped
    pub retry_attempts: u32,
    /// Wait before retry `n` is `retry_backoff * n`
    pub retry_backoff: Duration,
}

impl Default for WriteQueueConfig {
    fn default() -> Self {
        Self {
            flush_delay: Duration::from_millis(400),
            retry_attempts: 2,
            retry_backoff: Duration::from_millis(50),
        }
    }
}

/// What a single flush did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Another flush held the gate; its drain covers our items
    Busy,
    Empty,
    Flushed(usize),
    /// Every attempt failed and the batch was discarded
    Dropped(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub flushed_batches: u64,
    pub flushed_records: u64,
    pub dropped_records: u64,
    pub failed_attempts: u64,
}

#[derive(Default)]
struct StatsCounters {
    flushed_batches: AtomicU64,
    flushed_records: AtomicU64,
    dropped_records: AtomicU64,
    failed_attempts: AtomicU64,
}

struct QueueInner {
    sender: mpsc::UnboundedSender<TaskRecord>,
    pending: Mutex<mpsc::UnboundedReceiver<TaskRecord>>,
    deadline: ParkingMutex<Option<Instant>>,
    wake: Notify,
    closed: AtomicBool,
    log: Arc<dyn TaskLog>,
    config: WriteQueueConfig,
    stats: StatsCounters,
}

/// Handle to the queue. Clones share the same backlog and worker.
#[derive(Clone)]
pub struct WriteQueue {
    inner: Arc<QueueInner>,
    worker: Arc<ParkingMutex<Option<JoinHandle<()>>>>,
}

impl WriteQueue {
    /// Start the debounce worker. Must be called inside a Tokio runtime.
    pub fn start(log: Arc<dyn TaskLog>, config: WriteQueueConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let inner = Arc::new(QueueInner {
            sender,
            pending: Mutex::new(receiver),
            deadline: ParkingMutex::new(None),
            wake: Notify::new(),
            closed: AtomicBool::new(false),
            log,
            config,
            stats: StatsCounters::default(),
        });

        let worker = tokio::spawn(debounce_loop(inner.clone()));
        tracing::debug!(
            "Write queue started (flush_delay={:?})",
            inner.config.flush_delay
        );

        Self {
            inner,
            worker: Arc::new(ParkingMutex::new(Some(worker))),
        }
    }

    /// Queue `record` for the next flush and push the deadline out.
    ///
    /// Safe from any thread, including threads outside the runtime.
    pub fn enqueue(&self, record: TaskRecord) {
        if self.inner.closed.load(Ordering::SeqCst) {
            tracing::warn!("Write queue is shut down, dropping task {}", record.id());
            return;
        }

        if let Err(e) = self.inner.sender.send(record) {
            tracing::error!("Write queue receiver gone, dropping task {}", e.0.id());
            return;
        }

        *self.inner.deadline.lock() = Some(Instant::now() + self.inner.config.flush_delay);
        self.inner.wake.notify_one();
    }

    /// Flush right away instead of waiting for the deadline
    pub async fn flush_now(&self) -> FlushOutcome {
        self.inner.flush().await
    }

    /// Stop the worker, wait for any in-flight flush, then drain what is left.
    ///
    /// Later `enqueue` calls are ignored.
    pub async fn shutdown(&self, timeout: Duration) -> WaterflowResult<FlushOutcome> {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.wake.notify_one();

        let inner = self.inner.clone();
        let drain = async move {
            let mut pending = inner.pending.lock().await;
            inner.drain_and_append(&mut pending).await
        };

        let outcome = time::timeout(timeout, drain)
            .await
            .map_err(|_| WaterflowError::ShutdownTimeout(timeout))?;

        if let Some(worker) = self.worker.lock().take() {
            worker.abort();
        }

        tracing::info!("Write queue shut down ({:?})", outcome);
        Ok(outcome)
    }

    pub fn stats(&self) -> QueueStats {
        let s = &self.inner.stats;
        QueueStats {
            flushed_batches: s.flushed_batches.load(Ordering::Relaxed),
            flushed_records: s.flushed_records.load(Ordering::Relaxed),
            dropped_records: s.dropped_records.load(Ordering::Relaxed),
            failed_attempts: s.failed_attempts.load(Ordering::Relaxed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl QueueInner {
    async fn flush(&self) -> FlushOutcome {
        let Ok(mut pending) = self.pending.try_lock() else {
            tracing::debug!("Flush already in progress");
            return FlushOutcome::Busy;
        };
        self.drain_and_append(&mut pending).await
    }

    async fn drain_and_append(
        &self,
        pending: &mut mpsc::UnboundedReceiver<TaskRecord>,
    ) -> FlushOutcome {
        let mut records = Vec::new();
        while let Ok(record) = pending.try_recv() {
            records.push(record);
        }
        if records.is_empty() {
            return FlushOutcome::Empty;
        }

        let batch = WriteBatch::new(records);
        let mut attempt = 0u32;
        loop {
            match self.log.append_batch(&batch).await {
                Ok(()) => {
                    self.stats.flushed_batches.fetch_add(1, Ordering::Relaxed);
                    self.stats
                        .flushed_records
                        .fetch_add(batch.len() as u64, Ordering::Relaxed);
                    tracing::debug!("Flushed {} tasks", batch.len());
                    return FlushOutcome::Flushed(batch.len());
                }
                Err(e) => {
                    self.stats.failed_attempts.fetch_add(1, Ordering::Relaxed);
                    if attempt >= self.config.retry_attempts {
                        self.stats
                            .dropped_records
                            .fetch_add(batch.len() as u64, Ordering::Relaxed);
                        tracing::error!(
                            "Dropping batch of {} tasks after {} failed attempts: {}",
                            batch.len(),
                            attempt + 1,
                            e
                        );
                        return FlushOutcome::Dropped(batch.len());
                    }

                    attempt += 1;
                    tracing::warn!(
                        "Task flush failed (attempt {}), retrying: {}",
                        attempt,
                        e
                    );
                    time::sleep(self.config.retry_backoff * attempt).await;
                }
            }
        }
    }
}

async fn debounce_loop(inner: Arc<QueueInner>) {
    loop {
        if inner.closed.load(Ordering::SeqCst) {
            break;
        }

        let deadline = *inner.deadline.lock();
        let Some(at) = deadline else {
            inner.wake.notified().await;
            continue;
        };

        if Instant::now() < at {
            tokio::select! {
                _ = time::sleep_until(at) => {}
                _ = inner.wake.notified() => {}
            }
            continue;
        }

        {
            let mut slot = inner.deadline.lock();
            if *slot != Some(at) {
                // Re-armed while we were checking.
                continue;
            }
            *slot = None;
        }

        if inner.flush().await == FlushOutcome::Busy {
            // The running flush may have drained before our records arrived.
            let mut slot = inner.deadline.lock();
            slot.get_or_insert(Instant::now() + inner.config.flush_delay);
        }
    }

    tracing::debug!("Write queue worker stopped");
}
