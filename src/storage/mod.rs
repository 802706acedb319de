//! Durable task storage
//!
//! `TaskLog` is the seam between the write-behind queue and the medium. The
//! production implementation is an append-only JSON-lines file.

pub mod log_store;
pub mod write_queue;

pub use log_store::JsonlTaskLog;
pub use write_queue::{FlushOutcome, QueueStats, WriteQueue, WriteQueueConfig};

use crate::error::WaterflowResult;
use crate::tasks::TaskRecord;
use async_trait::async_trait;
use std::sync::Arc;

/// Records drained from the queue in one flush, in enqueue order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    records: Arc<[TaskRecord]>,
}

impl WriteBatch {
    pub fn new(records: Vec<TaskRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Append-only record store
#[async_trait]
pub trait TaskLog: Send + Sync {
    /// Append every record of `batch` as one unit and make it durable
    async fn append_batch(&self, batch: &WriteBatch) -> WaterflowResult<()>;

    /// Every readable record, deduplicated by id, newest first
    async fn load_all(&self) -> WaterflowResult<Vec<TaskRecord>>;
}
