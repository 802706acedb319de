//! JSON-lines task log
//!
//! One self-contained JSON object per line, appended in batches, never
//! rewritten. Loading is best-effort: a line that does not parse (for example
//! the tail of an interrupted write) is skipped and the rest of the file still
//! loads.

use crate::error::{WaterflowError, WaterflowResult};
use crate::storage::{TaskLog, WriteBatch};
use crate::tasks::TaskRecord;
use async_trait::async_trait;
use parking_lot::Mutex as ParkingMutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub const TASKS_FILE_NAME: &str = "tasks.jsonl";

struct LogInner {
    path: PathBuf,
    /// Serializes appends against loads
    io_gate: ParkingMutex<()>,
}

/// File-backed [`TaskLog`]. Cheap to clone; clones share the I/O gate.
#[derive(Clone)]
pub struct JsonlTaskLog {
    inner: Arc<LogInner>,
}

impl JsonlTaskLog {
    /// Use `<data_dir>/tasks.jsonl`, creating the directory if needed
    pub fn open(data_dir: &Path) -> WaterflowResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        Ok(Self::at_path(data_dir.join(TASKS_FILE_NAME)))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            inner: Arc::new(LogInner {
                path,
                io_gate: ParkingMutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Blocking append. Returns the number of lines written.
    ///
    /// Malformed records are left out rather than written. The file is opened
    /// in append mode for this call only, so readers are never locked out
    /// between flushes.
    pub fn append_blocking(&self, records: &[TaskRecord]) -> WaterflowResult<usize> {
        let mut buf = String::new();
        let mut written = 0;
        for record in records {
            if !record.is_well_formed() {
                tracing::warn!("Refusing to persist malformed task {}", record.id());
                continue;
            }
            buf.push_str(&serde_json::to_string(record)?);
            buf.push('\n');
            written += 1;
        }
        if written == 0 {
            return Ok(0);
        }

        let _gate = self.inner.io_gate.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?;
        file.write_all(buf.as_bytes())?;
        file.flush()?;
        file.sync_data()?;

        Ok(written)
    }

    /// Blocking load: dedup by id (later line wins), newest first.
    ///
    /// Records with identical timestamps are ordered by file position, later
    /// lines first.
    pub fn load_blocking(&self) -> WaterflowResult<Vec<TaskRecord>> {
        let _gate = self.inner.io_gate.lock();
        if !self.inner.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.inner.path)?;
        let mut reader = BufReader::new(file);
        let mut by_id: HashMap<Uuid, (usize, TaskRecord)> = HashMap::new();
        let mut skipped = 0usize;
        let mut line = Vec::new();
        let mut line_no = 0usize;

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            line_no += 1;

            match parse_line(line_no, &line) {
                Ok(Some(record)) => {
                    by_id.insert(record.id(), (line_no, record));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!("Skipping unreadable task line: {}", e);
                    skipped += 1;
                }
            }
        }

        let mut ordered: Vec<(usize, TaskRecord)> = by_id.into_values().collect();
        ordered.sort_by(|(line_a, a), (line_b, b)| {
            b.created_at()
                .cmp(&a.created_at())
                .then(line_b.cmp(line_a))
        });

        tracing::info!(
            "Loaded {} tasks from {:?} ({} lines skipped)",
            ordered.len(),
            self.inner.path,
            skipped
        );
        Ok(ordered.into_iter().map(|(_, record)| record).collect())
    }
}

/// `Ok(None)` for blank lines
fn parse_line(line_no: usize, raw: &[u8]) -> WaterflowResult<Option<TaskRecord>> {
    let corrupt = |reason: String| WaterflowError::CorruptRecord {
        line: line_no,
        reason,
    };

    let text = std::str::from_utf8(raw).map_err(|e| corrupt(e.to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let record: TaskRecord = serde_json::from_str(text).map_err(|e| corrupt(e.to_string()))?;
    if !record.is_well_formed() {
        return Err(corrupt("missing id or title".to_string()));
    }
    Ok(Some(record))
}

#[async_trait]
impl TaskLog for JsonlTaskLog {
    async fn append_batch(&self, batch: &WriteBatch) -> WaterflowResult<()> {
        let log = self.clone();
        let batch = batch.clone();
        let written = tokio::task::spawn_blocking(move || log.append_blocking(batch.records()))
            .await
            .map_err(|e| WaterflowError::PlatformError(format!("Append task failed: {}", e)))??;

        tracing::debug!("Appended {} task lines to {:?}", written, self.path());
        Ok(())
    }

    async fn load_all(&self) -> WaterflowResult<Vec<TaskRecord>> {
        let log = self.clone();
        tokio::task::spawn_blocking(move || log.load_blocking())
            .await
            .map_err(|e| WaterflowError::PlatformError(format!("Load task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use tempfile::TempDir;

    fn at(ts: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(ts).unwrap()
    }

    fn open_log() -> (TempDir, JsonlTaskLog) {
        let dir = TempDir::new().unwrap();
        let log = JsonlTaskLog::open(dir.path()).unwrap();
        (dir, log)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (_dir, log) = open_log();
        assert!(log.load_blocking().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_fields() {
        let (_dir, log) = open_log();
        let record = TaskRecord::new("call the dentist", at("2024-05-01T10:00:00.123456789+02:00"));

        log.append_batch(&WriteBatch::new(vec![record.clone()]))
            .await
            .unwrap();
        let loaded = log.load_all().await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), record.id());
        assert_eq!(loaded[0].title(), record.title());
        assert_eq!(loaded[0].created_at(), record.created_at());
        assert_eq!(loaded[0].created_at().offset(), record.created_at().offset());
    }

    #[test]
    fn test_one_line_per_record() {
        let (_dir, log) = open_log();
        let a = TaskRecord::new("a", at("2024-05-01T10:00:00+00:00"));
        let b = TaskRecord::new("b", at("2024-05-01T10:01:00+00:00"));

        assert_eq!(log.append_blocking(&[a.clone(), b.clone()]).unwrap(), 2);

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(&a.id().to_string()));
        assert!(lines[1].contains(&b.id().to_string()));
    }

    #[test]
    fn test_garbage_line_is_skipped() {
        let (_dir, log) = open_log();
        let good = TaskRecord::new("keep me", at("2024-05-01T10:00:00+00:00"));
        log.append_blocking(&[good.clone()]).unwrap();

        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        file.write_all(b"{\"id\":\"not-a-uuid\",\"tit\n").unwrap();
        file.write_all(&[0xff, 0xfe, b'\n']).unwrap();
        file.write_all(b"\n   \n").unwrap();

        assert_eq!(log.load_blocking().unwrap(), vec![good]);
    }

    #[test]
    fn test_nil_id_and_blank_title_are_skipped() {
        let (_dir, log) = open_log();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log.path())
            .unwrap();
        writeln!(
            file,
            r#"{{"id":"00000000-0000-0000-0000-000000000000","title":"nil","createdAt":"2024-05-01T10:00:00+00:00"}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"id":"6f1c1d1e-8a57-4c44-9d7e-0b8b6a0f4b11","title":"   ","createdAt":"2024-05-01T10:00:00+00:00"}}"#
        )
        .unwrap();

        assert!(log.load_blocking().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_records_are_not_written() {
        let (_dir, log) = open_log();
        let nil = TaskRecord::with_id(Uuid::nil(), "nil", at("2024-05-01T10:00:00+00:00"));

        assert_eq!(log.append_blocking(&[nil]).unwrap(), 0);
        assert!(!log.path().exists());
    }

    #[test]
    fn test_later_line_wins_and_newest_first() {
        let (_dir, log) = open_log();
        let old = TaskRecord::new("old", at("2024-05-01T09:00:00+00:00"));
        let first = TaskRecord::new("first", at("2024-05-01T10:00:00+00:00"));
        let rewritten = TaskRecord::with_id(first.id(), "rewritten", first.created_at());
        let new = TaskRecord::new("new", at("2024-05-01T11:00:00+00:00"));

        log.append_blocking(&[old.clone(), first]).unwrap();
        log.append_blocking(&[new.clone(), rewritten.clone()]).unwrap();

        assert_eq!(log.load_blocking().unwrap(), vec![new, rewritten, old]);
    }

    #[test]
    fn test_equal_timestamps_later_line_first() {
        let (_dir, log) = open_log();
        let ts = at("2024-05-01T10:00:00+00:00");
        let a = TaskRecord::new("a", ts);
        let b = TaskRecord::new("b", ts);
        let c = TaskRecord::new("c", ts);

        log.append_blocking(&[a.clone(), b.clone()]).unwrap();
        log.append_blocking(&[c.clone()]).unwrap();

        assert_eq!(log.load_blocking().unwrap(), vec![c, b, a]);
    }

    #[test]
    fn test_parse_line_reports_line_number() {
        let err = parse_line(7, b"nope").unwrap_err();
        assert!(matches!(err, WaterflowError::CorruptRecord { line: 7, .. }));
    }
}
