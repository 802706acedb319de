//! Task creation and the in-memory task list

pub mod dispatcher;
pub mod mirror;
pub mod record;

pub use dispatcher::TaskDispatcher;
pub use mirror::{MirrorEvent, TaskMirror};
pub use record::{normalize_title, TaskRecord, MAX_TITLE_CHARS};
