//! Notifications for watch state changes.

use std::path::Path;

use crate::identity::FileId;

/// Receives the tailer's watch/unwatch notifications.
///
/// Rotation is not an error, so this is the only place it becomes visible to
/// the caller. All methods default to doing nothing.
pub trait WatchObserver: Send {
    /// A file was opened and is now being tailed.
    fn watching(&mut self, _path: &Path, _id: FileId) {}

    /// The watched file disappeared or was replaced, and its handle was closed.
    fn unwatching(&mut self, _path: &Path, _id: FileId) {}

    /// The watched file shrank in place, so reading restarts at its beginning.
    fn truncated(&mut self, _path: &Path, _id: FileId) {}
}

/// Default observer, logging each event through `tracing` at `INFO`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl WatchObserver for TracingObserver {
    fn watching(&mut self, path: &Path, id: FileId) {
        tracing::info!(path = %path.display(), id = %id, "watching logfile");
    }

    fn unwatching(&mut self, path: &Path, id: FileId) {
        tracing::info!(path = %path.display(), id = %id, "un-watching logfile");
    }

    fn truncated(&mut self, path: &Path, id: FileId) {
        tracing::info!(path = %path.display(), id = %id, "logfile truncated, rewinding");
    }
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl WatchObserver for NoopObserver {}
