//! Everything related to following a single file across rotations.

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::config::TailConfig;
use crate::error::{Error, Result};
use crate::identity::{self, FileId};
use crate::lines::{decode_line, split_complete, LineSet};
use crate::observer::{TracingObserver, WatchObserver};
use crate::tail;

/// The open file, and how far into it we've read.
struct WatchedFile {
    id: FileId,
    path: PathBuf,
    handle: File,
    position: u64,
    /// Bytes of an unterminated last line, held until its newline shows up.
    pending: Vec<u8>,
}

impl WatchedFile {
    /// Opens `path` for reading from its beginning. `Ok(None)` means there's
    /// nothing at `path` right now.
    fn open(path: &Path) -> Result<Option<Self>> {
        let handle = match File::open(path) {
            Ok(handle) => handle,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if !handle.metadata()?.is_file() {
            return Err(Error::NotAFile(path.to_path_buf()));
        }

        Ok(Some(WatchedFile {
            id: FileId::from_file(&handle)?,
            path: path.to_path_buf(),
            handle,
            position: 0,
            pending: Vec::new(),
        }))
    }

    /// Reads everything past `position`, pushing completed lines onto `out`.
    fn read_new(&mut self, out: &mut Vec<String>) -> io::Result<()> {
        let mut buf = std::mem::take(&mut self.pending);

        let read = self.handle.read_to_end(&mut buf)?;
        self.position += read as u64;

        if read > 0 {
            tracing::trace!(path = %self.path.display(), bytes = read, "read");
        }

        let rest = split_complete(&buf, out).to_vec();
        self.pending = rest;

        Ok(())
    }

    /// Reads whatever is left, including an unterminated last line.
    fn drain(&mut self) -> io::Result<Vec<String>> {
        let mut lines = Vec::new();
        self.read_new(&mut lines)?;

        if !self.pending.is_empty() {
            lines.push(decode_line(&self.pending));
            self.pending.clear();
        }

        Ok(lines)
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.handle.seek(SeekFrom::Start(0))?;
        self.position = 0;
        self.pending.clear();

        Ok(())
    }
}

enum WatchState {
    Unwatched,
    Watching(WatchedFile),
}

/// Follows one log file by path, delivering appended lines and re-opening the
/// path when the file behind it is rotated.
///
/// `FileTailer` does no scheduling of its own: call [`update`] (or [`poll`])
/// periodically, or let [`TailedLines`] do it on a timer.
///
/// ## Rotation
///
/// Each cycle re-stats the watched path and compares the [`FileId`] found
/// there with the one of the open handle:
///
///   * path gone: whatever is left in the old handle is delivered, the handle
///     is closed, and the tailer waits for the path to reappear.
///   * different file: same as above, then the new file is opened and read
///     from its beginning within the same cycle.
///   * same file, but shorter than what was read (copytruncate): reading
///     restarts at the beginning.
///
/// Watch state changes are reported to a [`WatchObserver`], by default
/// [`TracingObserver`].
///
/// [`update`]: FileTailer::update
/// [`poll`]: FileTailer::poll
/// [`TailedLines`]: crate::TailedLines
pub struct FileTailer {
    path: PathBuf,
    state: WatchState,
    backlog: Option<Vec<String>>,
    observer: Box<dyn WatchObserver>,
}

impl FileTailer {
    /// Starts tailing `path` from its current end.
    ///
    /// Fails with [`Error::NotFound`] if nothing exists at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_tail(path, 0)
    }

    /// Starts tailing `path` from its current end, but first captures its last
    /// `tail_lines` lines, which the first [`update`](FileTailer::update)
    /// delivers ahead of anything else.
    ///
    /// An unterminated last line isn't part of that backlog; reading resumes
    /// at its start, so it is delivered whole once its newline is written.
    pub fn with_tail(path: impl Into<PathBuf>, tail_lines: usize) -> Result<Self> {
        Self::from_config(&TailConfig::new(path).with_tail_lines(tail_lines))
    }

    pub fn from_config(config: &TailConfig) -> Result<Self> {
        Self::from_config_with_observer(config, TracingObserver)
    }

    pub fn from_config_with_observer(
        config: &TailConfig,
        observer: impl WatchObserver + 'static,
    ) -> Result<Self> {
        config.validate()?;

        let path = config.path.canonicalize().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(config.path.clone()),
            _ => Error::Io(e),
        })?;

        let mut watched =
            WatchedFile::open(&path)?.ok_or_else(|| Error::NotFound(config.path.clone()))?;

        let (backlog, resume) = tail::read_last_lines(&mut watched.handle, config.tail_lines)?;
        watched.handle.seek(SeekFrom::Start(resume))?;
        watched.position = resume;

        let mut tailer = FileTailer {
            path,
            state: WatchState::Unwatched,
            backlog: Some(backlog),
            observer: Box::new(observer),
        };
        tailer.observer.watching(&watched.path, watched.id);
        tailer.state = WatchState::Watching(watched);

        Ok(tailer)
    }

    /// The canonicalized path being followed.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Returns `true` if a file is currently open.
    pub fn is_watching(&self) -> bool {
        matches!(self.state, WatchState::Watching(_))
    }

    /// Identity of the currently open file, if any.
    pub fn identity(&self) -> Option<FileId> {
        match &self.state {
            WatchState::Watching(watched) => Some(watched.id),
            WatchState::Unwatched => None,
        }
    }

    /// Number of bytes consumed from the currently open file, if any.
    pub fn position(&self) -> Option<u64> {
        match &self.state {
            WatchState::Watching(watched) => Some(watched.position),
            WatchState::Unwatched => None,
        }
    }

    /// Runs one poll cycle, handing each non-empty batch of lines to `deliver`.
    ///
    /// A cycle can deliver up to three batches, in order: the startup backlog
    /// (first cycle only), the remains of a file that was just rotated away,
    /// and the newly appended lines.
    ///
    /// Returns an error for any I/O failure other than the file being absent;
    /// the tailer should then be considered dead.
    pub fn update<F>(&mut self, mut deliver: F) -> Result<()>
    where
        F: FnMut(LineSet),
    {
        if let Some(backlog) = self.backlog.take() {
            if !backlog.is_empty() {
                deliver(LineSet::new(self.path.clone(), backlog));
            }
        }

        self.refresh(&mut deliver)?;

        if let WatchState::Watching(watched) = &mut self.state {
            let mut lines = Vec::new();
            watched.read_new(&mut lines)?;

            if !lines.is_empty() {
                tracing::debug!(path = %watched.path.display(), count = lines.len(), "new lines");
                deliver(LineSet::new(watched.path.clone(), lines));
            }
        }

        Ok(())
    }

    /// Runs one poll cycle and returns the delivered batches.
    pub fn poll(&mut self) -> Result<Vec<LineSet>> {
        let mut sets = Vec::new();
        self.update(|set| sets.push(set))?;

        Ok(sets)
    }

    /// Stops watching, releasing the file handle.
    pub fn close(mut self) {
        if let WatchState::Watching(watched) =
            std::mem::replace(&mut self.state, WatchState::Unwatched)
        {
            self.observer.unwatching(&watched.path, watched.id);
        }
    }

    /// Brings the watch state in line with what's on disk.
    fn refresh<F>(&mut self, deliver: &mut F) -> Result<()>
    where
        F: FnMut(LineSet),
    {
        let watched = match &mut self.state {
            WatchState::Watching(watched) => watched,
            WatchState::Unwatched => return self.try_watch(),
        };

        match identity::stat(&watched.path) {
            Ok((id, metadata)) if id == watched.id => {
                if metadata.len() < watched.position {
                    watched.rewind()?;
                    self.observer.truncated(&watched.path, watched.id);
                }
                Ok(())
            }
            Ok((id, _)) => {
                tracing::debug!(path = %self.path.display(), old = %watched.id, new = %id, "rotated");
                self.release(deliver);
                self.try_watch()
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.release(deliver);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Opens the configured path if something is there now.
    fn try_watch(&mut self) -> Result<()> {
        if let Some(watched) = WatchedFile::open(&self.path)? {
            self.observer.watching(&watched.path, watched.id);
            self.state = WatchState::Watching(watched);
        }

        Ok(())
    }

    /// Drains and closes the open file. Drain failures are only logged: the
    /// file may already be gone.
    fn release<F>(&mut self, deliver: &mut F)
    where
        F: FnMut(LineSet),
    {
        let mut watched = match std::mem::replace(&mut self.state, WatchState::Unwatched) {
            WatchState::Watching(watched) => watched,
            WatchState::Unwatched => return,
        };

        match watched.drain() {
            Ok(lines) if !lines.is_empty() => {
                deliver(LineSet::new(watched.path.clone(), lines));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %watched.path.display(), error = %e, "failed to drain rotated logfile");
            }
        }

        let WatchedFile { id, path, handle, .. } = watched;
        drop(handle);

        self.observer.unwatching(&path, id);
    }
}

impl fmt::Debug for FileTailer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FileTailer")
            .field("path", &self.path)
            .field("identity", &self.identity())
            .field("position", &self.position())
            .finish()
    }
}
