//! Timer-driven `Stream` wrapper around [`FileTailer`].

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task;
use std::time::Duration;

use futures_util::ready;
use futures_util::stream::Stream as FuturesStream;
use pin_project_lite::pin_project;
use tokio::time::{sleep_until, Instant, Sleep};

use crate::config::TailConfig;
use crate::error::{Error, Result};
use crate::lines::LineSet;
use crate::tailer::FileTailer;

pin_project! {
/// Polls a [`FileTailer`] on a fixed interval, and can be polled to receive
/// new lines.
///
/// ## Streaming lines
///
/// `TailedLines` implements [`futures::Stream`] which internally:
///   1. Waits for the next poll deadline (the first one is immediate).
///   2. Runs [`FileTailer::update`], queueing every batch it delivers.
///   3. Returns a `Poll::Ready` for each queued [`LineSet`].
///
/// A fatal error from the tailer is yielded once, after any lines read in the
/// same cycle, and then the stream ends.
///
/// [`futures::Stream`]: https://docs.rs/futures/0.3/futures/stream/trait.Stream.html
pub struct TailedLines {
    #[pin]
    sleep: Sleep,
    period: Duration,
    tailer: Option<FileTailer>,
    ready: VecDeque<LineSet>,
    failed: Option<Error>,
}
}

impl TailedLines {
    /// Polls `tailer` every `period`, starting immediately.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime, or if the runtime was
    /// built without the time driver enabled.
    pub fn new(tailer: FileTailer, period: Duration) -> Self {
        TailedLines {
            sleep: sleep_until(Instant::now()),
            period,
            tailer: Some(tailer),
            ready: VecDeque::new(),
            failed: None,
        }
    }

    /// Builds the tailer from `config` and polls it every
    /// `config.poll_interval()`.
    ///
    /// # Panics
    ///
    /// Same as [`TailedLines::new`].
    pub fn from_config(config: &TailConfig) -> Result<Self> {
        Ok(Self::new(FileTailer::from_config(config)?, config.poll_interval()))
    }

    /// The underlying tailer, unless it has failed.
    pub fn tailer(&self) -> Option<&FileTailer> {
        self.tailer.as_ref()
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl fmt::Debug for TailedLines {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TailedLines")
            .field("period", &self.period)
            .field("tailer", &self.tailer)
            .field("ready", &self.ready.len())
            .field("failed", &self.failed)
            .finish()
    }
}

impl FuturesStream for TailedLines {
    type Item = Result<LineSet>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> task::Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(lineset) = this.ready.pop_front() {
                return task::Poll::Ready(Some(Ok(lineset)));
            }

            if let Some(e) = this.failed.take() {
                return task::Poll::Ready(Some(Err(e)));
            }

            let tailer = match this.tailer.as_mut() {
                Some(tailer) => tailer,
                None => return task::Poll::Ready(None),
            };

            ready!(this.sleep.as_mut().poll(cx));
            this.sleep.as_mut().reset(Instant::now() + *this.period);

            let ready = &mut *this.ready;
            if let Err(e) = tailer.update(|lineset| ready.push_back(lineset)) {
                tracing::error!(error = %e, "tailer failed, ending stream");
                *this.tailer = None;
                *this.failed = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream::StreamExt;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::tempdir;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_stream_yields_backlog_then_appends() {
        let tmp_dir = tempdir().unwrap();
        let path = tmp_dir.path().join("stream.log");
        std::fs::write(&path, "a\nb\nc\n").unwrap();

        let config = TailConfig::new(&path)
            .with_tail_lines(2)
            .with_poll_interval(Duration::from_millis(10));
        let lines = TailedLines::from_config(&config).unwrap();
        tokio::pin!(lines);

        let backlog = timeout(Duration::from_secs(1), lines.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(backlog.lines(), &["b", "c"]);

        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"d\n").unwrap();
        drop(f);

        let lineset = timeout(Duration::from_secs(1), lines.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(lineset.lines(), &["d"]);
        assert!(lines.tailer().unwrap().is_watching());
    }

    #[tokio::test]
    async fn test_stream_idle_without_appends() {
        let tmp_dir = tempdir().unwrap();
        let path = tmp_dir.path().join("idle.log");
        std::fs::write(&path, "old\n").unwrap();

        let tailer = FileTailer::new(&path).unwrap();
        let lines = TailedLines::new(tailer, Duration::from_millis(10));
        tokio::pin!(lines);

        assert!(timeout(Duration::from_millis(100), lines.next()).await.is_err());
    }

    #[tokio::test]
    async fn test_stream_error_follows_drained_lines() {
        let tmp_dir = tempdir().unwrap();
        let path = tmp_dir.path().join("a.log");
        std::fs::write(&path, "").unwrap();

        let tailer = FileTailer::new(&path).unwrap();
        let lines = TailedLines::new(tailer, Duration::from_millis(10));
        tokio::pin!(lines);

        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(b"last\n").unwrap();
        drop(f);
        std::fs::rename(&path, tmp_dir.path().join("a.log.1")).unwrap();
        std::fs::create_dir(&path).unwrap();

        let items: Vec<_> = timeout(Duration::from_secs(1), lines.as_mut().collect::<Vec<_>>())
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().lines(), &["last"]);
        assert!(matches!(items[1], Err(Error::NotAFile(_))));
        assert!(lines.tailer().is_none());
    }
}
