//! A library for following a single (namely log) file by name, surviving
//! rotation, plus a parser for nginx access-log lines.
//!
//! [`FileTailer`] is poll-driven: each call to [`FileTailer::update`] re-stats
//! the watched path, notices if the file behind it was renamed away, removed,
//! replaced, or truncated, and hands over whatever lines were appended since
//! the last call. With the `tokio` feature (on by default), [`TailedLines`]
//! drives a tailer on an interval and exposes it as a `Stream`.
//!
//! ## Example
//!
//! ```no_run
//! use logwatch::{parse_line, FileTailer};
//! use std::time::Duration;
//!
//! fn main() -> logwatch::Result<()> {
//!     // Also deliver the last 10 lines already in the file.
//!     let mut tailer = FileTailer::with_tail("/var/log/nginx/access.log", 10)?;
//!
//!     loop {
//!         tailer.update(|lineset| {
//!             for line in lineset.iter() {
//!                 match parse_line(line) {
//!                     Some(record) => println!("{} {}", record.status, record.request),
//!                     None => eprintln!("unparsed: {}", line),
//!                 }
//!             }
//!         })?;
//!
//!         std::thread::sleep(Duration::from_secs(1));
//!     }
//! }
//! ```
//!
//! ## Caveats
//!
//! Lines are delivered once their terminating newline has been written; a
//! trailing fragment is only delivered early when its file is rotated away.
//! Nothing is persisted, so lines written while the process isn't running
//! are not recovered on restart.

mod config;
mod error;
mod identity;
mod lines;
mod observer;
mod parser;
#[cfg(feature = "tokio")]
mod stream;
mod tail;
mod tailer;

pub use config::TailConfig;
pub use error::{Error, Result};
pub use identity::FileId;
pub use lines::LineSet;
pub use observer::{NoopObserver, TracingObserver, WatchObserver};
pub use parser::{parse_line, AccessLogParser, ParsedRecord, ACCESS_LOG_PATTERN, FIELD_NAMES};
#[cfg(feature = "tokio")]
pub use stream::TailedLines;
pub use tail::{read_last_lines, BLOCK_SIZE, MAX_TAIL_BLOCKS};
pub use tailer::FileTailer;

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
