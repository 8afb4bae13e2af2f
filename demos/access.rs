//! Tails an nginx access log and prints each parsed record as JSON.
//!
//! Usage:
//!     access /path/to/access.log [poll_interval_ms]
//!
//! Drives `FileTailer` from a plain loop, without an async runtime.

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use logwatch::{AccessLogParser, FileTailer};

pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: access <path> [poll_interval_ms]")?;
    let interval = args.next().map(|n| n.parse()).transpose()?.unwrap_or(1000);

    let parser = AccessLogParser::new();
    let mut tailer = FileTailer::new(path)?;

    loop {
        tailer.update(|lineset| {
            for line in lineset.iter() {
                match parser.parse(line) {
                    Some(record) => match serde_json::to_string(&record) {
                        Ok(json) => println!("{}", json),
                        Err(e) => tracing::warn!(error = %e, "failed to serialize record"),
                    },
                    None => tracing::warn!(line = %line, "line did not match access log format"),
                }
            }
        })?;

        std::thread::sleep(Duration::from_millis(interval));
    }
}
