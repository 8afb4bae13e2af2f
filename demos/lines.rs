//! Demonstrates the line stream for a given file.
//!
//! Usage:
//!     lines /path/to/file [tail_lines]
//!
//! The file must exist; rotate it, truncate it, or append to it to see the
//! tailer follow along. Set `RUST_LOG=logwatch=debug` for watch events.

use futures_util::stream::StreamExt;
use tracing_subscriber::EnvFilter;

use logwatch::{TailConfig, TailedLines};

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: lines <path> [tail_lines]")?;
    let tail_lines = args.next().map(|n| n.parse()).transpose()?.unwrap_or(0);

    let config = TailConfig::new(path).with_tail_lines(tail_lines);
    let lines = TailedLines::from_config(&config)?;
    tokio::pin!(lines);

    while let Some(lineset) = lines.next().await {
        let lineset = lineset?;
        let source = lineset.source().display();

        for line in lineset.iter() {
            println!("({}) {}", source, line);
        }
    }

    Ok(())
}
