//! The batch type handed to consumers, and line splitting of raw reads.

use std::path::{Path, PathBuf};
use std::slice::Iter;

/// Batch of lines captured from the watched file in a single delivery.
///
/// Carries the source path alongside the lines so a caller wiring several
/// tailers into one sink can tell them apart.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct LineSet {
    /// The path from where the lines were read.
    source: PathBuf,
    /// The lines, in file order, without line terminators.
    lines: Vec<String>,
}

impl LineSet {
    pub(crate) fn new(source: impl Into<PathBuf>, lines: Vec<String>) -> Self {
        LineSet {
            source: source.into(),
            lines,
        }
    }

    /// Returns a reference to the file from where the lines were read.
    pub fn source(&self) -> &Path {
        self.source.as_path()
    }

    /// Returns a slice to the vec of lines.
    pub fn lines(&self) -> &[String] {
        self.lines.as_slice()
    }

    /// Returns an iterator over the slice of lines.
    pub fn iter(&self) -> Iter<'_, String> {
        self.lines().iter()
    }

    /// Returns the number of lines in the set.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` if the number of lines in the set is zero.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the source path and lines that make up a `LineSet`.
    pub fn into_inner(self) -> (PathBuf, Vec<String>) {
        let LineSet { source, lines } = self;

        (source, lines)
    }
}

impl IntoIterator for LineSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}

impl<'a> IntoIterator for &'a LineSet {
    type Item = &'a String;
    type IntoIter = Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Converts one raw line (terminator already removed) to text, dropping a
/// trailing `\r` and replacing invalid UTF-8.
pub(crate) fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

    String::from_utf8_lossy(raw).into_owned()
}

/// Splits `buf` on `\n`, pushing every complete line onto `out`.
///
/// Returns the unterminated remainder, which is empty if `buf` ends with a
/// newline.
pub(crate) fn split_complete<'a>(buf: &'a [u8], out: &mut Vec<String>) -> &'a [u8] {
    let mut rest = buf;

    while let Some(idx) = rest.iter().position(|&b| b == b'\n') {
        out.push(decode_line(&rest[..idx]));
        rest = &rest[idx + 1..];
    }

    rest
}
