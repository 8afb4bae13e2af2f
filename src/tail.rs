//! Bounded backward scan for the last lines of a file.

use std::io::{self, Read, Seek, SeekFrom};

use crate::lines::split_complete;

/// Number of bytes stepped backward per scan round.
pub const BLOCK_SIZE: u64 = 1024;

/// Upper bound on scan rounds, so a file made of one huge line can't make the
/// scan read the whole file.
pub const MAX_TAIL_BLOCKS: u64 = 64 * 1024;

/// Reads the last `n` lines of `reader`.
///
/// Returns the last `n` complete lines (fewer if the file is shorter, or if
/// [`MAX_TAIL_BLOCKS`] were scanned without finding enough line breaks),
/// together with the offset to resume reading from. That offset is just past
/// the last line break, so an unterminated final line is left to be read, and
/// completed, later. If `n` is 0, or the scan gave up before finding any line
/// break, it is the end-of-file offset instead.
///
/// The reader's position is unspecified afterwards; callers should seek to
/// the returned offset before reading on.
pub fn read_last_lines<R: Read + Seek>(reader: &mut R, n: usize) -> io::Result<(Vec<String>, u64)> {
    let end = reader.seek(SeekFrom::End(0))?;

    if n == 0 || end == 0 {
        return Ok((Vec::new(), end));
    }

    let mut offset = end;
    let mut tail: Vec<u8> = Vec::new();
    let mut newlines = 0usize;
    let mut blocks = 0u64;

    loop {
        let step = BLOCK_SIZE.min(offset);
        offset -= step;
        blocks += 1;

        let mut block = vec![0u8; step as usize];
        reader.seek(SeekFrom::Start(offset))?;
        reader.read_exact(&mut block)?;

        newlines += block.iter().filter(|&&b| b == b'\n').count();
        block.extend_from_slice(&tail);
        tail = block;

        if offset == 0 || blocks >= MAX_TAIL_BLOCKS {
            break;
        }

        // The first line of the window may be cut short, so only lines after
        // the first break count.
        if newlines > n {
            break;
        }
    }

    let body = if offset == 0 {
        &tail[..]
    } else {
        match tail.iter().position(|&b| b == b'\n') {
            Some(idx) => &tail[idx + 1..],
            None => &[][..],
        }
    };

    let mut lines = Vec::new();
    let unterminated = split_complete(body, &mut lines).len() as u64;

    let skip = lines.len().saturating_sub(n);
    lines.drain(..skip);

    Ok((lines, end - unterminated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn numbered(count: usize) -> String {
        (0..count).map(|i| format!("line {}\n", i)).collect()
    }

    fn last_lines(content: &str, n: usize) -> Vec<String> {
        let mut cursor = Cursor::new(content.as_bytes().to_vec());
        let (lines, resume) = read_last_lines(&mut cursor, n).unwrap();
        if content.ends_with('\n') || n == 0 {
            assert_eq!(resume, content.len() as u64);
        }
        lines
    }

    fn resume_offset(content: &str, n: usize) -> u64 {
        let mut cursor = Cursor::new(content.as_bytes().to_vec());
        read_last_lines(&mut cursor, n).unwrap().1
    }

    #[test]
    fn test_zero_lines_requested() {
        assert!(last_lines("foo\nbar\n", 0).is_empty());
    }

    #[test]
    fn test_empty_file() {
        assert!(last_lines("", 10).is_empty());
    }

    #[test]
    fn test_fewer_lines_than_requested() {
        assert_eq!(last_lines("foo\nbar\n", 5), vec!["foo", "bar"]);
    }

    #[test]
    fn test_exact_count() {
        assert_eq!(last_lines("foo\nbar\nbaz\n", 3), vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn test_last_n_of_many_blocks() {
        let content = numbered(5000);
        assert!(content.len() as u64 > 10 * BLOCK_SIZE);

        let expected: Vec<String> = (4990..5000).map(|i| format!("line {}", i)).collect();
        assert_eq!(last_lines(&content, 10), expected);
    }

    #[test]
    fn test_block_boundary_does_not_leak_partial_line() {
        // Lines long enough that a block boundary falls mid-line.
        let line = "x".repeat(700);
        let content = format!("first{}\n{}\n{}\n", line, line, line);

        assert_eq!(last_lines(&content, 2), vec![line.clone(), line]);
    }

    #[test]
    fn test_unterminated_last_line_left_for_later() {
        let content = "foo\nbar\nba";

        assert_eq!(last_lines(content, 2), vec!["foo", "bar"]);
        assert_eq!(resume_offset(content, 2), 8);
    }

    #[test]
    fn test_unterminated_last_line_across_blocks() {
        let content = format!("{}{}", numbered(500), "z".repeat(2 * BLOCK_SIZE as usize));

        assert_eq!(last_lines(&content, 1), vec!["line 499"]);
        assert_eq!(resume_offset(&content, 1), numbered(500).len() as u64);
    }

    #[test]
    fn test_single_huge_line() {
        let content = "y".repeat(3 * BLOCK_SIZE as usize + 17);

        assert!(last_lines(&content, 3).is_empty());
        assert_eq!(resume_offset(&content, 3), 0);
    }

    #[test]
    fn test_crlf_stripped() {
        assert_eq!(last_lines("foo\r\nbar\r\n", 1), vec!["bar"]);
    }
}
