//! Read the last N lines of a file without scanning it from the front.
//!
//! Chunks are read backward from the end of the file until enough line
//! breaks have been seen, so large files never get loaded whole.

use memchr::memrchr;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Backward read granularity
const CHUNK_SIZE: u64 = 8192;

/// Return the last `count` complete lines of `path`, oldest first.
///
/// Files with fewer than `count` lines return all of their lines. An empty
/// file returns an empty vec. Trailing newline/whitespace artifacts are
/// trimmed before splitting, and CRLF endings are tolerated.
pub fn read_last_lines(path: &Path, count: usize) -> io::Result<Vec<String>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    if len == 0 || count == 0 {
        return Ok(Vec::new());
    }

    // Grow a suffix of the file backward until it spans enough lines
    let mut collected: Vec<u8> = Vec::new();
    let mut end = len;
    while end > 0 && !spans_enough_lines(&collected, count) {
        let start = end.saturating_sub(CHUNK_SIZE);
        let mut chunk = vec![0u8; (end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&collected);
        collected = chunk;
        end = start;
    }

    let text = String::from_utf8_lossy(&collected);
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let lines: Vec<String> = trimmed
        .split('\n')
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect();

    // When the collected suffix starts mid-line, the partial first entry is
    // always part of the skipped excess.
    let skip = lines.len().saturating_sub(count);
    Ok(lines[skip..].to_vec())
}

/// True once `buf` contains at least `count` line breaks ahead of the
/// terminator of its final line.
fn spans_enough_lines(buf: &[u8], count: usize) -> bool {
    let mut end = buf.len();
    while end > 0 && (buf[end - 1] == b'\n' || buf[end - 1] == b'\r') {
        end -= 1;
    }

    let mut slice = &buf[..end];
    let mut seen = 0;
    while let Some(pos) = memrchr(b'\n', slice) {
        seen += 1;
        if seen >= count {
            return true;
        }
        slice = &slice[..pos];
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fewer_lines_than_requested() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "Line 1")?;
        writeln!(temp_file, "Line 2")?;
        writeln!(temp_file, "Line 3")?;
        temp_file.flush()?;

        let lines = read_last_lines(temp_file.path(), 20)?;
        assert_eq!(lines, vec!["Line 1", "Line 2", "Line 3"]);
        Ok(())
    }

    #[test]
    fn test_more_lines_than_requested() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        for i in 1..=10 {
            writeln!(temp_file, "Line {}", i)?;
        }
        temp_file.flush()?;

        let lines = read_last_lines(temp_file.path(), 3)?;
        assert_eq!(lines, vec!["Line 8", "Line 9", "Line 10"]);
        Ok(())
    }

    #[test]
    fn test_exact_line_count() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        for i in 1..=5 {
            writeln!(temp_file, "Line {}", i)?;
        }
        temp_file.flush()?;

        let lines = read_last_lines(temp_file.path(), 5)?;
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Line 1");
        assert_eq!(lines[4], "Line 5");
        Ok(())
    }

    #[test]
    fn test_empty_file() -> io::Result<()> {
        let temp_file = NamedTempFile::new()?;
        let lines = read_last_lines(temp_file.path(), 20)?;
        assert!(lines.is_empty());
        Ok(())
    }

    #[test]
    fn test_zero_count() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "Line 1")?;
        temp_file.flush()?;

        let lines = read_last_lines(temp_file.path(), 0)?;
        assert!(lines.is_empty());
        Ok(())
    }

    #[test]
    fn test_no_trailing_newline() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        write!(temp_file, "Line 1\nLine 2\nLine 3 no newline")?;
        temp_file.flush()?;

        let lines = read_last_lines(temp_file.path(), 2)?;
        assert_eq!(lines, vec!["Line 2", "Line 3 no newline"]);
        Ok(())
    }

    #[test]
    fn test_crlf_line_endings() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        temp_file.write_all(b"Unix line\nWindows line\r\nLast line\r\n")?;
        temp_file.flush()?;

        let lines = read_last_lines(temp_file.path(), 3)?;
        assert_eq!(lines, vec!["Unix line", "Windows line", "Last line"]);
        Ok(())
    }

    #[test]
    fn test_whitespace_only_file() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        write!(temp_file, "\n\n\n")?;
        temp_file.flush()?;

        let lines = read_last_lines(temp_file.path(), 5)?;
        assert!(lines.is_empty());
        Ok(())
    }

    #[test]
    fn test_nonexistent_file_is_an_error() {
        let result = read_last_lines(Path::new("/path/that/does/not/exist.log"), 20);
        assert!(result.is_err());
    }

    #[test]
    fn test_repeated_reads_are_identical() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        for i in 0..50 {
            writeln!(temp_file, "entry {}", i)?;
        }
        temp_file.flush()?;

        let first = read_last_lines(temp_file.path(), 10)?;
        let second = read_last_lines(temp_file.path(), 10)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_file_larger_than_chunk_size() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        // Well past CHUNK_SIZE so the backward scan crosses chunk boundaries
        for i in 0..2000 {
            writeln!(temp_file, "Line number {} with some padding text", i)?;
        }
        temp_file.flush()?;

        let lines = read_last_lines(temp_file.path(), 25)?;
        assert_eq!(lines.len(), 25);
        assert_eq!(lines[0], "Line number 1975 with some padding text");
        assert_eq!(lines[24], "Line number 1999 with some padding text");
        Ok(())
    }

    #[test]
    fn test_single_long_line_spanning_chunks() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        let long_line = "x".repeat(3 * CHUNK_SIZE as usize);
        writeln!(temp_file, "{}", long_line)?;
        temp_file.flush()?;

        let lines = read_last_lines(temp_file.path(), 5)?;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 3 * CHUNK_SIZE as usize);
        Ok(())
    }

    #[test]
    fn test_empty_lines_are_preserved() -> io::Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        write!(temp_file, "first\n\nthird\n")?;
        temp_file.flush()?;

        let lines = read_last_lines(temp_file.path(), 3)?;
        assert_eq!(lines, vec!["first", "", "third"]);
        Ok(())
    }
}
