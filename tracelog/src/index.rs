//! Byte-offset time index over a sorted trace file.
//!
//! Trace files are sorted non-decreasing by timestamp, so a window query
//! never needs to scan from the top: a binary search over byte offsets
//! finds the first line of the window in `O(log(file_size))` probes, each
//! probe costing one seek and one line read.

use crate::error::{Result, TraceError};
use crate::parse;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locates timestamps inside a single sorted trace file.
#[derive(Debug, Clone)]
pub struct TimeIndex {
    path: PathBuf,
}

impl TimeIndex {
    pub fn new(path: impl Into<PathBuf>) -> TimeIndex {
        TimeIndex { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File> {
        File::open(&self.path).map_err(|source| TraceError::FileOpen {
            path: self.path.clone(),
            source,
        })
    }

    /// Timestamp of the first line. `NoData` when the file is empty.
    pub fn first_time(&self) -> Result<i64> {
        let mut reader = BufReader::new(self.open()?);
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(TraceError::NoData);
        }
        parse::timestamp_of_line(line.trim_end())
    }

    /// Timestamp of the last full line, found by scanning backward from the
    /// end of the file. `NoData` when the file holds no content.
    pub fn last_time(&self) -> Result<i64> {
        let mut file = self.open()?;
        let len = file.seek(SeekFrom::End(0))?;
        if len == 0 {
            return Err(TraceError::NoData);
        }

        let start = start_of_last_line(&mut file, len)?;
        file.seek(SeekFrom::Start(start))?;

        let mut line = String::new();
        BufReader::new(file).read_line(&mut line)?;
        parse::timestamp_of_line(line.trim_end())
    }

    /// Byte offset of the first line whose timestamp is `>= target`; when
    /// every line is earlier than `target`, the offset of the last line.
    ///
    /// Streaming from the returned offset therefore yields every record
    /// with timestamp at or after `target` and at most a handful of
    /// earlier ones for the caller to skip. An empty file locates to 0.
    pub fn locate(&self, target: i64) -> Result<u64> {
        let mut reader = BufReader::new(self.open()?);
        let len = reader.seek(SeekFrom::End(0))?;

        let mut left: i64 = 0;
        let mut right: i64 = len as i64;
        let mut below: Option<u64> = None;
        let mut at_or_above: Option<u64> = None;
        let mut skipped = Vec::new();
        let mut line = String::new();

        while left <= right {
            let mid = left + (right - left) / 2;
            reader.seek(SeekFrom::Start(mid as u64))?;

            // A probe usually lands mid-line; drop the partial line and
            // work with the next full one.
            if mid > 0 {
                skipped.clear();
                reader.read_until(b'\n', &mut skipped)?;
            }

            let line_start = reader.stream_position()?;
            line.clear();
            if reader.read_line(&mut line)? == 0 || line.trim_end().is_empty() {
                break;
            }

            let probed = parse::timestamp_of_line(line.trim_end())?;
            match probed.cmp(&target) {
                Ordering::Less => {
                    below = Some(line_start);
                    left = mid + 1;
                }
                // Keep moving left on an exact hit so that runs of equal
                // timestamps stream from their first record.
                Ordering::Equal | Ordering::Greater => {
                    at_or_above = Some(line_start);
                    right = mid - 1;
                }
            }
        }

        let offset = at_or_above.or(below).unwrap_or(0);
        debug!(target_time = target, offset, "time index probe finished");
        Ok(offset)
    }
}

/// Starting offset of the last non-empty line, ignoring trailing newlines.
fn start_of_last_line(file: &mut File, len: u64) -> Result<u64> {
    let mut buf = [0u8; 4096];

    // Step over any newline bytes at the very end of the file.
    let mut end = len;
    'trim: while end > 0 {
        let take = end.min(buf.len() as u64) as usize;
        file.seek(SeekFrom::Start(end - take as u64))?;
        file.read_exact(&mut buf[..take])?;
        for &byte in buf[..take].iter().rev() {
            if byte == b'\n' {
                end -= 1;
            } else {
                break 'trim;
            }
        }
    }
    if end == 0 {
        return Err(TraceError::NoData);
    }

    // Walk backward to the newline that precedes the last line.
    let mut pos = end;
    while pos > 0 {
        let take = pos.min(buf.len() as u64) as usize;
        file.seek(SeekFrom::Start(pos - take as u64))?;
        file.read_exact(&mut buf[..take])?;
        for (i, &byte) in buf[..take].iter().enumerate().rev() {
            if byte == b'\n' {
                return Ok(pos - take as u64 + i as u64 + 1);
            }
        }
        pos -= take as u64;
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture(timestamps: &[f64]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        for (i, ts) in timestamps.iter().enumerate() {
            writeln!(
                file,
                "timestamp:{ts:.6},cluster_id:chip:0;die:0;quad:0;row:0;col:0,area:bmt,unit:eq,in/out:in,tid:{i},packet/data:d{i}"
            )
            .expect("write line");
        }
        file.flush().expect("flush");
        file
    }

    fn read_timestamp_at(path: &Path, offset: u64) -> i64 {
        let mut reader = BufReader::new(File::open(path).unwrap());
        reader.seek(SeekFrom::Start(offset)).unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        parse::timestamp_of_line(line.trim_end()).unwrap()
    }

    #[test]
    fn first_and_last_time() {
        let file = fixture(&[100.5, 200.5, 300.5, 400.5]);
        let index = TimeIndex::new(file.path());

        assert_eq!(index.first_time().unwrap(), 100);
        assert_eq!(index.last_time().unwrap(), 400);
    }

    #[test]
    fn single_line_file_has_equal_first_and_last() {
        let file = fixture(&[123.456]);
        let index = TimeIndex::new(file.path());

        assert_eq!(index.first_time().unwrap(), 123);
        assert_eq!(index.last_time().unwrap(), 123);
    }

    #[test]
    fn empty_file_reports_no_data() {
        let file = fixture(&[]);
        let index = TimeIndex::new(file.path());

        assert!(matches!(index.first_time(), Err(TraceError::NoData)));
        assert!(matches!(index.last_time(), Err(TraceError::NoData)));
        assert_eq!(index.locate(100).unwrap(), 0);
    }

    #[test]
    fn locate_finds_exact_timestamps() {
        let stamps: Vec<f64> = (0..200).map(|i| 1000.0 + i as f64 * 10.0).collect();
        let file = fixture(&stamps);
        let index = TimeIndex::new(file.path());

        for target in [1000, 1500, 1990, 2990] {
            let offset = index.locate(target).unwrap();
            assert_eq!(read_timestamp_at(file.path(), offset), target);
        }
    }

    #[test]
    fn locate_lands_on_the_next_later_line_between_timestamps() {
        let file = fixture(&[100.0, 200.0, 300.0, 400.0]);
        let index = TimeIndex::new(file.path());

        let offset = index.locate(150).unwrap();
        assert_eq!(read_timestamp_at(file.path(), offset), 200);

        let offset = index.locate(0).unwrap();
        assert_eq!(read_timestamp_at(file.path(), offset), 100);
    }

    #[test]
    fn locate_past_the_end_degrades_to_the_last_line() {
        let file = fixture(&[100.0, 200.0, 300.0]);
        let index = TimeIndex::new(file.path());

        let offset = index.locate(9999).unwrap();
        assert_eq!(read_timestamp_at(file.path(), offset), 300);
    }

    #[test]
    fn locate_finds_the_first_of_equal_timestamps() {
        let mut stamps: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        stamps.extend([200.0; 20]);
        stamps.extend((0..50).map(|i| 300.0 + i as f64));
        let file = fixture(&stamps);
        let index = TimeIndex::new(file.path());

        let offset = index.locate(200).unwrap();
        assert_eq!(read_timestamp_at(file.path(), offset), 200);

        // The run of equal stamps starts right after the 50 earlier lines;
        // every record of the run must stream from the located offset.
        let mut reader = BufReader::new(File::open(file.path()).unwrap());
        reader.seek(SeekFrom::Start(offset)).unwrap();
        let run = reader
            .lines()
            .map_while(|l| parse::timestamp_of_line(&l.unwrap()).ok())
            .take_while(|&ts| ts == 200)
            .count();
        assert_eq!(run, 20);
    }

    #[test]
    fn malformed_probe_line_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not a trace line").unwrap();
        file.flush().unwrap();

        let index = TimeIndex::new(file.path());
        assert!(matches!(
            index.first_time(),
            Err(TraceError::InvalidFormat { .. })
        ));
    }
}
