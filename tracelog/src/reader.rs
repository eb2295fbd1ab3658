//! Lazy record streaming within a time window.

use crate::error::{Result, TraceError};
use crate::index::TimeIndex;
use crate::model::Record;
use crate::parse;
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Streams records from a sorted trace file, bounded by a closed time
/// window `[start_time, end_time]`.
///
/// Opening a reader probes the file for its first and last timestamps and
/// uses them as the initial window, so an unconstrained reader streams the
/// whole file. The window can then be narrowed with [`set_start`] and
/// [`set_end`].
///
/// [`set_start`]: LogReader::set_start
/// [`set_end`]: LogReader::set_end
#[derive(Debug, Clone)]
pub struct LogReader {
    path: PathBuf,
    index: TimeIndex,
    start_time: i64,
    end_time: i64,
}

impl LogReader {
    /// Opens a reader over `path` with the file's full time span as the
    /// window. An empty file yields an empty window that streams nothing.
    pub fn open(path: impl Into<PathBuf>) -> Result<LogReader> {
        let path = path.into();
        let index = TimeIndex::new(&path);

        let (start_time, end_time) = match index.first_time() {
            Ok(first) => (first, index.last_time()?),
            // No content yet: an inverted window streams nothing.
            Err(TraceError::NoData) => (0, -1),
            Err(e) => return Err(e),
        };

        Ok(LogReader {
            path,
            index,
            start_time,
            end_time,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    pub fn set_start(&mut self, start: i64) {
        self.start_time = start;
    }

    pub fn set_end(&mut self, end: i64) {
        self.end_time = end;
    }

    pub fn file_size(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Starts a fresh pass over the window: seeks to the indexed offset of
    /// `start_time` and returns a lazy iterator over the parsed records.
    ///
    /// The pass is single-shot; call `records()` again to restart.
    pub fn records(&self) -> Result<Records> {
        if self.start_time > self.end_time {
            return Ok(Records::empty(self.start_time, self.end_time));
        }

        let mut file =
            BufReader::new(File::open(&self.path).map_err(|source| TraceError::FileOpen {
                path: self.path.clone(),
                source,
            })?);

        let offset = self.index.locate(self.start_time)?;
        file.seek(SeekFrom::Start(offset))?;
        debug!(
            start = self.start_time,
            end = self.end_time,
            offset,
            "streaming window"
        );

        Ok(Records {
            lines: Some(file),
            start_time: self.start_time,
            end_time: self.end_time,
            parse_misses: 0,
            buf: String::new(),
        })
    }
}

/// Iterator over the records of one streaming pass.
///
/// Lines that fail the grammar are skipped and counted as parse misses;
/// traces are best effort and a torn line must not abort a multi-gigabyte
/// scan. Iteration stops at the first line past the window's end, which is
/// what makes windowed queries cheap on sorted files.
pub struct Records {
    lines: Option<BufReader<File>>,
    start_time: i64,
    end_time: i64,
    parse_misses: u64,
    buf: String,
}

impl Records {
    fn empty(start_time: i64, end_time: i64) -> Records {
        Records {
            lines: None,
            start_time,
            end_time,
            parse_misses: 0,
            buf: String::new(),
        }
    }

    /// Number of lines skipped so far because they did not parse.
    pub fn parse_misses(&self) -> u64 {
        self.parse_misses
    }
}

impl Iterator for Records {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        // Taking the reader out fuses the iterator: once a pass ends, it
        // stays ended.
        let mut lines = self.lines.take()?;

        loop {
            self.buf.clear();
            let n = lines.read_line(&mut self.buf).unwrap_or(0);
            if n == 0 {
                return None;
            }

            let line = self.buf.trim_end_matches('\n');
            let Ok(ts) = parse::timestamp_of_line(line) else {
                self.parse_misses += 1;
                trace!(line, "skipping line without a readable timestamp");
                continue;
            };

            // The index may land a few lines early; skip up to the window.
            if ts < self.start_time {
                continue;
            }
            if ts > self.end_time {
                return None;
            }

            if let Some(record) = parse::parse_record(line) {
                self.lines = Some(lines);
                return Some(record);
            }
            self.parse_misses += 1;
            trace!(line, "skipping malformed line");
        }
    }
}
