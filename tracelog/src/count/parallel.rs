//! Byte-range parallel counting.
//!
//! The file is split into one contiguous byte range per worker. A line
//! belongs to the worker whose range contains its first byte: workers after
//! the first skip forward to their first owned line, and every worker reads
//! past its range end to finish the last line it owns. Each worker counts
//! into local histograms and merges into the shared result once, at the
//! end, so workers never observe each other's intermediate state.

use super::TraceCounts;
use crate::error::{Result, TraceError};
use crate::parse;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, instrument};

/// Default worker count for count mode.
pub const DEFAULT_WORKERS: usize = 6;

/// Counts the whole file with [`DEFAULT_WORKERS`] workers.
pub fn count_file(path: &Path) -> Result<TraceCounts> {
    count_file_with_workers(path, DEFAULT_WORKERS)
}

/// Counts the whole file with a fixed pool of `workers` threads.
///
/// The result is independent of the worker count. The first worker error
/// aborts the operation.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn count_file_with_workers(path: &Path, workers: usize) -> Result<TraceCounts> {
    let file_size = std::fs::metadata(path)
        .map_err(|source| TraceError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if file_size == 0 {
        return Ok(TraceCounts::new());
    }

    // More workers than bytes would leave some with empty ranges.
    let workers = workers.clamp(1, file_size as usize);
    let chunk = file_size / workers as u64;

    let merged = Mutex::new(TraceCounts::new());
    let first_error: Mutex<Option<TraceError>> = Mutex::new(None);

    std::thread::scope(|scope| {
        for i in 0..workers {
            let range_start = i as u64 * chunk;
            let range_end = if i == workers - 1 {
                file_size
            } else {
                (i as u64 + 1) * chunk
            };
            let is_last = i == workers - 1;
            let merged = &merged;
            let first_error = &first_error;

            scope.spawn(move || {
                match count_range(path, range_start, range_end, is_last) {
                    Ok(local) => merged.lock().merge(local),
                    Err(e) => {
                        let mut slot = first_error.lock();
                        if slot.is_none() {
                            *slot = Some(e);
                        }
                    }
                }
            });
        }
    });

    if let Some(e) = first_error.into_inner() {
        return Err(e);
    }

    let counts = merged.into_inner();
    debug!(records = counts.total(), workers, "count pass finished");
    Ok(counts)
}

/// Counts the lines owned by one worker's byte range.
fn count_range(path: &Path, range_start: u64, range_end: u64, is_last: bool) -> Result<TraceCounts> {
    let file = File::open(path).map_err(|source| TraceError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let mut pos = range_start;
    if range_start > 0 {
        // Unless the range begins exactly at a line boundary, the opening
        // bytes are the tail of a line owned by the previous worker.
        reader.seek(SeekFrom::Start(range_start - 1))?;
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        if byte[0] != b'\n' {
            let mut partial = Vec::new();
            pos += reader.read_until(b'\n', &mut partial)? as u64;
        }
    }

    let mut counts = TraceCounts::new();
    let mut line = String::new();
    loop {
        // A line is owned here iff it starts inside the range; the last
        // worker additionally owns everything to EOF.
        if !is_last && pos >= range_end {
            break;
        }
        line.clear();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            break;
        }
        pos += n as u64;

        if let Some(record) = parse::parse_record(line.trim_end_matches('\n')) {
            counts.observe(&record);
        }
    }

    Ok(counts)
}
