//! The trace line grammar.
//!
//! One record per line:
//!
//! ```text
//! timestamp:<float>,cluster_id:chip:<int>;die:<int>;quad:<int>;row:<int>;col:<int>,area:<text>,unit:<text>,in/out:(in|out),tid:<int>,packet/data:<text>
//! ```
//!
//! The timestamp must carry a decimal point; the record keeps its truncated
//! whole seconds. `area` and `unit` match non-greedily up to the next comma,
//! `packet/data` takes the remainder of the line. Trailing whitespace is
//! tolerated after the timestamp and after the `col` coordinate, matching
//! what the tracer actually emits.

use crate::error::{Result, TraceError};
use crate::model::{Cluster, Direction, Record};
use regex::Regex;
use std::sync::LazyLock;

static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^timestamp:(\d+\.\d+)\s*,cluster_id:chip:(-?\d+);die:(-?\d+);quad:(-?\d+);row:(-?\d+);col:(-?\d+)\s*,area:(.*?),unit:(.*?),in/out:(in|out),tid:(-?\d+),packet/data:(.*)$",
    )
    .expect("trace line pattern compiles")
});

/// Parse one full line into a [`Record`].
///
/// Returns `None` when the line does not match the grammar or a numeric
/// field does not fit its type; callers on the streaming path treat that as
/// a parse miss and skip the line.
pub fn parse_record(line: &str) -> Option<Record> {
    let caps = LINE_RE.captures(line)?;

    let timestamp: f64 = caps[1].parse().ok()?;
    let cluster = Cluster::new(
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
        caps[4].parse().ok()?,
        caps[5].parse().ok()?,
        caps[6].parse().ok()?,
    );

    Some(Record {
        timestamp: timestamp as i64,
        cluster,
        area: caps[7].to_string(),
        unit: caps[8].to_string(),
        io: Direction::from_field(&caps[9])?,
        tid: caps[10].parse().ok()?,
        packet: caps[11].to_string(),
    })
}

/// Extract the whole-second timestamp from a line without parsing the rest.
///
/// Used on the binary-search path, where a malformed timestamp is an error
/// rather than a skippable miss: the index cannot navigate a file whose
/// probed lines do not order by time.
pub fn timestamp_of_line(line: &str) -> Result<i64> {
    const FIELD: &str = "timestamp:";

    let start = line.find(FIELD).map(|pos| pos + FIELD.len()).ok_or_else(|| {
        TraceError::InvalidFormat {
            input: line.to_string(),
            reason: "missing timestamp field".to_string(),
        }
    })?;

    let rest = &line[start..];
    let end = rest.find(',').ok_or_else(|| TraceError::InvalidFormat {
        input: line.to_string(),
        reason: "unterminated timestamp field".to_string(),
    })?;

    let seconds: f64 = rest[..end]
        .trim()
        .parse()
        .map_err(|_| TraceError::InvalidFormat {
            input: line.to_string(),
            reason: "timestamp is not a number".to_string(),
        })?;

    Ok(seconds as i64)
}
