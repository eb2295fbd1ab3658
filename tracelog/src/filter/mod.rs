//! Filter specifications and the predicate chain built from them.
//!
//! A filter is specified as `Kind=value` text (the CLI surface) or
//! constructed directly as a [`FilterSpec`]. Time-based specs narrow the
//! reader's window; every other kind becomes a predicate stage wrapped
//! around the record stream.

mod chain;
mod stage;

pub use chain::{FilterChain, MAX_VALID_TIMESTAMP};
pub use stage::Stage;

use crate::error::{Result, TraceError};
use crate::model::{Cluster, QuadKey, Record};
use std::fmt;
use std::num::IntErrorKind;

/// The kind tag of a [`FilterSpec`], used for replace/remove by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    TimeRange,
    Time,
    ThreadId,
    Cluster,
    Quad,
    Unit,
    Area,
    Io,
}

impl FilterKind {
    pub fn from_name(name: &str) -> Option<FilterKind> {
        match name {
            "TimeRange" => Some(FilterKind::TimeRange),
            "Time" => Some(FilterKind::Time),
            "ThreadId" => Some(FilterKind::ThreadId),
            "Cluster" => Some(FilterKind::Cluster),
            "Quad" => Some(FilterKind::Quad),
            "Unit" => Some(FilterKind::Unit),
            "Area" => Some(FilterKind::Area),
            "Io" => Some(FilterKind::Io),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::TimeRange => "TimeRange",
            FilterKind::Time => "Time",
            FilterKind::ThreadId => "ThreadId",
            FilterKind::Cluster => "Cluster",
            FilterKind::Quad => "Quad",
            FilterKind::Unit => "Unit",
            FilterKind::Area => "Area",
            FilterKind::Io => "Io",
        }
    }

    /// Time-based kinds adjust the reader window instead of becoming
    /// predicate stages.
    pub fn is_time(&self) -> bool {
        matches!(self, FilterKind::TimeRange | FilterKind::Time)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed filter specification.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    TimeRange { start: i64, end: i64 },
    Time(i64),
    ThreadId(Vec<i32>),
    Cluster(Cluster),
    Quad(QuadKey),
    Unit(String),
    Area(String),
    Io(String),
}

impl FilterSpec {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterSpec::TimeRange { .. } => FilterKind::TimeRange,
            FilterSpec::Time(_) => FilterKind::Time,
            FilterSpec::ThreadId(_) => FilterKind::ThreadId,
            FilterSpec::Cluster(_) => FilterKind::Cluster,
            FilterSpec::Quad(_) => FilterKind::Quad,
            FilterSpec::Unit(_) => FilterKind::Unit,
            FilterSpec::Area(_) => FilterKind::Area,
            FilterSpec::Io(_) => FilterKind::Io,
        }
    }

    /// Predicate for chain stages. Time-based specs are applied through
    /// the reader window and always accept here.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            FilterSpec::TimeRange { .. } | FilterSpec::Time(_) => true,
            FilterSpec::ThreadId(ids) => ids.contains(&record.tid),
            FilterSpec::Cluster(cluster) => record.cluster == *cluster,
            FilterSpec::Quad(quad) => record.cluster.quad_key() == *quad,
            FilterSpec::Unit(unit) => record.unit == *unit,
            FilterSpec::Area(area) => record.area == *area,
            FilterSpec::Io(io) => record.io.as_str() == io,
        }
    }

    /// Parse the user-facing `Kind=value` syntax.
    pub fn parse(input: &str) -> Result<FilterSpec> {
        let Some((name, value)) = input.split_once('=') else {
            return Err(TraceError::InvalidFormat {
                input: input.to_string(),
                reason: "expected 'Kind=value'".to_string(),
            });
        };

        let kind = FilterKind::from_name(name)
            .ok_or_else(|| TraceError::UnknownKind(name.to_string()))?;

        match kind {
            FilterKind::TimeRange => {
                let Some((start, end)) = value.split_once(',') else {
                    return Err(TraceError::InvalidFormat {
                        input: input.to_string(),
                        reason: "expected 'TimeRange=start,end'".to_string(),
                    });
                };
                Ok(FilterSpec::TimeRange {
                    start: parse_seconds(start, input)?,
                    end: parse_seconds(end, input)?,
                })
            }
            FilterKind::Time => Ok(FilterSpec::Time(parse_seconds(value, input)?)),
            FilterKind::ThreadId => {
                let ids = value
                    .split(',')
                    .map(|part| parse_int(part, input))
                    .collect::<Result<Vec<i32>>>()?;
                Ok(FilterSpec::ThreadId(ids))
            }
            FilterKind::Cluster => {
                let coords = tagged_coordinates::<5>(value, input)?;
                Ok(FilterSpec::Cluster(Cluster::new(
                    coords[0], coords[1], coords[2], coords[3], coords[4],
                )))
            }
            FilterKind::Quad => {
                let coords = tagged_coordinates::<3>(value, input)?;
                Ok(FilterSpec::Quad(QuadKey::new(coords[0], coords[1], coords[2])))
            }
            FilterKind::Unit => Ok(FilterSpec::Unit(value.to_string())),
            FilterKind::Area => Ok(FilterSpec::Area(value.to_string())),
            FilterKind::Io => Ok(FilterSpec::Io(value.to_string())),
        }
    }

    /// Human-readable form, recorded in the run-metadata stage list.
    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::TimeRange { start, end } => {
                write!(f, "time window: {start}..{end}")
            }
            FilterSpec::Time(t) => write!(f, "time window: {t}..{t}"),
            FilterSpec::ThreadId(ids) => {
                write!(f, "ThreadId filter: ")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{id}")?;
                }
                Ok(())
            }
            FilterSpec::Cluster(cluster) => write!(f, "Cluster filter: {cluster}"),
            FilterSpec::Quad(quad) => write!(f, "Quad filter: {quad}"),
            FilterSpec::Unit(unit) => write!(f, "Unit filter: {unit}"),
            FilterSpec::Area(area) => write!(f, "Area filter: {area}"),
            FilterSpec::Io(io) => write!(f, "Io filter: {io}"),
        }
    }
}

/// Floating-point seconds, truncated toward zero.
fn parse_seconds(text: &str, input: &str) -> Result<i64> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| TraceError::InvalidFormat {
            input: input.to_string(),
            reason: format!("'{}' is not a number", text.trim()),
        })?;
    if !value.is_finite() {
        return Err(TraceError::OutOfRange(input.to_string()));
    }
    Ok(value as i64)
}

fn parse_int(text: &str, input: &str) -> Result<i32> {
    text.trim().parse().map_err(|e: std::num::ParseIntError| {
        match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                TraceError::OutOfRange(input.to_string())
            }
            _ => TraceError::InvalidFormat {
                input: input.to_string(),
                reason: format!("'{}' is not an integer", text.trim()),
            },
        }
    })
}

/// Parse `tag:<int>` parts separated by commas. Tags are positional; only
/// the value after the colon matters.
fn tagged_coordinates<const N: usize>(value: &str, input: &str) -> Result<[i32; N]> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != N {
        return Err(TraceError::InvalidParameterCount {
            input: input.to_string(),
            expected: N,
            got: parts.len(),
        });
    }

    let mut coords = [0i32; N];
    for (slot, part) in coords.iter_mut().zip(parts) {
        let Some((_, number)) = part.split_once(':') else {
            return Err(TraceError::InvalidFormat {
                input: input.to_string(),
                reason: format!("'{part}' is missing a ':' separator"),
            });
        };
        *slot = parse_int(number, input)?;
    }
    Ok(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Direction;

    fn record(tid: i32) -> Record {
        Record {
            timestamp: 100,
            cluster: Cluster::new(0, 1, 2, 3, 4),
            area: "host_if".to_string(),
            unit: "lnb".to_string(),
            io: Direction::In,
            tid,
            packet: "p".to_string(),
        }
    }

    #[test]
    fn parses_every_kind() {
        assert_eq!(
            FilterSpec::parse("TimeRange=1726671491.525302,1726671531.9").unwrap(),
            FilterSpec::TimeRange {
                start: 1726671491,
                end: 1726671531
            }
        );
        assert_eq!(
            FilterSpec::parse("Time=1723972947.9661083").unwrap(),
            FilterSpec::Time(1723972947)
        );
        assert_eq!(
            FilterSpec::parse("ThreadId=7,10,15").unwrap(),
            FilterSpec::ThreadId(vec![7, 10, 15])
        );
        assert_eq!(
            FilterSpec::parse("Cluster=chip:0,die:1,quad:2,row:3,col:-1").unwrap(),
            FilterSpec::Cluster(Cluster::new(0, 1, 2, 3, -1))
        );
        assert_eq!(
            FilterSpec::parse("Quad=Chip:0,Die:1,Quad:2").unwrap(),
            FilterSpec::Quad(QuadKey::new(0, 1, 2))
        );
        assert_eq!(
            FilterSpec::parse("Unit=iqr").unwrap(),
            FilterSpec::Unit("iqr".to_string())
        );
        assert_eq!(
            FilterSpec::parse("Area=bmt").unwrap(),
            FilterSpec::Area("bmt".to_string())
        );
        assert_eq!(
            FilterSpec::parse("Io=in").unwrap(),
            FilterSpec::Io("in".to_string())
        );
    }

    #[test]
    fn rejects_unknown_kinds_and_shapes() {
        assert!(matches!(
            FilterSpec::parse("Widget=7"),
            Err(TraceError::UnknownKind(_))
        ));
        assert!(matches!(
            FilterSpec::parse("just words"),
            Err(TraceError::InvalidFormat { .. })
        ));
        assert!(matches!(
            FilterSpec::parse("TimeRange=100.0"),
            Err(TraceError::InvalidFormat { .. })
        ));
        assert!(matches!(
            FilterSpec::parse("Time=soon"),
            Err(TraceError::InvalidFormat { .. })
        ));
        assert!(matches!(
            FilterSpec::parse("ThreadId=1,two,3"),
            Err(TraceError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = FilterSpec::parse("Cluster=chip:0,die:1,quad:2").unwrap_err();
        assert!(matches!(
            err,
            TraceError::InvalidParameterCount {
                expected: 5,
                got: 3,
                ..
            }
        ));

        let err = FilterSpec::parse("Quad=Chip:0,Die:1,Quad:2,Row:3").unwrap_err();
        assert!(matches!(
            err,
            TraceError::InvalidParameterCount {
                expected: 3,
                got: 4,
                ..
            }
        ));
    }

    #[test]
    fn rejects_out_of_range_integers() {
        assert!(matches!(
            FilterSpec::parse("ThreadId=99999999999"),
            Err(TraceError::OutOfRange(_))
        ));
        assert!(matches!(
            FilterSpec::parse("Quad=Chip:99999999999,Die:0,Quad:0"),
            Err(TraceError::OutOfRange(_))
        ));
    }

    #[test]
    fn predicates_match_the_right_records() {
        let r = record(117);

        assert!(FilterSpec::ThreadId(vec![7, 117]).matches(&r));
        assert!(!FilterSpec::ThreadId(vec![7]).matches(&r));

        assert!(FilterSpec::Cluster(Cluster::new(0, 1, 2, 3, 4)).matches(&r));
        assert!(!FilterSpec::Cluster(Cluster::new(0, 1, 2, 3, 5)).matches(&r));

        assert!(FilterSpec::Quad(QuadKey::new(0, 1, 2)).matches(&r));
        assert!(!FilterSpec::Quad(QuadKey::new(0, 1, 3)).matches(&r));

        assert!(FilterSpec::Unit("lnb".to_string()).matches(&r));
        assert!(!FilterSpec::Unit("hbm".to_string()).matches(&r));

        assert!(FilterSpec::Area("host_if".to_string()).matches(&r));
        assert!(FilterSpec::Io("in".to_string()).matches(&r));
        assert!(!FilterSpec::Io("out".to_string()).matches(&r));

        // Time specs are window adjustments, not predicates.
        assert!(FilterSpec::Time(0).matches(&r));
        assert!(FilterSpec::TimeRange { start: 0, end: 1 }.matches(&r));
    }
}
