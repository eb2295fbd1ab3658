//! Value types for parsed trace events.

use std::fmt;

/// Direction of a traced transfer, as recorded in the `in/out` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    /// Parse the literal field value. Anything other than `in`/`out` is
    /// rejected by the line grammar before this is called.
    pub fn from_field(s: &str) -> Option<Direction> {
        match s {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cluster location in the multi-chip fabric.
///
/// Coordinates may be negative; the tracer emits `-1` as a wildcard for
/// events that are not pinned to a specific row or column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Cluster {
    pub chip: i32,
    pub die: i32,
    pub quad: i32,
    pub row: i32,
    pub col: i32,
}

impl Cluster {
    pub fn new(chip: i32, die: i32, quad: i32, row: i32, col: i32) -> Cluster {
        Cluster {
            chip,
            die,
            quad,
            row,
            col,
        }
    }

    /// The `(chip, die, quad)` projection used as a histogram key.
    pub fn quad_key(&self) -> QuadKey {
        QuadKey {
            chip: self.chip,
            die: self.die,
            quad: self.quad,
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chip:{}, die:{}, quad:{}, row:{}, col:{}",
            self.chip, self.die, self.quad, self.row, self.col
        )
    }
}

/// The quad-level projection of a [`Cluster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuadKey {
    pub chip: i32,
    pub die: i32,
    pub quad: i32,
}

impl QuadKey {
    pub fn new(chip: i32, die: i32, quad: i32) -> QuadKey {
        QuadKey { chip, die, quad }
    }
}

impl fmt::Display for QuadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chip:{}, die:{}, quad:{}", self.chip, self.die, self.quad)
    }
}

/// One traced event, parsed from a single log line.
///
/// Timestamps are kept as whole seconds: the source carries microsecond
/// precision but every consumer of this engine keys on seconds, so the
/// fractional part is truncated at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: i64,
    pub cluster: Cluster,
    pub area: String,
    pub unit: String,
    pub io: Direction,
    pub tid: i32,
    pub packet: String,
}

impl fmt::Display for Record {
    /// Re-serializes the record in the input line grammar. The truncated
    /// timestamp is written with a zero fraction so the output file parses
    /// under the same grammar as the input.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamp:{}.000000,cluster_id:chip:{};die:{};quad:{};row:{};col:{},area:{},unit:{},in/out:{},tid:{},packet/data:{}",
            self.timestamp,
            self.cluster.chip,
            self.cluster.die,
            self.cluster.quad,
            self.cluster.row,
            self.cluster.col,
            self.area,
            self.unit,
            self.io,
            self.tid,
            self.packet
        )
    }
}
