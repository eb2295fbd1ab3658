//! Filtering and aggregation engine for CSV-encoded hardware-trace logs.
//!
//! Trace files are append-only, sorted by timestamp, and can reach multiple
//! gigabytes. This crate provides:
//! - Timestamp-indexed streaming: [`index`] and [`reader`] modules
//! - Composable predicate chains with an async producer: [`filter`] module
//! - Parallel frequency counting over byte ranges: [`count`] module
//!
//! # Examples
//!
//! ```no_run
//! use tracelog::filter::{FilterChain, FilterSpec};
//! # fn main() -> tracelog::Result<()> {
//!
//! let mut chain = FilterChain::open("traces.csv")?;
//! chain.set_start(1726671833);
//! chain.set_end(1726671915);
//! chain.add(FilterSpec::Unit("lnb".to_string()));
//!
//! for record in chain.filtered()? {
//!     println!("{record}");
//! }
//! # Ok(())
//! # }
//! ```

// Core error types used throughout the crate
pub mod error;

// Internal collection type aliases (not re-exported)
mod collections;

// Record, cluster and quad-key value types
pub mod model;

// Trace line grammar
pub mod parse;

// Byte-offset binary search by timestamp
pub mod index;

// Lazy record streaming within a time window
pub mod reader;

// Filter specs, predicate stages, chain factory and producer
pub mod filter;

// Parallel frequency counting
pub mod count;

// Scoped run-metadata timer
pub mod perf;

// Re-export commonly used types for convenience
pub use error::{Result, TraceError};
pub use model::{Cluster, Direction, QuadKey, Record};
pub use reader::LogReader;
