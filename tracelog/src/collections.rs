//! Internal collection type aliases.
//!
//! Histograms key on small integer tuples and short strings, so we use
//! `rustc_hash::FxHashMap` throughout. External users should import from
//! `rustc_hash` directly if they want the same hash implementation.

pub(crate) type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
