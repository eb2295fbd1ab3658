//! The filter chain factory and its asynchronous producer.

use super::stage::build_chain;
use super::{FilterKind, FilterSpec};
use crate::error::{Result, TraceError};
use crate::model::Record;
use crate::perf;
use crate::reader::LogReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use tracing::{debug, error, info};

/// Upper timestamp accepted by the producer, in seconds. Trace capture
/// occasionally emits garbage far-future dates on power glitches; anything
/// at or past this cutoff is dropped.
pub const MAX_VALID_TIMESTAMP: i64 = 3_025_236_764_272;

/// Capacity of the producer/consumer hand-off queue. A bounded queue keeps
/// a fast producer from ballooning memory ahead of a slow consumer; sends
/// block once the queue is full.
const HANDOFF_CAPACITY: usize = 1024;

/// Owns the streaming reader and an ordered list of filter specs, and
/// builds predicate chains over them.
///
/// Time-based specs narrow the reader window directly; every other kind
/// becomes one stage. The chain is rebuilt from the reader on every pass
/// rather than mutated in place.
pub struct FilterChain {
    reader: LogReader,
    specs: Vec<FilterSpec>,
    producer: Option<Producer>,
}

struct Producer {
    rx: crossbeam_channel::Receiver<Record>,
    finished: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FilterChain {
    /// Opens a chain over `path` with no filters and the file's full time
    /// span as the window.
    pub fn open(path: impl Into<PathBuf>) -> Result<FilterChain> {
        Ok(FilterChain {
            reader: LogReader::open(path)?,
            specs: Vec::new(),
            producer: None,
        })
    }

    pub fn reader(&self) -> &LogReader {
        &self.reader
    }

    pub fn specs(&self) -> &[FilterSpec] {
        &self.specs
    }

    pub fn set_start(&mut self, start: i64) {
        self.reader.set_start(start);
    }

    pub fn set_end(&mut self, end: i64) {
        self.reader.set_end(end);
    }

    /// Routes a spec to its destination: time-based specs adjust the
    /// window, everything else replaces any existing spec of its kind.
    pub fn apply(&mut self, spec: FilterSpec) {
        match spec {
            FilterSpec::TimeRange { start, end } => {
                self.set_start(start);
                self.set_end(end);
            }
            FilterSpec::Time(t) => {
                self.set_start(t);
                self.set_end(t);
            }
            other => self.update(other),
        }
    }

    /// Appends a spec to the chain.
    pub fn add(&mut self, spec: FilterSpec) {
        debug!(%spec, "adding filter");
        self.specs.push(spec);
    }

    /// Replaces the existing spec of the same kind, keeping its position in
    /// the chain; appends when no spec of that kind exists.
    pub fn update(&mut self, spec: FilterSpec) {
        let kind = spec.kind();
        let mut replaced = false;
        for slot in self.specs.iter_mut().filter(|s| s.kind() == kind) {
            *slot = spec.clone();
            replaced = true;
        }
        if !replaced {
            self.add(spec);
        }
    }

    /// Drops every spec of the given kind.
    pub fn remove(&mut self, kind: FilterKind) {
        self.specs.retain(|spec| spec.kind() != kind);
    }

    /// Drops all specs, leaving the bare reader.
    pub fn clear(&mut self) {
        self.specs.clear();
        perf::record_stage("cleared all filters".to_string());
    }

    /// Builds the chain and returns its lazy record sequence.
    pub fn filtered(&self) -> Result<Box<dyn Iterator<Item = Record> + Send>> {
        Ok(build_chain(self.reader.records()?, &self.specs))
    }

    /// Spawns the producer thread.
    ///
    /// At most one producer runs at a time; a previous producer is joined
    /// before the new one starts, and the hand-off queue is reset. The
    /// producer drains a snapshot of the current chain, so later spec
    /// changes do not affect a run in flight.
    pub fn start(&mut self) -> Result<()> {
        self.join();

        let (tx, rx) = crossbeam_channel::bounded(HANDOFF_CAPACITY);
        let finished = Arc::new(AtomicBool::new(false));

        let reader = self.reader.clone();
        let specs = self.specs.clone();
        let flag = Arc::clone(&finished);

        let handle = std::thread::Builder::new()
            .name("tracelog-producer".to_string())
            .spawn(move || {
                match reader.records() {
                    Ok(records) => {
                        let chain = build_chain(records, &specs);
                        let mut produced = 0u64;
                        for record in chain {
                            if record.timestamp > 0 && record.timestamp < MAX_VALID_TIMESTAMP {
                                // A send fails only when every consumer is
                                // gone; nothing left to produce for.
                                if tx.send(record).is_err() {
                                    break;
                                }
                                produced += 1;
                            }
                        }
                        info!(produced, "producer drained the chain");
                    }
                    Err(e) => error!("producer could not open the record stream: {e}"),
                }
                flag.store(true, Ordering::Release);
            })
            .map_err(TraceError::ThreadCreation)?;

        self.producer = Some(Producer {
            rx,
            finished,
            handle: Some(handle),
        });
        Ok(())
    }

    /// Whether a produced record is waiting in the queue.
    pub fn has_log(&self) -> bool {
        self.producer.as_ref().is_some_and(|p| !p.rx.is_empty())
    }

    /// Takes the next produced record without blocking. `NoData` when the
    /// queue is empty or no producer was started.
    pub fn get_log(&self) -> Result<Record> {
        let producer = self.producer.as_ref().ok_or(TraceError::NoData)?;
        producer.rx.try_recv().map_err(|_| TraceError::NoData)
    }

    /// Blocks for the next produced record. `NoData` once the producer has
    /// finished and the queue is drained.
    pub fn recv_log(&self) -> Result<Record> {
        let producer = self.producer.as_ref().ok_or(TraceError::NoData)?;
        producer.rx.recv().map_err(|_| TraceError::NoData)
    }

    /// Whether the producer thread has finished draining the chain.
    pub fn finished(&self) -> bool {
        self.producer
            .as_ref()
            .is_some_and(|p| p.finished.load(Ordering::Acquire))
    }

    /// Blocks until the producer thread exits. Queued records remain
    /// retrievable afterwards.
    pub fn join(&mut self) {
        if let Some(producer) = self.producer.as_mut() {
            if let Some(handle) = producer.handle.take() {
                if handle.join().is_err() {
                    error!("producer thread panicked");
                }
            }
        }
    }
}

impl Drop for FilterChain {
    fn drop(&mut self) {
        // The producer borrows nothing from the factory, but an orphaned
        // producer thread would keep the input file open past the caller's
        // expectations.
        self.join();
    }
}
