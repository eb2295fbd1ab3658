//! Filter mode: stream matching records into an output file.

use anyhow::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracelog::TraceError;
use tracelog::filter::{FilterChain, FilterSpec};
use tracelog::perf::PerfTimer;
use tracing::info;

pub fn run(input: &Path, output: &Path, filters: &[String]) -> Result<()> {
    let _timer = PerfTimer::start()?;

    let mut chain = FilterChain::open(input)?;
    for text in filters {
        let spec = FilterSpec::parse(text)?;
        chain.apply(spec);
    }
    info!(
        start = chain.reader().start_time(),
        end = chain.reader().end_time(),
        stages = chain.specs().len(),
        "filtering {}",
        input.display()
    );

    let out = File::create(output).map_err(|source| TraceError::FileOpen {
        path: output.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(out);

    chain.start()?;
    let mut written = 0u64;
    while let Ok(record) = chain.recv_log() {
        writeln!(out, "{record}")?;
        written += 1;
    }
    chain.join();
    out.flush()?;

    println!("Total records written: {written}");
    println!("Filtering complete. Results saved to {}", output.display());
    Ok(())
}
