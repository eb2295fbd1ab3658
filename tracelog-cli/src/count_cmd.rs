//! Count mode: parallel histograms, a persisted result file, and an
//! interactive lookup loop.

use anyhow::Result;
use std::fs::File;
use std::io::{BufRead, Write};
use std::path::Path;
use tracelog::TraceError;
use tracelog::count::{self, SECTION_NAMES, TraceCounts};
use tracelog::perf::PerfTimer;
use tracing::info;

/// Where the five histograms are persisted after a counting run.
pub const RESULT_FILE: &str = "result.txt";

pub fn run(input: &Path) -> Result<()> {
    println!("Starting counting process...");

    let counts = {
        let _timer = PerfTimer::start()?;
        count::count_file(input)?
    };
    info!(records = counts.total(), "counting finished");

    let mut out = File::create(RESULT_FILE).map_err(|source| TraceError::FileOpen {
        path: RESULT_FILE.into(),
        source,
    })?;
    write!(out, "{counts}")?;

    println!("Everything is ready! Results saved to {RESULT_FILE}");
    let stdin = std::io::stdin();
    interactive(&counts, stdin.lock(), std::io::stdout())?;
    Ok(())
}

/// Reads category names until `exit`, printing the matching histogram.
fn interactive<R: BufRead, W: Write>(counts: &TraceCounts, input: R, mut out: W) -> Result<()> {
    let prompt = format!(
        "What to display? Enter {} (or 'exit'):",
        SECTION_NAMES.join(" / ")
    );

    writeln!(out, "{prompt}")?;
    for line in input.lines() {
        let name = line?;
        let name = name.trim();
        if name == "exit" {
            break;
        }

        match counts.section(name) {
            Some(section) => write!(out, "{section}")?,
            None => writeln!(
                out,
                "Unknown category '{name}'. Expected one of: {}.",
                SECTION_NAMES.join(", ")
            )?,
        }
        writeln!(out, "{prompt}")?;
    }
    Ok(())
}
