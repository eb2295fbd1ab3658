//! Command-line front end for the trace log engine.
//!
//! Filter mode (the default) streams the records matching the given
//! filters into an output file. Count mode (`-c`) builds five frequency
//! histograms over the whole file in parallel, persists them, and serves
//! them interactively.

mod count_cmd;
mod filter_cmd;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tracelog")]
#[command(about = "Filter and aggregate huge hardware-trace log files", long_about = None)]
struct Cli {
    /// Input log file
    #[arg(short = 'i', long = "input", required_unless_present = "help_filters")]
    input: Option<PathBuf>,

    /// Name of output filtered log file
    #[arg(short = 'o', long = "output", default_value = "filtered_logs.csv")]
    output: PathBuf,

    /// Filter criteria (format: Kind=value), repeatable
    #[arg(short = 'f', long = "filter")]
    filters: Vec<String>,

    /// Count categories (ThreadId, Unit, Area, Cluster, Quad) instead of filtering
    #[arg(short = 'c', long = "processCounts")]
    process_counts: bool,

    /// Show help for filter formats
    #[arg(long = "help-filters")]
    help_filters: bool,
}

const FILTER_HELP: &str = "\
Available filters and their expected formats:
  TimeRange: TimeRange=start,end (e.g., TimeRange=1726671491.525302,1726671531.525302)
  Time: Time=value (e.g., Time=1723972947.9661083)
  Quad: Quad=Chip:<value>,Die:<value>,Quad:<value> (e.g., Quad=Chip:0,Die:1,Quad:2)
  ThreadId: ThreadId=value1,value2,... (e.g., ThreadId=7,10,15)
  Unit: Unit=value (e.g., Unit=iqr)
  Area: Area=value (e.g., Area=bmt)
  Io: Io=value (e.g., Io=in)
  Cluster: Cluster=chip:<value>,die:<value>,quad:<value>,row:<value>,col:<value> (e.g., Cluster=chip:0,die:1,quad:2,row:3,col:-1)
";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.help_filters {
        print!("{FILTER_HELP}");
        return Ok(());
    }

    let Some(input) = cli.input else {
        anyhow::bail!("--input is required");
    };

    if cli.process_counts {
        count_cmd::run(&input)
    } else {
        filter_cmd::run(&input, &cli.output, &cli.filters)
    }
}
