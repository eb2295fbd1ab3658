//! Build a filter chain programmatically and drain it through the
//! asynchronous producer.
//!
//! Usage: `filtered_retrieval <trace_file> [Kind=value]...`

use std::env;
use tracelog::filter::{FilterChain, FilterSpec};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <trace_file> [Kind=value]...", args[0]);
        std::process::exit(1);
    }

    let mut chain = FilterChain::open(&args[1])?;
    println!(
        "Time span: {} .. {}",
        chain.reader().start_time(),
        chain.reader().end_time()
    );

    for text in &args[2..] {
        chain.apply(FilterSpec::parse(text)?);
    }

    chain.start()?;
    let mut matched = 0u64;
    while let Ok(record) = chain.recv_log() {
        matched += 1;
        if matched <= 10 {
            println!("{record}");
        }
    }
    chain.join();

    if matched > 10 {
        println!("... and {} more records", matched - 10);
    }
    println!("Matched {matched} records");
    Ok(())
}
