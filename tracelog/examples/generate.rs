//! Generate a synthetic sorted trace file.
//!
//! Usage: `generate <output_file> [num_lines]`
//!
//! Records are spaced one second apart starting from the current time, with
//! the area/unit vocabularies a real capture produces. Handy for building
//! multi-megabyte inputs when benchmarking the counting pipeline.

use rand::Rng;
use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::{SystemTime, UNIX_EPOCH};

const AREAS: [&str; 13] = [
    "Nfi",
    "cbu in mem0",
    "cbu in mem1",
    "cbu in lcip",
    "mcu gate 0",
    "mcu gate 1",
    "ecore req",
    "ecore rsp",
    "pcie",
    "host_if",
    "bmt",
    "d2d",
    "hbm",
];

const UNITS: [&str; 14] = [
    "BMT", "pcie", "cbus inj", "cbus clt", "nfi inj", "nfi clt", "iraq", "eq", "hbm", "tcu",
    "iqr", "iqd", "bin", "lnb",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <output_file> [num_lines]", args[0]);
        std::process::exit(1);
    }
    let num_lines: u64 = match args.get(2) {
        Some(n) => n.parse()?,
        None => 250_000,
    };

    let mut out = BufWriter::new(File::create(&args[1])?);
    let mut rng = rand::rng();

    let start = SystemTime::now()
        .duration_since(UNIX_EPOCH)?
        .as_secs_f64();

    for i in 0..num_lines {
        let timestamp = start + i as f64;
        let chip = 0;
        let die = rng.random_range(0..2);
        let quad = rng.random_range(0..4);
        let row = rng.random_range(0..8);
        let col = rng.random_range(0..8);
        let area = AREAS[rng.random_range(0..AREAS.len())];
        let unit = UNITS[rng.random_range(0..UNITS.len())];
        let io = if rng.random_bool(0.5) { "in" } else { "out" };
        let tid = rng.random_range(0..1000);

        writeln!(
            out,
            "timestamp:{timestamp:.6},cluster_id:chip:{chip};die:{die};quad:{quad};row:{row};col:{col},area:{area},unit:{unit},in/out:{io},tid:{tid},packet/data:sample data {i}"
        )?;
    }
    out.flush()?;

    println!("Wrote {} records to {}", num_lines, args[1]);
    Ok(())
}
