//! End-to-end scenarios over a small captured trace.
//!
//! The fixture is ten records spanning 1726671833.525302 through
//! 1726671925.525302; the first nine fall inside the queried window and
//! the last sits past it.

use std::io::Write;
use tempfile::NamedTempFile;
use tracelog::count::count_file_with_workers;
use tracelog::filter::{FilterChain, FilterSpec};
use tracelog::index::TimeIndex;
use tracelog::model::{Cluster, QuadKey};
use tracelog::Record;

const WINDOW_START: i64 = 1726671833;
const WINDOW_END: i64 = 1726671915;

fn fixture() -> NamedTempFile {
    let rows: [(f64, (i32, i32, i32, i32, i32), &str, &str, &str, i32); 10] = [
        (1726671833.525302, (0, 0, 0, 1, 1), "host_if", "lnb", "in", 117),
        (1726671843.525302, (0, 1, 1, 2, 3), "host_if", "cbus inj", "in", 117),
        (1726671853.525302, (0, 1, 1, 0, 0), "host_if", "lnb", "in", 117),
        (1726671863.525302, (1, 0, 2, 3, 4), "host_if", "pcie", "in", 117),
        (1726671873.525302, (0, 0, 1, 1, 1), "host_if", "hbm", "in", 42),
        (1726671883.525302, (0, 0, 2, 5, 6), "bmt", "iqr", "in", 42),
        (1726671893.525302, (1, 1, 3, 7, 0), "d2d", "eq", "in", 7),
        (1726671903.525302, (0, 1, 2, 4, 4), "pcie", "tcu", "in", 7),
        (1726671913.525302, (2, 0, 0, 0, 2), "hbm", "bin", "out", 99),
        (1726671925.525302, (0, 0, 0, 1, 1), "host_if", "lnb", "in", 117),
    ];

    let mut file = NamedTempFile::new().expect("temp file");
    for (i, (ts, (chip, die, quad, row, col), area, unit, io, tid)) in rows.iter().enumerate() {
        writeln!(
            file,
            "timestamp:{ts:.6},cluster_id:chip:{chip};die:{die};quad:{quad};row:{row};col:{col},area:{area},unit:{unit},in/out:{io},tid:{tid},packet/data:sample data {i}"
        )
        .expect("write line");
    }
    file.flush().expect("flush");
    file
}

fn windowed_chain(file: &NamedTempFile) -> FilterChain {
    let mut chain = FilterChain::open(file.path()).expect("open chain");
    chain.set_start(WINDOW_START);
    chain.set_end(WINDOW_END);
    chain
}

fn count(chain: &FilterChain) -> usize {
    chain.filtered().expect("build chain").count()
}

#[test]
fn time_window_only_matches_nine() {
    let file = fixture();
    assert_eq!(count(&windowed_chain(&file)), 9);
}

#[test]
fn cluster_filter_matches_one() {
    let file = fixture();
    let mut chain = windowed_chain(&file);
    chain.add(FilterSpec::Cluster(Cluster::new(0, 0, 0, 1, 1)));
    assert_eq!(count(&chain), 1);
}

#[test]
fn quad_filter_matches_two() {
    let file = fixture();
    let mut chain = windowed_chain(&file);
    chain.add(FilterSpec::Quad(QuadKey::new(0, 1, 1)));
    assert_eq!(count(&chain), 2);
}

#[test]
fn area_filter_matches_five() {
    let file = fixture();
    let mut chain = windowed_chain(&file);
    chain.add(FilterSpec::Area("host_if".to_string()));
    assert_eq!(count(&chain), 5);
}

#[test]
fn unit_filter_matches_two() {
    let file = fixture();
    let mut chain = windowed_chain(&file);
    chain.add(FilterSpec::Unit("lnb".to_string()));
    assert_eq!(count(&chain), 2);
}

#[test]
fn io_filter_matches_eight() {
    let file = fixture();
    let mut chain = windowed_chain(&file);
    chain.add(FilterSpec::Io("in".to_string()));
    assert_eq!(count(&chain), 8);
}

#[test]
fn thread_id_filter_matches_four() {
    let file = fixture();
    let mut chain = windowed_chain(&file);
    chain.add(FilterSpec::ThreadId(vec![117]));
    assert_eq!(count(&chain), 4);
}

#[test]
fn first_and_last_time_queries() {
    let file = fixture();
    let index = TimeIndex::new(file.path());
    assert_eq!(index.first_time().unwrap(), 1726671833);
    assert_eq!(index.last_time().unwrap(), 1726671925);
}

#[test]
fn filters_parsed_from_text_behave_like_built_specs() {
    let file = fixture();
    let mut chain = FilterChain::open(file.path()).unwrap();
    chain.apply(FilterSpec::parse(&format!("TimeRange={WINDOW_START}.0,{WINDOW_END}.0")).unwrap());
    chain.apply(FilterSpec::parse("ThreadId=117").unwrap());
    assert_eq!(count(&chain), 4);
}

#[test]
fn filter_output_is_idempotent_under_the_same_filters() {
    let file = fixture();
    let mut chain = windowed_chain(&file);
    chain.add(FilterSpec::Area("host_if".to_string()));

    let first_pass: Vec<Record> = chain.filtered().unwrap().collect();

    // Re-serialize the output and run the identical filters over it.
    let mut rewritten = NamedTempFile::new().unwrap();
    for record in &first_pass {
        writeln!(rewritten, "{record}").unwrap();
    }
    rewritten.flush().unwrap();

    let mut chain = FilterChain::open(rewritten.path()).unwrap();
    chain.set_start(WINDOW_START);
    chain.set_end(WINDOW_END);
    chain.add(FilterSpec::Area("host_if".to_string()));

    let second_pass: Vec<Record> = chain.filtered().unwrap().collect();
    assert_eq!(first_pass, second_pass);
}

#[test]
fn producer_and_direct_chain_agree() {
    let file = fixture();
    let mut chain = windowed_chain(&file);
    chain.add(FilterSpec::Io("in".to_string()));

    let direct: Vec<Record> = chain.filtered().unwrap().collect();

    chain.start().unwrap();
    let mut produced = Vec::new();
    while let Ok(record) = chain.recv_log() {
        produced.push(record);
    }
    chain.join();

    assert_eq!(direct, produced);
}

#[test]
fn counting_the_fixture_balances_across_histograms() {
    let file = fixture();
    let counts = count_file_with_workers(file.path(), 3).unwrap();

    assert_eq!(counts.total(), 10);
    assert_eq!(counts.tid[&117], 5);
    assert_eq!(counts.unit[&"lnb".to_string()], 3);
    assert_eq!(counts.cluster[&Cluster::new(0, 0, 0, 1, 1)], 2);
    assert_eq!(counts.quad[&QuadKey::new(0, 0, 0)], 2);
    assert_eq!(counts.quad[&QuadKey::new(0, 1, 1)], 2);

    for (cluster, &n) in &counts.cluster {
        assert!(counts.quad[&cluster.quad_key()] >= n);
    }
    let total = counts.total();
    for sum in [
        counts.unit.values().sum::<u64>(),
        counts.area.values().sum::<u64>(),
        counts.cluster.values().sum::<u64>(),
        counts.quad.values().sum::<u64>(),
    ] {
        assert_eq!(sum, total);
    }
}
