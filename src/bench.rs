//! The benchmark harness.
//!
//! A benchmark run has two **phases**. The load phase inserts `recordcount` records; the
//! transaction phase then runs `operationcount` transactions drawn from the workload mix. Each
//! phase is split evenly over `threads` workers, and each worker owns a store handle and an RNG
//! while sharing one [`CoreWorkload`].
//!
//! ## Configuration Format
//!
//! A benchmark file is formatted in TOML and has three sections:
//!
//! ```toml
//! [store]
//! name = "btreemap"
//! # store options, see crate::stores
//!
//! [benchmark]
//! threads = 4
//! # harness options, see BenchmarkOpt
//!
//! [workload]
//! recordcount = 100000
//! operationcount = 100000
//! # workload properties, see crate::workload
//! ```
//!
//! The store section and the rest usually live in separate files that are concatenated by the
//! command line (see [`crate::cmdline()`]). Any value can be overridden from the environment with
//! the `YCSB_` prefix and `__` as the section separator, e.g. `YCSB_WORKLOAD__RECORDCOUNT=1000` or
//! `YCSB_BENCHMARK__THREADS=8`.
//!
//! ## Output Format
//!
//! All outputs are in plain text, one line per entry, to be easily processed by shell scripts.
//! After each phase, a summary line is printed:
//!
//! ```txt
//! phase load store btreemap threads 4 duration 0.52 total 100000 executed 100000 ok 100000 ktps 192.31
//! phase run store btreemap threads 4 duration 0.61 total 100000 executed 100000 ok 99876 ktps 163.93
//! ```
//!
//! Where:
//!
//! - `phase`: `load` or `run` (the transaction phase).
//! - `store`: the `name` of the `[store]` section.
//! - `threads`: the number of workers.
//! - `duration`: seconds from the moment all workers are ready until the last one is joined.
//! - `total`: operations requested for the phase.
//! - `executed`: operations actually executed. It is `total` rounded down to a multiple of
//! `threads`, as every worker runs the same number of operations.
//! - `ok`: operations the store reported as successful.
//! - `ktps`: thousand executed operations per second.
//!
//! When `latency` is `true`, the latency metrics of all operations in the phase are appended to the
//! summary line, in microseconds:
//!
//! ```txt
//! ... ktps 163.93 min_us 0.05 max_us 100.00 avg_us 5.00 p50_us 4.00 p95_us 9.50 p99_us 19.00 p999_us 50.00
//! ```
//!
//! With `report = "all"` (the default), one line per operation type follows each summary line:
//!
//! ```txt
//! phase run op read executed 95012 ok 95012
//! phase run op update executed 4988 ok 4864
//! ```

use crate::client::Client;
use crate::error::{Error, Result};
use crate::properties::Properties;
use crate::stores::StoreOpt;
use crate::thread::JoinHandle;
use crate::workload::CoreWorkload;
use crate::{Operation, Store};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use hdrhistogram::Histogram;
use log::{debug, info, warn};
use parking_lot::Mutex;
use quanta::Instant;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::fmt::Write;
use std::sync::{Arc, Barrier};
use std::time::Duration;

// {{{ benchmark

/// How the results are printed out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ReportMode {
    /// Nothing is printed.
    Hidden,
    /// One summary line per phase.
    Finish,
    /// The summary line plus one line per operation type.
    All,
}

/// The `[benchmark]` section of a benchmark file.
///
/// The fields are optional to ease parsing from TOML and to allow overrides from the command
/// line; missing fields fall back to their defaults.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BenchmarkOpt {
    /// Number of worker threads in each phase.
    ///
    /// Default: 1.
    pub threads: Option<usize>,

    /// Whether or not to record the latency of each operation. Since measuring time is of extra
    /// cost, enabling latency measurement usually affects the throughput metrics.
    ///
    /// Default: false.
    pub latency: Option<bool>,

    /// Whether or not to pin each worker to a CPU core (worker `i` to core `i`).
    ///
    /// Default: false.
    pub pin: Option<bool>,

    /// Seed of the worker RNGs. Worker `i` of a phase gets its own seed derived from this one, so
    /// a seeded run draws the same keys and operations every time (as long as the store answers
    /// the same way). Without a seed, every worker is seeded from the thread-local RNG.
    pub seed: Option<u64>,

    /// Report mode:
    ///
    /// - "hidden": not reported.
    /// - "finish": one summary line per phase.
    /// - "all": the summary line plus one line per operation type.
    ///
    /// Default: "all".
    pub report: Option<String>,

    /// Skip the load phase, e.g., when the store is already populated.
    ///
    /// Default: false.
    pub skip_load: Option<bool>,
}

impl BenchmarkOpt {
    /// Fill the missing fields of `opt` with the ones in `self`, falling back to the defaults.
    /// Fields set in `self` win, as they come from the command line.
    pub fn apply(&self, opt: &mut BenchmarkOpt) {
        opt.threads = self.threads.or(opt.threads).or(Some(1));
        opt.latency = self.latency.or(opt.latency).or(Some(false));
        opt.pin = self.pin.or(opt.pin).or(Some(false));
        opt.seed = self.seed.or(opt.seed);
        opt.report = self
            .report
            .clone()
            .or_else(|| opt.report.clone())
            .or_else(|| Some("all".to_string()));
        opt.skip_load = self.skip_load.or(opt.skip_load).or(Some(false));
    }
}

/// The harness configuration, with all defaults applied.
#[derive(Debug, PartialEq)]
pub struct Benchmark {
    threads: usize,
    latency: bool,
    pin: bool,
    seed: Option<u64>,
    report: ReportMode,
    skip_load: bool,
}

impl Benchmark {
    /// Options that are still missing take their defaults.
    pub fn new(opt: &BenchmarkOpt) -> Result<Self> {
        let mut opt = opt.clone();
        BenchmarkOpt::default().apply(&mut opt);
        let threads = opt.threads.unwrap_or(1);
        if threads == 0 {
            return Err(Error::InvalidValue {
                key: "threads".to_string(),
                value: threads.to_string(),
                expected: "a positive integer",
            });
        }
        let report = match opt.report.as_deref().unwrap_or("all") {
            "hidden" => ReportMode::Hidden,
            "finish" => ReportMode::Finish,
            "all" => ReportMode::All,
            other => {
                return Err(Error::InvalidValue {
                    key: "report".to_string(),
                    value: other.to_string(),
                    expected: "one of hidden, finish, all",
                })
            }
        };
        Ok(Self {
            threads,
            latency: opt.latency.unwrap_or(false),
            pin: opt.pin.unwrap_or(false),
            seed: opt.seed,
            report,
            skip_load: opt.skip_load.unwrap_or(false),
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }
}

// }}} benchmark

// {{{ measurement

/// The two phases of a run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Load,
    Transaction,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Transaction => "run",
        }
    }
}

/// Executed and successful operations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tally {
    pub executed: u64,
    pub ok: u64,
}

impl Tally {
    fn add(&mut self, ok: bool) {
        self.executed += 1;
        self.ok += ok as u64;
    }

    fn merge(&mut self, other: &Tally) {
        self.executed += other.executed;
        self.ok += other.ok;
    }
}

/// Per-operation tallies of one worker.
#[derive(Clone, Debug, Default)]
struct Tallies([Tally; 5]);

impl Tallies {
    fn add(&mut self, op: Operation, ok: bool) {
        self.0[op.index()].add(ok);
    }
}

/// A latency histogram in nanoseconds.
struct Latency {
    hdr: Histogram<u64>,
}

impl Latency {
    fn new() -> Self {
        // auto-resizing, 3 significant figures
        let hdr = Histogram::new(3).expect("3 significant figures is in range");
        Self { hdr }
    }

    fn record(&mut self, duration: Duration) {
        let ns = duration.as_nanos() as u64;
        assert!(self.hdr.record(ns).is_ok());
    }

    fn merge(&mut self, other: &Latency) {
        assert!(self.hdr.add(&other.hdr).is_ok());
    }
}

/// The metrics of one worker thread. Only written once by the worker, after its last operation.
struct Measurement {
    tallies: Mutex<Tallies>,
    latency: Mutex<Option<Latency>>,
}

impl Measurement {
    fn new() -> Self {
        Self {
            tallies: Mutex::new(Tallies::default()),
            latency: Mutex::new(None),
        }
    }
}

/// The aggregated metrics of a phase.
pub struct PhaseReport {
    pub phase: Phase,
    /// Name of the store the phase ran against.
    pub store: String,
    pub threads: usize,
    /// Operations asked for.
    pub requested: u64,
    /// Operations run, i.e., `requested` rounded down to a multiple of `threads`.
    pub executed: u64,
    /// Operations the store reported as successful.
    pub ok: u64,
    per_op: [Tally; 5],
    pub duration: Duration,
    latency: Option<Histogram<u64>>,
}

impl PhaseReport {
    /// Thousand executed operations per second.
    pub fn ktps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        match secs > 0.0 {
            true => self.executed as f64 / secs / 1000.0,
            false => 0.0,
        }
    }

    pub fn op(&self, op: Operation) -> Tally {
        self.per_op[op.index()]
    }

    pub fn latency(&self) -> Option<&Histogram<u64>> {
        self.latency.as_ref()
    }

    /// The summary line, with latency metrics if they were recorded.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "phase {} store {} threads {} duration {:.2} total {} executed {} ok {} ktps {:.2}",
            self.phase.name(),
            self.store,
            self.threads,
            self.duration.as_secs_f64(),
            self.requested,
            self.executed,
            self.ok,
            self.ktps(),
        );
        if let Some(hdr) = self.latency.as_ref() {
            let _ = write!(
                line,
                " min_us {:.2} max_us {:.2} avg_us {:.2} \
                 p50_us {:.2} p95_us {:.2} p99_us {:.2} p999_us {:.2}",
                hdr.min() as f64 / 1000.0,
                hdr.max() as f64 / 1000.0,
                hdr.mean() / 1000.0,
                hdr.value_at_quantile(0.50) as f64 / 1000.0,
                hdr.value_at_quantile(0.95) as f64 / 1000.0,
                hdr.value_at_quantile(0.99) as f64 / 1000.0,
                hdr.value_at_quantile(0.999) as f64 / 1000.0,
            );
        }
        line
    }

    /// One line per operation type that was executed at least once.
    pub fn breakdown(&self) -> Vec<String> {
        Operation::ALL
            .iter()
            .filter(|op| self.op(**op).executed > 0)
            .map(|op| {
                let t = self.op(*op);
                format!(
                    "phase {} op {} executed {} ok {}",
                    self.phase.name(),
                    op.name(),
                    t.executed,
                    t.ok
                )
            })
            .collect()
    }

    fn print(&self, mode: ReportMode) {
        if mode == ReportMode::Hidden {
            return;
        }
        println!("{}", self.summary());
        if mode == ReportMode::All {
            for line in self.breakdown() {
                println!("{}", line);
            }
        }
    }
}

// }}} measurement

// {{{ bencher

struct WorkerContext {
    store: Arc<dyn Store>,
    workload: Arc<CoreWorkload>,
    phase: Phase,
    id: usize,
    ops: u64,
    pin: bool,
    latency: bool,
    seed: Option<u64>,
    measurement: Arc<Measurement>,
    barrier: Arc<Barrier>,
}

fn worker_rng(seed: Option<u64>, phase: Phase, id: usize) -> SmallRng {
    match seed {
        Some(s) => {
            let phase = match phase {
                Phase::Load => 0u64,
                Phase::Transaction => 1u64,
            };
            SmallRng::seed_from_u64(s.wrapping_add(phase << 32).wrapping_add(id as u64))
        }
        None => SmallRng::from_rng(&mut rand::rng()),
    }
}

fn bench_worker(context: WorkerContext) {
    let WorkerContext {
        store,
        workload,
        phase,
        id,
        ops,
        pin,
        latency,
        seed,
        measurement,
        barrier,
    } = context;

    if pin {
        store.thread().pin(id);
    }

    let rng = worker_rng(seed, phase, id);
    let mut client = Client::new(store.handle(), workload, rng);
    client.init();

    let mut tallies = Tallies::default();
    let mut hist = match latency {
        true => Some(Latency::new()),
        false => None,
    };

    // start the phase at roughly the same time
    barrier.wait();
    for _ in 0..ops {
        let start = hist.as_ref().map(|_| Instant::now());
        let (op, ok) = match phase {
            Phase::Load => (Operation::Insert, client.do_insert()),
            Phase::Transaction => {
                let (op, status) = client.do_transaction_op();
                (op, status.is_ok())
            }
        };
        if let (Some(l), Some(s)) = (hist.as_mut(), start) {
            l.record(s.elapsed());
        }
        tallies.add(op, ok);
    }
    client.cleanup();

    *measurement.tallies.lock() = tallies;
    *measurement.latency.lock() = hist;
}

/// Run one phase of `total` operations and collect its metrics.
///
/// Every worker runs `total / threads` operations; the remainder is dropped.
pub fn run_phase(
    store: &Arc<dyn Store>,
    store_name: &str,
    workload: &Arc<CoreWorkload>,
    benchmark: &Benchmark,
    phase: Phase,
    total: u64,
) -> PhaseReport {
    let threads = benchmark.threads;
    let per_worker = total / threads as u64;
    let dropped = total % threads as u64;
    if dropped != 0 {
        warn!(
            "phase {}: {} operations do not divide over {} threads, {} dropped",
            phase.name(),
            total,
            threads,
            dropped
        );
    }
    info!(
        "phase {} starts: {} threads, {} operations each",
        phase.name(),
        threads,
        per_worker
    );

    // workers plus this thread
    let barrier = Arc::new(Barrier::new(threads + 1));
    let measurements: Vec<Arc<Measurement>> =
        (0..threads).map(|_| Arc::new(Measurement::new())).collect();
    let thread = store.thread();
    let mut handles: Vec<Box<dyn JoinHandle>> = Vec::with_capacity(threads);
    for t in 0..threads {
        let context = WorkerContext {
            store: store.clone(),
            workload: workload.clone(),
            phase,
            id: t,
            ops: per_worker,
            pin: benchmark.pin,
            latency: benchmark.latency,
            seed: benchmark.seed,
            measurement: measurements[t].clone(),
            barrier: barrier.clone(),
        };
        handles.push(thread.spawn(Box::new(move || bench_worker(context))));
    }

    barrier.wait();
    let start = Instant::now();
    for handle in handles.into_iter() {
        handle.join();
    }
    let duration = start.elapsed();

    let mut per_op = [Tally::default(); 5];
    let mut latency = match benchmark.latency {
        true => Some(Latency::new()),
        false => None,
    };
    for m in measurements.iter() {
        for (sum, t) in per_op.iter_mut().zip(m.tallies.lock().0.iter()) {
            sum.merge(t);
        }
        if let (Some(l), Some(other)) = (latency.as_mut(), m.latency.lock().as_ref()) {
            l.merge(other);
        }
    }
    let executed: u64 = per_op.iter().map(|t| t.executed).sum();
    let ok: u64 = per_op.iter().map(|t| t.ok).sum();
    debug!(
        "phase {} finished: executed {} ok {} in {:?}",
        phase.name(),
        executed,
        ok,
        duration
    );

    PhaseReport {
        phase,
        store: store_name.to_string(),
        threads,
        requested: total,
        executed,
        ok,
        per_op,
        duration,
        latency: latency.map(|l| l.hdr),
    }
}

/// Run the load phase (unless skipped) and then the transaction phase, printing the reports.
///
/// The transaction phase runs `operationcount` operations, or `recordcount` if the workload does
/// not set `operationcount`.
pub fn run(
    store: &Arc<dyn Store>,
    store_name: &str,
    workload: &Arc<CoreWorkload>,
    benchmark: &Benchmark,
) -> Vec<PhaseReport> {
    let mut reports = Vec::with_capacity(2);
    if !benchmark.skip_load {
        let report = run_phase(
            store,
            store_name,
            workload,
            benchmark,
            Phase::Load,
            workload.record_count(),
        );
        report.print(benchmark.report);
        reports.push(report);
    }
    let total = workload
        .operation_count()
        .unwrap_or_else(|| workload.record_count());
    let report = run_phase(
        store,
        store_name,
        workload,
        benchmark,
        Phase::Transaction,
        total,
    );
    report.print(benchmark.report);
    reports.push(report);
    reports
}

// }}} bencher

// {{{ init

/// A benchmark file.
#[derive(Deserialize, Clone, Debug)]
struct BenchmarkFileOpt {
    store: StoreOpt,
    benchmark: Option<BenchmarkOpt>,
    workload: Option<toml::Table>,
}

/// Everything a run needs, built and validated.
pub struct Run {
    pub store: Arc<dyn Store>,
    pub store_name: String,
    pub benchmark: Benchmark,
    pub workload: Arc<CoreWorkload>,
}

impl Run {
    pub fn bench(&self) -> Vec<PhaseReport> {
        run(&self.store, &self.store_name, &self.workload, &self.benchmark)
    }
}

/// Build a run from the text of a benchmark file.
pub fn init(text: &str) -> Result<Run> {
    init_with(text, &BenchmarkOpt::default(), &[])
}

/// Build a run from the text of a benchmark file, with command line overrides. Options set in
/// `overrides` replace the `[benchmark]` section's, and `properties` replace workload properties.
pub fn init_with(
    text: &str,
    overrides: &BenchmarkOpt,
    properties: &[(String, String)],
) -> Result<Run> {
    let opt: BenchmarkFileOpt = Figment::new()
        .merge(Toml::string(text))
        .merge(Env::prefixed("YCSB_").split("__"))
        .extract()?;
    debug!("Creating benchmark with the following configurations: {:?}", opt);

    let mut bopt = opt.benchmark.clone().unwrap_or_default();
    overrides.apply(&mut bopt);
    debug!("Command line options applied to benchmark: {:?}", bopt);
    let benchmark = Benchmark::new(&bopt)?;

    let mut props = Properties::from_table(opt.workload.clone().unwrap_or_default());
    for (k, v) in properties.iter() {
        props.set(k, v.as_str());
    }
    let workload = Arc::new(CoreWorkload::new(&props)?);

    let store = crate::stores::new(&opt.store)?;
    Ok(Run {
        store,
        store_name: opt.store.name.clone(),
        benchmark,
        workload,
    })
}

// }}} init

// {{{ tests


// }}} tests
