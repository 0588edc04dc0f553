use crate::bench::{BenchmarkOpt, PhaseReport};
use crate::error::{Error, Result};
use clap::ValueHint::FilePath;
use clap::{Args, Parser, Subcommand};
use log::{debug, LevelFilter};
use std::fs::read_to_string;

fn parse_property(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
        _ => Err(format!("expected key=value, got `{}`", s)),
    }
}

#[derive(Args, Debug)]
struct BenchArgs {
    #[arg(short = 's')]
    #[arg(value_hint = FilePath)]
    #[arg(help = "Path to the store's TOML config file")]
    store_config: String,

    #[arg(short = 'w')]
    #[arg(value_hint = FilePath)]
    #[arg(help = "Path to the workload's TOML config file")]
    workload_config: String,

    #[arg(short = 't')]
    #[arg(help = "Number of worker threads, overrides the config file")]
    threads: Option<usize>,

    #[arg(short = 'p', value_parser = parse_property)]
    #[arg(help = "Override a workload property, e.g., -p recordcount=1000")]
    properties: Vec<(String, String)>,

    #[arg(long)]
    #[arg(help = "Record and report operation latency")]
    latency: bool,

    #[arg(long)]
    #[arg(help = "Skip the load phase")]
    skip_load: bool,
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[arg(short = 'l', global = true)]
    #[arg(help = "Log level (off, error, warn, info, debug, trace), overrides RUST_LOG")]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Load a store and run a workload against it")]
    Bench(BenchArgs),
    #[command(about = "List all registered stores")]
    List,
}

fn read_config(path: &str) -> Result<String> {
    read_to_string(path).map_err(|source| Error::Io {
        path: path.to_string(),
        source,
    })
}

fn bench_cli(args: &BenchArgs) -> Result<Vec<PhaseReport>> {
    let opt = read_config(&args.store_config)? + "\n" + &read_config(&args.workload_config)?;
    let overrides = BenchmarkOpt {
        threads: args.threads,
        latency: args.latency.then_some(true),
        skip_load: args.skip_load.then_some(true),
        ..Default::default()
    };
    let run = crate::bench::init_with(&opt, &overrides, &args.properties)?;
    Ok(run.bench())
}

fn list_cli() {
    for name in crate::stores::names() {
        println!("Registered store: {}", name);
    }
}

/// The default command line interface.
///
/// This function is public and can be called in a different crate. For example, one can integrate
/// their own stores by registering the constructor function. Then, adding this function will
/// produce a benchmark binary that has the same usage as the one in this crate.
///
/// ## Usage
///
/// To get the usage of the command line interface, users can run:
///
/// ```bash
/// ycsb-bench -h
/// ```
///
/// The interface supports two modes, `bench` and `list`.
///
/// ### Benchmark Mode
///
/// Usage:
///
/// ```bash
/// ycsb-bench bench -s <STORE_CONFIG> -w <WORKLOAD_CONFIG> [-t <THREADS>] [-p <KEY=VALUE>]...
/// ```
///
/// Where `STORE_CONFIG` and `WORKLOAD_CONFIG` are the paths to the store and workload
/// configuration files, respectively. The two files are concatenated into one benchmark file; for
/// its format, refer to [`crate::stores`] and [`crate::bench`]. `-t` overrides the number of
/// threads and every `-p` overrides one workload property. `--latency` turns on latency
/// measurement and `--skip-load` skips the load phase.
///
/// Any configuration error is printed and the process exits with status 1 before any worker
/// starts.
///
/// ### List mode
///
/// Usage:
/// ``` bash
/// ycsb-bench list
/// ```
///
/// This command lists all registered stores' names.
///
/// ### Logging
///
/// Logs go to stderr through `env_logger`. The level comes from `RUST_LOG`, or from `-l <LEVEL>`
/// if given.
pub fn cmdline() {
    let cli = Cli::parse();
    let mut logger = env_logger::Builder::from_default_env();
    if let Some(level) = cli.log_level {
        logger.filter_level(level);
    }
    logger.init();
    debug!("Starting ycsb-bench with args: {:?}", cli);
    match cli.command {
        Commands::Bench(args) => {
            if let Err(e) = bench_cli(&args) {
                eprintln!("ycsb-bench: {}", e);
                std::process::exit(1);
            }
        }
        Commands::List => list_cli(),
    }
}
