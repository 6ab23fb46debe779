#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the doc_bench load-generation harness.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;
use doc_bench::{BenchConfig, ConfigOverrides, Operation, RunInput, run};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "doc_bench=info,bulk_bench=info";

/// Drives bulk document create, read and update requests at a fixed concurrency and reports
/// the throughput of every step.
#[derive(FromArgs)]
struct Args {
    /// TOML file providing defaults for the options below
    #[argh(option)]
    config: Option<PathBuf>,

    /// store endpoint, may be repeated
    #[argh(option)]
    endpoint: Vec<String>,

    /// database name (default: benchmark)
    #[argh(option)]
    database: Option<String>,

    /// collection name (default: benchmark)
    #[argh(option)]
    collection: Option<String>,

    /// number of worker threads (default: 2)
    #[argh(option)]
    threads: Option<usize>,

    /// number of documents per bulk request (default: 32)
    #[argh(option)]
    bulk: Option<usize>,

    /// simulated latency of every store request in milliseconds (default: 0)
    #[argh(option)]
    latency_ms: Option<u64>,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Generate(GenerateArgs),
    Perf(PerfArgs),
    Roundtrip(RoundtripArgs),
}

/// Create new documents and write their keys to a file.
#[derive(FromArgs)]
#[argh(subcommand, name = "generate")]
struct GenerateArgs {
    /// number of documents to create
    #[argh(option, default = "1024")]
    count: usize,

    /// file that receives the document keys
    #[argh(option, default = "PathBuf::from(\"./output\")")]
    output: PathBuf,
}

/// Read, modify and write back the documents listed in a file. Every process starts with an
/// empty store, so this fails on keys written by a separate `generate` run; use `roundtrip` to
/// create and modify documents in one process.
#[derive(FromArgs)]
#[argh(subcommand, name = "perf")]
struct PerfArgs {
    /// file with one document key per line
    #[argh(option)]
    file: PathBuf,

    /// JSON object merged into every document
    #[argh(option, default = "String::from(\"{}\")")]
    modification: String,
}

/// Generate documents, then read, modify and write them back.
#[derive(FromArgs)]
#[argh(subcommand, name = "roundtrip")]
struct RoundtripArgs {
    /// number of documents to create
    #[argh(option, default = "1024")]
    count: usize,

    /// file that receives the document keys
    #[argh(option, default = "PathBuf::from(\"./output\")")]
    output: PathBuf,

    /// JSON object merged into every document
    #[argh(option, default = "String::from(\"{}\")")]
    modification: String,
}

impl From<Command> for Operation {
    fn from(command: Command) -> Self {
        match command {
            Command::Generate(args) => Self::Generate {
                count: args.count,
                output: args.output,
            },
            Command::Perf(args) => Self::Perf {
                keys_file: args.file,
                modification: args.modification,
            },
            Command::Roundtrip(args) => Self::Roundtrip {
                count: args.count,
                output: args.output,
                modification: args.modification,
            },
        }
    }
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    let args: Args = argh::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let mut overrides = ConfigOverrides::default();
    overrides.endpoints = args.endpoint;
    overrides.database = args.database;
    overrides.collection = args.collection;
    overrides.threads = args.threads;
    overrides.bulk = args.bulk;
    overrides.latency_ms = args.latency_ms;

    let config = match BenchConfig::resolve(args.config.as_deref(), overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let input = RunInput {
        config,
        operation: args.command.into(),
    };

    let mut stdout = io::stdout().lock();

    let result = run(&input, |step_report| {
        // A closed stdout is not a benchmark failure.
        _ = writeln!(stdout, "{}", step_report.step);
        _ = writeln!(stdout, "{}", step_report.report);
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
