//! Popular-path mining CLI.
//!
//! Provides the `popath` binary: ingests an access log (a file, or `-` for
//! standard input), then prints the most popular paths per visitor, or for
//! a single visitor, as a text report or as JSON.
//!
//! `--parse-times` and `--eval-times` repeat the ingest and the query for
//! rough timing; only the first query result is printed.

mod report;

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use popath_core::{ingest, CoreError, IngestError, PathMiner, PathsByOwner, Strategy, DEFAULT_PATH_DEPTH};

const DEFAULT_TOP_N: usize = 3;

/// Mine the most popular navigation paths from an access log.
#[derive(Parser, Debug)]
#[command(name = "popath", version, about = "Mine the most popular navigation paths from an access log")]
struct Cli {
    /// Access log with one `USER<whitespace>NODE` record per line, or `-` for stdin.
    #[arg(value_name = "ACCESS_LOG")]
    access_log: String,

    /// Only report this visitor.
    #[arg(value_name = "USER")]
    user: Option<String>,

    /// Book paths while ingesting (assumes each visitor's walk is a DAG).
    #[arg(long, env = "POPATH_BOOKED")]
    booked: bool,

    /// Number of nodes per path.
    #[arg(short, long, env = "POPATH_DEPTH", default_value_t = DEFAULT_PATH_DEPTH)]
    depth: usize,

    /// Number of paths reported per visitor.
    #[arg(short = 'n', long, env = "POPATH_TOP", default_value_t = DEFAULT_TOP_N)]
    top: usize,

    /// Ingest the access log this many times, keeping the last graph.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    parse_times: u32,

    /// Evaluate popular paths this many times, printing the first result.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    eval_times: u32,

    /// Print the result as JSON instead of the text report.
    #[arg(long)]
    json: bool,
}

/// Why a run failed.
#[derive(Debug)]
enum Failure {
    Core(CoreError),
    Io { source: String, error: io::Error },
}

impl Failure {
    /// Exit code: 1 = usage or core error, 3 = I/O error.
    fn exit_code(&self) -> i32 {
        match self {
            Failure::Core(_) => 1,
            Failure::Io { .. } => 3,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Core(e) => write!(f, "{e}"),
            Failure::Io { source, error } => write!(f, "reading access log {source} failed: {error}"),
        }
    }
}

impl From<CoreError> for Failure {
    fn from(e: CoreError) -> Self {
        Failure::Core(e)
    }
}

/// Where records are read from. Standard input can only be consumed once,
/// so it is buffered for repeated ingests.
enum AccessLog {
    File(PathBuf),
    Stdin(Vec<u8>),
}

impl AccessLog {
    fn open(arg: &str) -> Result<Self, Failure> {
        let arg = arg.trim();
        if arg == "-" {
            let mut buffer = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut buffer)
                .map_err(|error| Failure::Io {
                    source: "stdin".to_string(),
                    error,
                })?;
            Ok(AccessLog::Stdin(buffer))
        } else {
            Ok(AccessLog::File(PathBuf::from(arg)))
        }
    }

    fn name(&self) -> String {
        match self {
            AccessLog::File(path) => path.display().to_string(),
            AccessLog::Stdin(_) => "stdin".to_string(),
        }
    }

    fn reader(&self) -> Result<Box<dyn BufRead + '_>, Failure> {
        match self {
            AccessLog::File(path) => {
                let file = File::open(path).map_err(|error| Failure::Io {
                    source: self.name(),
                    error,
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            AccessLog::Stdin(buffer) => Ok(Box::new(Cursor::new(buffer.as_slice()))),
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            process::exit(code);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    if let Err(failure) = run(&cli) {
        tracing::error!("{failure}");
        process::exit(failure.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), Failure> {
    let strategy = if cli.booked {
        Strategy::Booked { depth: cli.depth }
    } else {
        Strategy::OnDemand
    };
    tracing::debug!(?strategy, "strategy selected");

    let source = AccessLog::open(&cli.access_log)?;

    let started = Instant::now();
    let mut miner = load(strategy, &source)?;
    for _ in 1..cli.parse_times {
        miner = load(strategy, &source)?;
    }
    tracing::info!(
        times = cli.parse_times,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "access log parsed"
    );

    warn_on_cycles(&miner);

    let started = Instant::now();
    for round in 0..cli.eval_times {
        let result = evaluate(&miner, cli)?;
        if round == 0 {
            print_result(&result, cli.json);
        } else {
            println!("Skip same output.");
        }
    }
    tracing::info!(
        times = cli.eval_times,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "popular paths evaluated"
    );
    Ok(())
}

/// Builds a fresh miner from one pass over the access log.
fn load(strategy: Strategy, source: &AccessLog) -> Result<PathMiner, Failure> {
    let miner = PathMiner::new(strategy)?;
    let reader = source.reader()?;
    match ingest(&miner, reader) {
        Ok(_) => Ok(miner),
        Err(IngestError::Core(e)) => Err(Failure::Core(e)),
        Err(IngestError::Io(error)) => Err(Failure::Io {
            source: source.name(),
            error,
        }),
    }
}

/// Booked results assume every visitor's walk is a DAG.
fn warn_on_cycles(miner: &PathMiner) -> usize {
    if miner.strategy() == Strategy::OnDemand {
        return 0;
    }
    let graph = miner.graph();
    let mut cyclic = 0;
    for (owner, id) in graph.owners() {
        if !graph.is_acyclic(id) {
            tracing::warn!(owner, "visitor walk contains a cycle, booked paths assume a DAG");
            cyclic += 1;
        }
    }
    cyclic
}

fn evaluate(miner: &PathMiner, cli: &Cli) -> Result<PathsByOwner, Failure> {
    match cli.user.as_deref().map(str::trim) {
        Some(user) => {
            let paths = miner.popular_paths(cli.depth, cli.top, user)?;
            Ok(PathsByOwner::from([(user.to_string(), paths)]))
        }
        None => Ok(miner.all_popular_paths(cli.depth, cli.top)?),
    }
}

fn print_result(result: &PathsByOwner, json: bool) {
    if json {
        let json = serde_json::to_string_pretty(result)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize result: {}\"}}", e));
        println!("{}", json);
    } else {
        print!("{}", report::render(result));
    }
}
