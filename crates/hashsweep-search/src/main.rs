//! hashsweep CLI - distributed brute-force digest search.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use hashsweep_core::{HashScheme, SearchSpace};
use hashsweep_search::{ClusterConfig, Coordinator, SearchConfig, SearchReport};
use std::io;
use tracing_subscriber::EnvFilter;

/// Brute-force search for the string behind a digest.
///
/// Enumerates every string over a contiguous ASCII range within the length
/// bounds, split across a pool of workers, and stops at the first match.
#[derive(Parser, Debug)]
#[command(name = "hashsweep")]
#[command(version, about, long_about = None)]
#[command(subcommand_negates_reqs = true)]
#[command(after_help = "Example:\n  hashsweep --hash-function MD5 --min 4 97d986e2afa2c72986972e6433fbeaf9")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Hash function: MD5, SHA-512, or shadow (SHA-512-crypt).
    #[arg(long = "hash-function", value_name = "NAME", required = true, value_parser = parse_scheme)]
    hash_function: Option<HashScheme>,

    /// String to use as a salt (prefix for MD5/SHA-512, crypt salt for shadow).
    #[arg(long)]
    salt: Option<String>,

    /// Minimum characters for test strings.
    #[arg(long, visible_alias = "min_characters", default_value_t = 4)]
    min: usize,

    /// Maximum characters for test strings.
    #[arg(long, visible_alias = "max_characters", default_value_t = 9)]
    max: usize,

    /// ASCII character to begin checking with.
    #[arg(long = "ascii-start", value_name = "CHAR", default_value = " ", value_parser = parse_ascii_char)]
    ascii_start: u8,

    /// ASCII character to end checking with.
    #[arg(long = "ascii-end", value_name = "CHAR", default_value = "~", value_parser = parse_ascii_char)]
    ascii_end: u8,

    /// Estimate running time for this job before searching.
    #[arg(long)]
    benchmark: bool,

    /// Number of workers (defaults to the number of CPUs).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Output results as JSON.
    #[arg(long)]
    json: bool,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Target digest: hex for MD5/SHA-512, the encoded field or full `$6$` string for shadow.
    #[arg(value_name = "HASH", required = true)]
    hash: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_scheme(s: &str) -> Result<HashScheme, String> {
    s.parse().map_err(|e: hashsweep_core::HashsweepError| e.to_string())
}

fn parse_ascii_char(s: &str) -> Result<u8, String> {
    match s.as_bytes().first() {
        Some(&b) if b.is_ascii() => Ok(b),
        Some(_) => Err(format!("{s:?} does not start with an ASCII character")),
        None => Err("a character is required".to_string()),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Build the search configuration from parsed arguments.
fn build_config(args: &Cli) -> Result<(SearchConfig, ClusterConfig), Box<dyn std::error::Error>> {
    let scheme = args
        .hash_function
        .ok_or("--hash-function is required")?;
    let hash = args.hash.as_deref().ok_or("a target hash is required")?;

    let space = SearchSpace::new(args.min, args.max, args.ascii_start, args.ascii_end);
    let mut config = SearchConfig::from_target_str(scheme, hash)?
        .with_space(space)
        .with_benchmark(args.benchmark);
    if let Some(ref salt) = args.salt {
        config = config.with_salt(salt.as_bytes());
    }

    let cluster = match args.workers {
        Some(workers) => ClusterConfig::with_workers(workers),
        None => ClusterConfig::default(),
    };
    Ok((config, cluster))
}

fn print_report(args: &Cli, report: &SearchReport) -> Result<(), Box<dyn std::error::Error>> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if let Some(estimate) = report.estimate {
        println!();
        println!("{estimate}");
        println!();
    }

    match report.outcome.winning_candidate {
        Some(ref answer) if report.outcome.found => println!("The answer is: {answer}"),
        _ => println!("Unable to find the answer"),
    }

    if args.verbose {
        eprintln!();
        eprintln!("Statistics:");
        for worker in &report.workers {
            let range = worker.first_chars.map_or_else(
                || "(idle)".to_string(),
                |(lo, hi)| format!("{:?}..={:?}", char::from(lo), char::from(hi)),
            );
            eprintln!(
                "  worker {:>3}  {:<14} {:>14} candidates  {:.3}s",
                worker.rank, range, worker.candidates_tested, worker.elapsed_secs
            );
        }
        eprintln!("  Total time: {:.3}s", report.elapsed_secs);
    }
    Ok(())
}

fn run(args: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (config, cluster) = build_config(args)?;

    if args.verbose && !args.json {
        eprintln!("Configuration:");
        eprintln!("  Hash function: {}", config.scheme);
        eprintln!(
            "  Lengths: {}..={}",
            config.space.min_length, config.space.max_length
        );
        eprintln!(
            "  Characters: {:?}..={:?}",
            char::from(config.space.char_low),
            char::from(config.space.char_high)
        );
        eprintln!("  Workers: {}", cluster.workers);
        eprintln!();
    }

    let report = Coordinator::new(config, cluster)?.run()?;
    print_report(args, &report)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    // Handle completions subcommand
    if let Some(Commands::Completions { shell }) = &args.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "hashsweep", &mut io::stdout());
        return Ok(());
    }

    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}
