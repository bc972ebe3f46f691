//! stockindex command-line interface
//!
//! Drives a product index from the terminal:
//! - Interactive or piped command shell
//! - Sample-data demo of probing, collisions and cluster rehash
//! - Effective configuration and prometheus metrics dumps
//!
//! # Examples
//!
//! ```bash
//! # Start a shell on a 50-slot table
//! STOCKINDEX_CAPACITY=50 stockindex shell
//!
//! # Replay a command script, printing JSON replies
//! stockindex shell --json < commands.txt
//!
//! # Show the demo walkthrough
//! stockindex demo
//! ```

use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use stockindex::index::SortKey;
use stockindex::observe::{IndexObserver, MetricsObserver, TracingObserver};
use stockindex::shell::{Reply, Response, Shell};
use stockindex::{IndexConfig, ProductIndex};
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// stockindex - open-addressing product index
#[derive(Parser, Debug)]
#[command(name = "stockindex")]
#[command(version = stockindex::VERSION)]
#[command(about = "Fixed-capacity product index with linear probing", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "STOCKINDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Log directory path
    #[arg(long, global = true, default_value = "logs", env = "STOCKINDEX_LOG_DIR")]
    log_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read index commands from stdin, one per line
    Shell(ShellArgs),

    /// Seed sample products and walk through probing and deletion
    Demo,

    /// Print the effective configuration as TOML
    Config,

    /// Run the demo and print prometheus metrics
    Metrics,

    /// Show version
    Version,
}

/// Shell arguments
#[derive(Args, Debug)]
struct ShellArgs {
    /// Print replies as JSON lines
    #[arg(long)]
    json: bool,

    /// Seed the sample products before reading commands
    #[arg(long)]
    seed: bool,

    /// Stop at the first failing command
    #[arg(long)]
    fail_fast: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli)?;

    let config = IndexConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Shell(args) => shell_command(config, args),
        Commands::Demo => demo_command(config, TracingObserver),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Metrics => metrics_command(config),
        Commands::Version => {
            println!("stockindex {}", stockindex::VERSION);
            Ok(())
        }
    }
}

/// Setup logging with rolling files and console output
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    std::fs::create_dir_all(&cli.log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &cli.log_dir, "stockindex.log");

    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color)
                .compact(),
        )
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}

fn print_response(response: &Response, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(response)?);
        return Ok(());
    }

    if response.reply != Reply::Blank {
        println!("{}", response.reply);
    }
    if let Some(event) = &response.event {
        println!(
            "  [{} {}: probes={} home={} slot={} rehashed={} time={}µs]",
            event.operation,
            event.outcome.as_str(),
            event.probes,
            event
                .home_slot
                .map_or_else(|| "-".to_string(), |s| s.to_string()),
            event.slot.map_or_else(|| "-".to_string(), |s| s.to_string()),
            event.rehashed,
            event.elapsed.as_micros()
        );
    }
    Ok(())
}

/// Shell command - read and execute commands from stdin
fn shell_command(mut config: IndexConfig, args: ShellArgs) -> anyhow::Result<()> {
    config.seed_samples |= args.seed;
    info!(capacity = config.capacity, seeded = config.seed_samples, "Starting index shell");

    let mut shell = Shell::new(&config, TracingObserver)?;
    let stdin = io::stdin();
    let mut failures = 0usize;

    for line in stdin.lock().lines() {
        let line = line?;
        match shell.execute(&line) {
            Ok(response) => print_response(&response, args.json)?,
            Err(e) => {
                failures += 1;
                if args.json {
                    println!("{}", serde_json::json!({ "error": e.to_string() }));
                } else {
                    println!("ERROR: {}", e);
                }
                if args.fail_fast {
                    error!(error = %e, line = %line, "Aborting on failed command");
                    anyhow::bail!("command failed: {}", e);
                }
            }
        }
        io::stdout().flush()?;
    }

    if failures > 0 {
        warn!(failures, "Shell finished with failed commands");
    }
    Ok(())
}

/// Demo command - seed sample data and exercise every operation
fn demo_command<O>(config: IndexConfig, observer: O) -> anyhow::Result<()>
where
    O: IndexObserver + 'static,
{
    let config = IndexConfig {
        seed_samples: true,
        ..config
    };
    let mut index = ProductIndex::from_config(&config, observer)?;
    println!("Seeded {} products into {} slots", index.len(), index.capacity());

    // Anagram of A-100, so it collides and probes forward
    let home = index.home_slot("A-010");
    index.insert_or_update("A-010", "Trackball Mouse", 12)?;
    println!(
        "A-010 hashes to slot {} and lands at {:?}",
        home,
        index.slot_of("A-010")
    );

    println!("\nLabel search 'mouse':");
    for record in index.linear_search_by_label("mouse") {
        println!("  {}", record);
    }

    println!("\nRange A..M (sorted by label):");
    for record in index.range_scan("A", "M")? {
        println!("  {}", record);
    }

    let deleted = index.delete("A-100");
    println!(
        "\nDeleted A-100: {}; A-010 now at {:?}",
        deleted,
        index.slot_of("A-010")
    );
    println!("Deleting Z-999: {}", index.delete("Z-999"));

    println!("\nAll items sorted by key:");
    for record in index.sorted_view(SortKey::Key) {
        println!("  {}", record);
    }

    index.check_invariants()?;
    let stats = index.stats();
    println!(
        "\n{}/{} slots used, {} displaced, longest cluster {}",
        stats.len, stats.capacity, stats.displaced, stats.longest_cluster
    );
    Ok(())
}

/// Metrics command - run the demo against a prometheus observer
fn metrics_command(config: IndexConfig) -> anyhow::Result<()> {
    let metrics = MetricsObserver::new()?;
    demo_command(config, (metrics.clone(), TracingObserver))?;
    println!();
    print!("{}", metrics.export()?);
    Ok(())
}
