//! Headless light-cycle match runner.
//!
//! # Usage
//!
//! ```bash
//! # Play one scripted match with ASCII output
//! cargo run -p tron_headless -- run --scenario duel --ascii
//!
//! # Sweep 1000 seeded matches and write win rates
//! cargo run -p tron_headless -- batch --scenario free_for_all --count 1000 --output results/batch.json
//!
//! # Verify determinism of a seed
//! cargo run -p tron_headless -- verify --scenario free_for_all --seed 12345 --runs 5
//!
//! # Record and later verify a replay
//! cargo run -p tron_headless -- run --scenario duel --record duel.replay
//! cargo run -p tron_headless -- replay --file duel.replay --verify
//!
//! # Drive a match over the JSON line protocol
//! cargo run -p tron_headless -- interactive --scenario duel
//! ```
//!
//! Logs go to stderr; stdout carries protocol and report output only.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tron_core::replay::Replay;
use tron_headless::{
    ascii,
    batch::{run_batch, BatchConfig},
    runner::{run_match, run_match_with, InteractiveSession, MatchConfig, RunnerError},
    scenario::{Scenario, ScenarioError},
};

#[derive(Parser)]
#[command(name = "tron_headless")]
#[command(about = "Headless light-cycle match runner for testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one scripted match
    Run {
        /// Built-in scenario name or path to a RON file
        #[arg(short, long)]
        scenario: Option<String>,

        /// Match seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Render the arena as ASCII after every tick
        #[arg(long)]
        ascii: bool,

        /// Disable colored ASCII output
        #[arg(long)]
        no_color: bool,

        /// Record a replay to this file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Run a batch of seeded matches in parallel
    Batch {
        /// Built-in scenario name or path to a RON file
        #[arg(short, long, default_value = "free_for_all")]
        scenario: String,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Output JSON file for results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Built-in scenario name or path to a RON file
        #[arg(short, long, default_value = "free_for_all")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Play back a recorded replay
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Re-simulate and verify the recorded hash
        #[arg(long)]
        verify: bool,
    },

    /// Drive a match over the JSON line protocol on stdin/stdout
    Interactive {
        /// Built-in scenario name or path to a RON file
        #[arg(short, long)]
        scenario: Option<String>,
    },

    /// Step a scenario repeatedly and report ticks per second
    Bench {
        /// Built-in scenario name or path to a RON file
        #[arg(short, long, default_value = "free_for_all")]
        scenario: String,

        /// Total ticks to simulate across matches
        #[arg(short, long, default_value = "100000")]
        ticks: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logging goes to stderr; stdout is for protocol and report output
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            seed,
            ascii,
            no_color,
            record,
        } => cmd_run(scenario.as_deref(), seed, ascii, no_color, record),
        Commands::Batch {
            scenario,
            count,
            parallel,
            seed,
            output,
        } => cmd_batch(&scenario, count, parallel, seed, output),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(&scenario, seed, runs),
        Commands::Replay { file, verify } => cmd_replay(&file, verify),
        Commands::Interactive { scenario } => cmd_interactive(scenario.as_deref()),
        Commands::Bench { scenario, ticks } => cmd_bench(&scenario, ticks),
    };

    if let Err(err) = result {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

/// Resolve a scenario argument: built-in name, RON file path, or the
/// default duel when absent.
fn load_scenario(arg: Option<&str>) -> Result<Scenario, ScenarioError> {
    match arg {
        None => Ok(Scenario::default()),
        Some(name) => match Scenario::builtin(name) {
            Some(scenario) => Ok(scenario),
            None => Scenario::load(name),
        },
    }
}

fn cmd_run(
    scenario: Option<&str>,
    seed: u64,
    show_ascii: bool,
    no_color: bool,
    record: Option<PathBuf>,
) -> Result<(), RunnerError> {
    let scenario = load_scenario(scenario)?;
    let mut config = MatchConfig::new(scenario, seed);
    if record.is_some() {
        config = config.with_replay();
    }

    let ascii_config = ascii::AsciiConfig {
        use_color: !no_color,
        show_legend: true,
    };

    let (report, replay) = if show_ascii {
        run_match_with(&config, |snapshot| {
            println!("{}", ascii::render(snapshot, &ascii_config));
        })?
    } else {
        run_match(&config)?
    };

    if let (Some(path), Some(replay)) = (record, replay) {
        replay.save(&path)?;
        tracing::info!(path = %path.display(), "replay saved");
    }

    println!("{}", serde_json::to_string_pretty(&report).map_err(io_err)?);
    Ok(())
}

fn cmd_batch(
    scenario: &str,
    count: u32,
    parallel: u32,
    seed: u64,
    output: Option<PathBuf>,
) -> Result<(), RunnerError> {
    let scenario = load_scenario(Some(scenario))?;
    let config = BatchConfig {
        match_count: count,
        parallel,
        seed_start: seed,
        output,
    };

    let results = run_batch(&scenario, &config)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&results.summary).map_err(io_err)?
    );
    Ok(())
}

fn cmd_verify(scenario: &str, seed: u64, runs: u32) -> Result<(), RunnerError> {
    let scenario = load_scenario(Some(scenario))?;

    let mut hashes = Vec::with_capacity(runs as usize);
    for _ in 0..runs {
        let (report, _) = run_match(&MatchConfig::new(scenario.clone(), seed))?;
        hashes.push(report.final_hash);
    }

    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    println!(
        "seed {seed}: {runs} runs, {} unique hash(es) -> {}",
        {
            let mut unique = hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            unique.len()
        },
        if deterministic {
            "deterministic"
        } else {
            "NON-DETERMINISTIC"
        }
    );

    if deterministic {
        Ok(())
    } else {
        Err(tron_core::error::GameError::InvalidState(format!(
            "seed {seed} produced diverging hashes: {hashes:?}"
        ))
        .into())
    }
}

fn cmd_replay(file: &std::path::Path, verify: bool) -> Result<(), RunnerError> {
    let replay = Replay::load(file)?;
    println!(
        "replay '{}': {} frames, {} ticks, final hash {}",
        replay.scenario_id,
        replay.frame_count(),
        replay.duration(),
        replay.final_hash
    );

    if verify {
        replay.verify()?;
        println!("verification passed");
    }
    Ok(())
}

fn cmd_interactive(scenario: Option<&str>) -> Result<(), RunnerError> {
    let scenario = load_scenario(scenario)?;
    let session = InteractiveSession::new(&scenario)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    session.run(stdin.lock(), stdout.lock())
}

fn cmd_bench(scenario: &str, ticks: u64) -> Result<(), RunnerError> {
    let scenario = load_scenario(Some(scenario))?;

    let start = std::time::Instant::now();
    let mut simulated = 0u64;
    let mut seed = 0u64;
    while simulated < ticks {
        let (report, _) = run_match(&MatchConfig::new(scenario.clone(), seed))?;
        simulated += report.ticks.max(1);
        seed += 1;
    }
    let elapsed = start.elapsed();

    println!(
        "{simulated} ticks over {seed} matches in {:.2}s ({:.0} ticks/s)",
        elapsed.as_secs_f64(),
        simulated as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}

fn io_err(err: serde_json::Error) -> std::io::Error {
    std::io::Error::other(err)
}
