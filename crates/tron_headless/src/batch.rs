//! Batch match runner for pilot win-rate sweeps.
//!
//! Runs many matches in parallel with rayon, one seed per match, and
//! aggregates outcomes into a summary that can be saved as JSON.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::runner::{run_match, MatchConfig, MatchReport, RunnerError};
use crate::scenario::Scenario;

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of matches to run.
    pub match_count: u32,
    /// Maximum parallel matches (0 = rayon default).
    pub parallel: u32,
    /// Starting seed; match `i` runs with `seed_start + i`.
    pub seed_start: u64,
    /// Where to write results, if anywhere.
    pub output: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            match_count: 100,
            parallel: 0,
            seed_start: 0,
            output: None,
        }
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches played.
    pub matches: u32,
    /// Matches ending in a draw.
    pub draws: u32,
    /// Win counts keyed by pilot name.
    pub wins_by_pilot: BTreeMap<String, u32>,
    /// Mean ticks per match.
    pub average_ticks: f64,
    /// Shortest match.
    pub min_ticks: u64,
    /// Longest match.
    pub max_ticks: u64,
}

impl BatchSummary {
    fn from_reports(reports: &[MatchReport]) -> Self {
        let mut draws = 0u32;
        let mut wins_by_pilot: BTreeMap<String, u32> = BTreeMap::new();
        let mut total_ticks = 0u64;
        let mut min_ticks = u64::MAX;
        let mut max_ticks = 0u64;

        for report in reports {
            total_ticks += report.ticks;
            min_ticks = min_ticks.min(report.ticks);
            max_ticks = max_ticks.max(report.ticks);
            match report.winner_pilot() {
                Some(pilot) => *wins_by_pilot.entry(pilot.to_string()).or_insert(0) += 1,
                None => draws += 1,
            }
        }

        let matches = reports.len() as u32;
        Self {
            matches,
            draws,
            wins_by_pilot,
            average_ticks: if reports.is_empty() {
                0.0
            } else {
                total_ticks as f64 / f64::from(matches)
            },
            min_ticks: if reports.is_empty() { 0 } else { min_ticks },
            max_ticks,
        }
    }
}

/// Results of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name.
    pub scenario: String,
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual match reports in seed order.
    pub reports: Vec<MatchReport>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock runtime.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or the write fails.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or parse fails.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of matches over a seed range.
///
/// # Errors
///
/// Fails fast on the first match error; a batch with a broken scenario is
/// not worth finishing.
pub fn run_batch(scenario: &Scenario, config: &BatchConfig) -> Result<BatchResults, RunnerError> {
    scenario.validate()?;
    let start = Instant::now();
    info!(
        scenario = %scenario.name,
        matches = config.match_count,
        seed_start = config.seed_start,
        "starting batch"
    );

    let run_all = || -> Result<Vec<MatchReport>, RunnerError> {
        (0..config.match_count)
            .into_par_iter()
            .map(|i| {
                let match_config =
                    MatchConfig::new(scenario.clone(), config.seed_start + u64::from(i));
                run_match(&match_config).map(|(report, _)| report)
            })
            .collect()
    };

    let reports = if config.parallel > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel as usize)
            .build()
            .map_err(|e| {
                tron_core::error::GameError::InvalidState(format!("thread pool: {e}"))
            })?;
        pool.install(run_all)?
    } else {
        run_all()?
    };

    let summary = BatchSummary::from_reports(&reports);
    let results = BatchResults {
        scenario: scenario.name.clone(),
        config: config.clone(),
        reports,
        summary,
        duration_seconds: start.elapsed().as_secs_f64(),
    };

    info!(
        matches = results.summary.matches,
        draws = results.summary.draws,
        avg_ticks = results.summary.average_ticks,
        "batch finished"
    );

    if let Some(path) = &config.output {
        results.save(path).map_err(RunnerError::Io)?;
    }

    Ok(results)
}
