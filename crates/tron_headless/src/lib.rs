//! Headless arena runner for scripted matches and CI verification.
//!
//! This crate drives [`tron_core`] without any graphics:
//!
//! - **Scripted matches**: built-in pilots play complete rounds
//! - **Batch sweeps**: many seeded matches in parallel, with win-rate summaries
//! - **Determinism checks**: the same seed must always produce the same hash
//! - **Replays**: record, play back and verify intent streams
//! - **Interactive mode**: an external controller steers agents over a JSON
//!   line protocol (stdin/stdout, logs on stderr)
//!
//! See the [`protocol`] module for the command/response specification.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ascii;
pub mod batch;
pub mod pilots;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use ascii::{render, AsciiConfig};
pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary};
pub use pilots::{Pilot, PilotSpec};
pub use protocol::{Command, Response};
pub use runner::{run_match, InteractiveSession, MatchConfig, MatchReport, RunnerError};
pub use scenario::{CycleSetup, Scenario, ScenarioError};
