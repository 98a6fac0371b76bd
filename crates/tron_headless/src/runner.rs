//! Match drivers.
//!
//! [`run_match`] plays one scripted match: pilots read snapshots, the
//! simulation consumes their intents, and the result lands in a
//! [`MatchReport`]. [`InteractiveSession`] instead hands intent control to
//! an external process over the JSON line protocol.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use tron_core::agent::AgentId;
use tron_core::error::GameError;
use tron_core::grid::CellPos;
use tron_core::replay::Replay;
use tron_core::simulation::{IntentMap, Outcome, Simulation};
use tron_core::snapshot::Snapshot;

use crate::pilots::Pilot;
use crate::protocol::{Command, Response, PROTOCOL_VERSION};
use crate::scenario::{Scenario, ScenarioError};

/// Error type for the headless runners.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Error from the simulation core.
    #[error(transparent)]
    Game(#[from] GameError),
    /// Error loading or validating a scenario.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    /// IO failure on the protocol streams.
    #[error("Protocol IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for one scripted match.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Scenario to instantiate.
    pub scenario: Scenario,
    /// Match seed, mixed into every seeded pilot.
    pub seed: u64,
    /// Record an intent-stream replay of the match.
    pub record_replay: bool,
}

impl MatchConfig {
    /// A scripted match for `scenario` with the given seed, no replay.
    #[must_use]
    pub fn new(scenario: Scenario, seed: u64) -> Self {
        Self {
            scenario,
            seed,
            record_replay: false,
        }
    }

    /// Enable replay recording.
    #[must_use]
    pub const fn with_replay(mut self) -> Self {
        self.record_replay = true;
        self
    }
}

/// Per-agent result of a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
    /// Agent id.
    pub agent: AgentId,
    /// Pilot name from the scenario.
    pub pilot: String,
    /// Whether the agent survived the round.
    pub alive: bool,
    /// Tick the agent died at; equal to the final tick for survivors.
    pub survived_ticks: u64,
}

/// Result of one scripted match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    /// Scenario name.
    pub scenario: String,
    /// Match seed.
    pub seed: u64,
    /// Round outcome.
    pub outcome: Outcome,
    /// Ticks played.
    pub ticks: u64,
    /// Final state hash, for cross-run verification.
    pub final_hash: u64,
    /// Per-agent results in ascending id order.
    pub agents: Vec<AgentReport>,
}

impl MatchReport {
    /// Pilot name of the winner, if the round had one.
    #[must_use]
    pub fn winner_pilot(&self) -> Option<&str> {
        match self.outcome {
            Outcome::Winner(id) => self
                .agents
                .iter()
                .find(|report| report.agent == id)
                .map(|report| report.pilot.as_str()),
            _ => None,
        }
    }
}

/// Build the simulation and pilot roster for a scenario.
fn instantiate(
    scenario: &Scenario,
    seed: u64,
) -> Result<(Simulation, Vec<(AgentId, Pilot, String)>), RunnerError> {
    scenario.validate()?;
    let (width, height) = scenario.arena;
    let mut sim = Simulation::new(width, height).with_max_ticks(scenario.max_ticks);

    let mut pilots = Vec::with_capacity(scenario.cycles.len());
    for cycle in &scenario.cycles {
        let id = sim.spawn_agent(CellPos::new(cycle.x, cycle.y), cycle.heading)?;
        pilots.push((id, cycle.pilot.build(seed, id), cycle.pilot.name().to_string()));
    }
    Ok((sim, pilots))
}

/// Play one scripted match to completion.
///
/// # Errors
///
/// Returns an error if the scenario cannot be instantiated or the step
/// surfaces an invariant violation.
pub fn run_match(config: &MatchConfig) -> Result<(MatchReport, Option<Replay>), RunnerError> {
    run_match_with(config, |_| {})
}

/// Play one scripted match, calling `observer` with the snapshot after
/// every tick (and once with the initial state).
///
/// # Errors
///
/// Same as [`run_match`].
pub fn run_match_with(
    config: &MatchConfig,
    mut observer: impl FnMut(&Snapshot),
) -> Result<(MatchReport, Option<Replay>), RunnerError> {
    let (mut sim, mut pilots) = instantiate(&config.scenario, config.seed)?;
    let mut replay = if config.record_replay {
        Some(Replay::new(config.scenario.name.clone(), &sim)?)
    } else {
        None
    };

    let mut died_at: HashMap<AgentId, u64> = HashMap::new();

    loop {
        let snapshot = sim.snapshot();
        observer(&snapshot);
        if snapshot.outcome.is_terminal() {
            break;
        }

        let mut intents = IntentMap::new();
        for (id, pilot, _) in &mut pilots {
            intents.insert(*id, pilot.decide(&snapshot, *id));
        }

        if let Some(replay) = replay.as_mut() {
            replay.record_frame(sim.tick(), &intents);
        }

        let events = sim.step(&intents)?;
        for death in &events.deaths {
            died_at.insert(death.agent, sim.tick());
        }
        debug!(tick = sim.tick(), deaths = events.deaths.len(), "match tick");
    }

    let final_tick = sim.tick();
    let final_hash = sim.state_hash();
    if let Some(replay) = replay.as_mut() {
        replay.finalize(final_tick, final_hash);
    }

    let agents = pilots
        .iter()
        .map(|(id, _, pilot)| AgentReport {
            agent: *id,
            pilot: pilot.clone(),
            alive: sim.agents().get(*id).is_some_and(|agent| agent.alive),
            survived_ticks: died_at.get(id).copied().unwrap_or(final_tick),
        })
        .collect();

    let report = MatchReport {
        scenario: config.scenario.name.clone(),
        seed: config.seed,
        outcome: sim.outcome(),
        ticks: final_tick,
        final_hash,
        agents,
    };
    info!(
        scenario = %report.scenario,
        seed = report.seed,
        ticks = report.ticks,
        outcome = ?report.outcome,
        "match finished"
    );

    Ok((report, replay))
}

/// Interactive match driven over the JSON line protocol.
///
/// Commands arrive one JSON object per line on the input stream; responses
/// leave the same way on the output stream. Intents are ephemeral: a `turn`
/// applies to the next stepped tick only, and ticks beyond the first of a
/// `tick` batch run on defaults.
pub struct InteractiveSession {
    sim: Simulation,
    pending: IntentMap,
}

impl InteractiveSession {
    /// Start a session on a scenario. Scenario pilots are ignored; the
    /// connected controller supplies every intent.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario cannot be instantiated.
    pub fn new(scenario: &Scenario) -> Result<Self, RunnerError> {
        let (sim, _) = instantiate(scenario, 0)?;
        Ok(Self {
            sim,
            pending: IntentMap::new(),
        })
    }

    /// Run the session until `quit`, end of input, or the round ends.
    ///
    /// # Errors
    ///
    /// Returns an error on IO failure or a simulation invariant violation.
    pub fn run(mut self, input: impl BufRead, mut output: impl Write) -> Result<(), RunnerError> {
        Self::send(
            &mut output,
            &Response::Ready {
                version: PROTOCOL_VERSION.to_string(),
                tick: self.sim.tick(),
            },
        )?;

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let command: Command = match serde_json::from_str(&line) {
                Ok(command) => command,
                Err(err) => {
                    Self::send(
                        &mut output,
                        &Response::Error {
                            message: format!("bad command: {err}"),
                        },
                    )?;
                    continue;
                }
            };

            match command {
                Command::Turn {
                    agent,
                    heading,
                    boost,
                } => {
                    if self.sim.agents().contains(agent) {
                        let intent = tron_core::agent::Intent { heading, boost };
                        self.pending.insert(agent, intent);
                    } else {
                        Self::send(
                            &mut output,
                            &Response::Error {
                                message: format!("unknown agent {agent}"),
                            },
                        )?;
                    }
                }
                Command::Tick { count } => {
                    for _ in 0..count.max(1) {
                        // Intents are consumed by the first step of the batch
                        let intents = std::mem::take(&mut self.pending);
                        self.sim.step(&intents)?;
                        if self.sim.outcome().is_terminal() {
                            break;
                        }
                    }
                    Self::send(
                        &mut output,
                        &Response::State {
                            snapshot: self.sim.snapshot(),
                        },
                    )?;
                    if self.sim.outcome().is_terminal() {
                        Self::send(
                            &mut output,
                            &Response::GameOver {
                                outcome: self.sim.outcome(),
                                tick: self.sim.tick(),
                                final_hash: self.sim.state_hash(),
                            },
                        )?;
                        return Ok(());
                    }
                }
                Command::Query => {
                    Self::send(
                        &mut output,
                        &Response::State {
                            snapshot: self.sim.snapshot(),
                        },
                    )?;
                }
                Command::Quit => break,
            }
        }

        Ok(())
    }

    fn send(output: &mut impl Write, response: &Response) -> Result<(), RunnerError> {
        let json = serde_json::to_string(response)
            .map_err(|e| GameError::InvalidState(format!("response encoding failed: {e}")))?;
        writeln!(output, "{json}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pilots::PilotSpec;

    #[test]
    fn test_duel_match_terminates() {
        let config = MatchConfig::new(Scenario::duel(), 1);
        let (report, replay) = run_match(&config).unwrap();

        assert!(report.outcome.is_terminal());
        assert!(report.ticks > 0);
        assert_eq!(report.agents.len(), 2);
        assert!(replay.is_none());
    }

    #[test]
    fn test_match_reports_are_reproducible() {
        let config = MatchConfig::new(Scenario::free_for_all(), 42);
        let (first, _) = run_match(&config).unwrap();
        let (second, _) = run_match(&config).unwrap();

        assert_eq!(first.final_hash, second.final_hash);
        assert_eq!(first.ticks, second.ticks);
        assert_eq!(first.outcome, second.outcome);
    }

    #[test]
    fn test_recorded_replay_verifies() {
        let config = MatchConfig::new(Scenario::free_for_all(), 7).with_replay();
        let (report, replay) = run_match(&config).unwrap();

        let replay = replay.expect("replay was recorded");
        assert_eq!(replay.final_hash, report.final_hash);
        assert_eq!(replay.duration(), report.ticks);
        replay.verify().unwrap();
    }

    #[test]
    fn test_straight_pilots_split_the_round() {
        // Straight pilots on the duel layout drive into opposite walls on
        // the same tick: a draw.
        let mut scenario = Scenario::duel();
        for cycle in &mut scenario.cycles {
            cycle.pilot = PilotSpec::Straight;
        }
        let (report, _) = run_match(&MatchConfig::new(scenario, 0)).unwrap();
        assert_eq!(report.outcome, Outcome::Draw);
    }

    #[test]
    fn test_winner_pilot_lookup() {
        // One wall avoider against a straight pilot: the avoider wins.
        let mut scenario = Scenario::duel();
        scenario.cycles[0].pilot = PilotSpec::Straight;
        let (report, _) = run_match(&MatchConfig::new(scenario, 0)).unwrap();

        assert!(matches!(report.outcome, Outcome::Winner(_)));
        assert_eq!(report.winner_pilot(), Some("wall_avoider"));
    }

    #[test]
    fn test_observer_sees_every_tick() {
        let config = MatchConfig::new(Scenario::duel(), 3);
        let mut snapshots = 0u64;
        let (report, _) = run_match_with(&config, |_| snapshots += 1).unwrap();

        // Initial snapshot plus one per tick
        assert_eq!(snapshots, report.ticks + 1);
    }

    #[test]
    fn test_interactive_session_runs_protocol() {
        let scenario = Scenario::duel();
        let session = InteractiveSession::new(&scenario).unwrap();

        let input = concat!(
            r#"{"cmd":"turn","agent":1,"heading":"North"}"#,
            "\n",
            r#"{"cmd":"tick","count":2}"#,
            "\n",
            r#"{"cmd":"query"}"#,
            "\n",
            r#"{"cmd":"quit"}"#,
            "\n",
        );
        let mut output = Vec::new();
        session.run(input.as_bytes(), &mut output).unwrap();

        let lines: Vec<&str> = std::str::from_utf8(&output)
            .unwrap()
            .lines()
            .collect();
        assert!(lines[0].contains("\"ready\""));
        assert!(lines[1].contains("\"state\""));
        assert!(lines[2].contains("\"state\""));
    }

    #[test]
    fn test_interactive_rejects_unknown_agent() {
        let scenario = Scenario::duel();
        let session = InteractiveSession::new(&scenario).unwrap();

        let input = concat!(
            r#"{"cmd":"turn","agent":99,"heading":"North"}"#,
            "\n",
            r#"{"cmd":"quit"}"#,
            "\n",
        );
        let mut output = Vec::new();
        session.run(input.as_bytes(), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("unknown agent 99"));
    }
}
