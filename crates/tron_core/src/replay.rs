//! Replay system for recording and playing back rounds.
//!
//! A replay stores the serialized initial simulation state and the stream of
//! per-tick intents, plus the final tick and state hash. Because the step is
//! deterministic, re-simulating the intent stream recreates the round
//! exactly; [`Replay::verify`] checks the recorded hash to prove it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, Intent};
use crate::error::{GameError, Result};
use crate::simulation::{IntentMap, Simulation};

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// The intents consumed by one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Tick the intents were consumed at (the pre-step tick).
    pub tick: u64,
    /// Intents in ascending agent id order.
    pub intents: Vec<(AgentId, Intent)>,
}

/// Complete replay data structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Scenario identifier or name.
    pub scenario_id: String,
    /// Serialized initial simulation state.
    pub initial_state: Vec<u8>,
    /// Intent stream in tick order.
    pub frames: Vec<ReplayFrame>,
    /// Final tick when the round ended.
    pub final_tick: u64,
    /// Final state hash for verification.
    pub final_hash: u64,
}

impl Replay {
    /// Create a new replay from a simulation's initial state.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial state cannot be serialized.
    pub fn new(scenario_id: impl Into<String>, initial_state: &Simulation) -> Result<Self> {
        let state_bytes = initial_state.serialize()?;
        Ok(Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            initial_state: state_bytes,
            frames: Vec::new(),
            final_tick: 0,
            final_hash: 0,
        })
    }

    /// Record the intents consumed by the step at `tick`.
    pub fn record_frame(&mut self, tick: u64, intents: &IntentMap) {
        let mut pairs: Vec<(AgentId, Intent)> =
            intents.iter().map(|(&id, &intent)| (id, intent)).collect();
        pairs.sort_unstable_by_key(|(id, _)| *id);
        self.frames.push(ReplayFrame {
            tick,
            intents: pairs,
        });
    }

    /// Finalize the replay with end-of-round state.
    pub fn finalize(&mut self, final_tick: u64, final_hash: u64) {
        self.final_tick = final_tick;
        self.final_hash = final_hash;
    }

    /// Restore the initial simulation state for playback.
    ///
    /// # Errors
    ///
    /// Returns an error if state deserialization fails.
    pub fn restore_initial_state(&self) -> Result<Simulation> {
        Simulation::deserialize(&self.initial_state)
    }

    /// Total duration of the replay in ticks.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.final_tick
    }

    /// Number of recorded frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Re-simulate the intent stream and check the recorded final hash.
    ///
    /// # Errors
    ///
    /// [`GameError::ReplayDivergence`] if the re-simulated hash differs from
    /// the recorded one, [`GameError::InvalidState`] if the tick counts do
    /// not line up.
    pub fn verify(&self) -> Result<()> {
        let mut sim = self.restore_initial_state()?;
        for frame in &self.frames {
            let intents: IntentMap = frame.intents.iter().copied().collect();
            sim.step(&intents)?;
        }

        if sim.tick() != self.final_tick {
            return Err(GameError::InvalidState(format!(
                "replay ended at tick {}, recording says {}",
                sim.tick(),
                self.final_tick
            )));
        }

        let actual = sim.state_hash();
        if actual != self.final_hash {
            return Err(GameError::ReplayDivergence {
                tick: sim.tick(),
                expected: self.final_hash,
                actual,
            });
        }

        Ok(())
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if file reading or deserialization fails, or if the
    /// format version does not match.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::InvalidState(format!("failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }

        Ok(replay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Heading;
    use crate::grid::CellPos;

    fn duel() -> Simulation {
        let mut sim = Simulation::new(9, 9);
        sim.spawn_agent(CellPos::new(2, 4), Heading::East).unwrap();
        sim.spawn_agent(CellPos::new(6, 4), Heading::West).unwrap();
        sim
    }

    fn record_round(sim: &mut Simulation, replay: &mut Replay) {
        while !sim.outcome().is_terminal() {
            let intents = IntentMap::new();
            replay.record_frame(sim.tick(), &intents);
            sim.step(&intents).unwrap();
        }
        replay.finalize(sim.tick(), sim.state_hash());
    }

    #[test]
    fn test_replay_create() {
        let sim = duel();
        let replay = Replay::new("duel", &sim).unwrap();

        assert_eq!(replay.version, REPLAY_VERSION);
        assert_eq!(replay.scenario_id, "duel");
        assert_eq!(replay.frame_count(), 0);

        let restored = replay.restore_initial_state().unwrap();
        assert_eq!(restored.state_hash(), sim.state_hash());
    }

    #[test]
    fn test_replay_verify_roundtrip() {
        let mut sim = duel();
        let mut replay = Replay::new("duel", &sim).unwrap();
        record_round(&mut sim, &mut replay);

        assert!(replay.frame_count() > 0);
        replay.verify().unwrap();
    }

    #[test]
    fn test_replay_detects_divergence() {
        let mut sim = duel();
        let mut replay = Replay::new("duel", &sim).unwrap();
        record_round(&mut sim, &mut replay);

        replay.final_hash ^= 1;
        assert!(matches!(
            replay.verify(),
            Err(GameError::ReplayDivergence { .. })
        ));
    }

    #[test]
    fn test_replay_save_load() {
        let mut sim = duel();
        let mut replay = Replay::new("duel", &sim).unwrap();
        record_round(&mut sim, &mut replay);

        let temp_path = std::env::temp_dir().join("tron_core_test_replay.bin");
        replay.save(&temp_path).unwrap();

        let loaded = Replay::load(&temp_path).unwrap();
        assert_eq!(loaded.scenario_id, "duel");
        assert_eq!(loaded.frame_count(), replay.frame_count());
        assert_eq!(loaded.final_hash, replay.final_hash);
        loaded.verify().unwrap();

        let _ = std::fs::remove_file(temp_path);
    }

    #[test]
    fn test_replay_version_check() {
        let sim = duel();
        let mut replay = Replay::new("duel", &sim).unwrap();
        replay.version = 99;

        let temp_path = std::env::temp_dir().join("tron_core_test_replay_badver.bin");
        let bytes = bincode::serialize(&replay).unwrap();
        std::fs::write(&temp_path, bytes).unwrap();

        assert!(matches!(
            Replay::load(&temp_path),
            Err(GameError::InvalidState(_))
        ));

        let _ = std::fs::remove_file(temp_path);
    }
}
