//! Scripted pilots for headless playtesting.
//!
//! A pilot is the intent source for one agent: each tick it reads the
//! current snapshot and answers with an [`Intent`]. Pilots only ever see
//! read-only snapshots, never the live simulation.

use serde::{Deserialize, Serialize};

use tron_core::agent::{Agent, AgentId, Heading, Intent};
use tron_core::snapshot::Snapshot;

/// Serializable pilot selection, used in scenario files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PilotSpec {
    /// Never turns. Dies at the first wall.
    Straight,
    /// Continues straight until the cell ahead is fatal, then turns.
    WallAvoider,
    /// Wanders with a seeded PRNG, preferring safe headings.
    Seeded,
}

impl PilotSpec {
    /// Short name for reports and summaries.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Straight => "straight",
            Self::WallAvoider => "wall_avoider",
            Self::Seeded => "seeded",
        }
    }

    /// Instantiate a live pilot for one agent.
    ///
    /// The seed mixes the match seed with the agent id so every cycle in a
    /// match wanders differently but reproducibly.
    #[must_use]
    pub fn build(self, match_seed: u64, agent: AgentId) -> Pilot {
        match self {
            Self::Straight => Pilot::Straight,
            Self::WallAvoider => Pilot::WallAvoider,
            Self::Seeded => Pilot::Seeded(SplitMix64::new(
                match_seed ^ ((u64::from(agent) << 32) | 0x9e37_79b9),
            )),
        }
    }
}

/// Live pilot state for one agent during a match.
#[derive(Debug, Clone)]
pub enum Pilot {
    /// Never turns.
    Straight,
    /// Turns only to avoid an immediately fatal cell.
    WallAvoider,
    /// Seeded wanderer.
    Seeded(SplitMix64),
}

impl Pilot {
    /// Decide this tick's intent for agent `me`.
    ///
    /// Dead or missing agents get a harmless straight intent; the step
    /// ignores intents for dead agents anyway.
    pub fn decide(&mut self, snapshot: &Snapshot, me: AgentId) -> Intent {
        let Some(agent) = snapshot.agent(me) else {
            return Intent::new(Heading::North);
        };
        if !agent.alive {
            return agent.default_intent();
        }

        match self {
            Self::Straight => agent.default_intent(),
            Self::WallAvoider => first_safe_intent(snapshot, agent),
            Self::Seeded(rng) => seeded_intent(snapshot, agent, rng),
        }
    }
}

/// True when `heading` is legal for the agent and its next cell is not
/// immediately fatal.
fn is_safe(snapshot: &Snapshot, agent: &Agent, heading: Heading) -> bool {
    heading != agent.heading.reversed() && !snapshot.is_lethal(heading.advance(agent.position))
}

/// Straight if safe, else the first safe turn; straight when doomed.
fn first_safe_intent(snapshot: &Snapshot, agent: &Agent) -> Intent {
    let candidates = [agent.heading, agent.heading.left(), agent.heading.right()];
    candidates
        .into_iter()
        .find(|&heading| is_safe(snapshot, agent, heading))
        .map_or_else(|| agent.default_intent(), Intent::new)
}

/// Pick a random safe heading; boost occasionally when the second cell is
/// also clear.
fn seeded_intent(snapshot: &Snapshot, agent: &Agent, rng: &mut SplitMix64) -> Intent {
    let candidates: Vec<Heading> = [agent.heading, agent.heading.left(), agent.heading.right()]
        .into_iter()
        .filter(|&heading| is_safe(snapshot, agent, heading))
        .collect();

    let Some(&heading) = candidates.get(rng.next_index(candidates.len().max(1))) else {
        return agent.default_intent();
    };

    let second = heading.advance(heading.advance(agent.position));
    if rng.next_u64() % 8 == 0 && !snapshot.is_lethal(second) {
        Intent::boosted(heading)
    } else {
        Intent::new(heading)
    }
}

/// SplitMix64: a tiny deterministic PRNG.
///
/// Good enough for scripted wandering and keeps the simulation stack free of
/// an RNG dependency; every stream is fully determined by its seed.
#[derive(Debug, Clone)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    /// Create a generator from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next raw value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform-ish index below `bound` (bound must be nonzero).
    pub fn next_index(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tron_core::grid::CellPos;
    use tron_core::simulation::Simulation;

    fn snapshot_with_agent(heading: Heading) -> (Snapshot, AgentId) {
        let mut sim = Simulation::new(8, 8);
        let id = sim.spawn_agent(CellPos::new(4, 4), heading).unwrap();
        (sim.snapshot(), id)
    }

    #[test]
    fn test_straight_pilot_never_turns() {
        let (snapshot, id) = snapshot_with_agent(Heading::East);
        let mut pilot = PilotSpec::Straight.build(0, id);
        let intent = pilot.decide(&snapshot, id);
        assert_eq!(intent, Intent::new(Heading::East));
    }

    #[test]
    fn test_wall_avoider_turns_at_wall() {
        let mut sim = Simulation::new(8, 8);
        // Heading east with the wall directly ahead
        let id = sim.spawn_agent(CellPos::new(7, 4), Heading::East).unwrap();
        let snapshot = sim.snapshot();

        let mut pilot = PilotSpec::WallAvoider.build(0, id);
        let intent = pilot.decide(&snapshot, id);

        // East's left is north: first safe candidate
        assert_eq!(intent.heading, Heading::North);
    }

    #[test]
    fn test_wall_avoider_straight_when_doomed() {
        let mut sim = Simulation::new(3, 1);
        // A 3x1 corridor: after one step east the cycle is cornered, every
        // legal heading is fatal.
        let id = sim.spawn_agent(CellPos::new(1, 0), Heading::East).unwrap();
        sim.step(&tron_core::simulation::IntentMap::new()).unwrap();
        let snapshot = sim.snapshot();

        let mut pilot = PilotSpec::WallAvoider.build(0, id);
        let intent = pilot.decide(&snapshot, id);
        assert_eq!(intent.heading, Heading::East);
    }

    #[test]
    fn test_seeded_pilot_is_reproducible() {
        let (snapshot, id) = snapshot_with_agent(Heading::North);
        let mut first = PilotSpec::Seeded.build(42, id);
        let mut second = PilotSpec::Seeded.build(42, id);

        for _ in 0..20 {
            assert_eq!(first.decide(&snapshot, id), second.decide(&snapshot, id));
        }
    }

    #[test]
    fn test_seeded_pilot_avoids_reversal() {
        let (snapshot, id) = snapshot_with_agent(Heading::West);
        let mut pilot = PilotSpec::Seeded.build(7, id);

        for _ in 0..50 {
            let intent = pilot.decide(&snapshot, id);
            assert_ne!(intent.heading, Heading::East);
        }
    }

    #[test]
    fn test_splitmix_streams_differ_by_seed() {
        let mut a = SplitMix64::new(1);
        let mut b = SplitMix64::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }
}
