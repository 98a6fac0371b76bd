//! Test fixtures and helpers.
//!
//! Pre-built arenas and intent builders for consistent testing.

use tron_core::agent::{AgentId, Heading, Intent};
use tron_core::grid::CellPos;
use tron_core::simulation::{IntentMap, Simulation};

/// Shorthand for a cell position.
#[must_use]
pub fn pos(x: i32, y: i32) -> CellPos {
    CellPos::new(x, y)
}

/// Build an intent map from `(agent, intent)` pairs.
#[must_use]
pub fn intents(pairs: &[(AgentId, Intent)]) -> IntentMap {
    pairs.iter().copied().collect()
}

/// An empty arena of the given size, no agents.
#[must_use]
pub fn open_arena(width: u32, height: u32) -> Simulation {
    Simulation::new(width, height)
}

/// The literal 5x5 head-on scenario: two cycles one cell apart from the
/// middle, driving at each other. Returns the simulation and both ids.
#[must_use]
pub fn head_on_duel() -> (Simulation, AgentId, AgentId) {
    let mut sim = Simulation::new(5, 5);
    let a = sim.spawn_agent(pos(1, 2), Heading::East).unwrap();
    let b = sim.spawn_agent(pos(3, 2), Heading::West).unwrap();
    (sim, a, b)
}

/// A spacious duel that stays collision-free for many straight steps:
/// two cycles on separate rows of a 16x16 arena, both heading east.
#[must_use]
pub fn parallel_duel() -> (Simulation, AgentId, AgentId) {
    let mut sim = Simulation::new(16, 16);
    let a = sim.spawn_agent(pos(1, 4), Heading::East).unwrap();
    let b = sim.spawn_agent(pos(1, 11), Heading::East).unwrap();
    (sim, a, b)
}

/// A four-cycle arena with one cycle near each corner, circling clockwise.
#[must_use]
pub fn four_corners(size: u32) -> (Simulation, Vec<AgentId>) {
    assert!(size >= 8, "four_corners needs at least an 8x8 arena");
    let edge = (size - 2) as i32;
    let mut sim = Simulation::new(size, size);
    let ids = vec![
        sim.spawn_agent(pos(1, 1), Heading::East).unwrap(),
        sim.spawn_agent(pos(edge, 1), Heading::South).unwrap(),
        sim.spawn_agent(pos(edge, edge), Heading::West).unwrap(),
        sim.spawn_agent(pos(1, edge), Heading::North).unwrap(),
    ];
    (sim, ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tron_core::simulation::Outcome;

    #[test]
    fn test_head_on_duel_ends_on_first_step() {
        let (mut sim, _, _) = head_on_duel();
        sim.step(&IntentMap::new()).unwrap();
        assert_eq!(sim.outcome(), Outcome::Draw);
    }

    #[test]
    fn test_parallel_duel_runs_clean() {
        let (mut sim, a, b) = parallel_duel();
        for _ in 0..5 {
            let events = sim.step(&IntentMap::new()).unwrap();
            assert!(events.deaths.is_empty());
        }
        assert!(sim.agents().get(a).unwrap().alive);
        assert!(sim.agents().get(b).unwrap().alive);
    }

    #[test]
    fn test_four_corners_spawns_four() {
        let (sim, ids) = four_corners(12);
        assert_eq!(ids.len(), 4);
        assert_eq!(sim.agents().alive_count(), 4);
    }
}
