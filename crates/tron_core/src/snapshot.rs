//! Read-only world views handed to presentation and intent sources.
//!
//! A snapshot is a complete copy of the post-step world: grid occupancy,
//! every agent (dead ones included), the tick and the round outcome. It
//! shares nothing with the live simulation, so renderers and pilots can hold
//! it across steps without torn reads.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId};
use crate::grid::{Cell, CellPos};
use crate::simulation::Outcome;

/// Immutable copy of the world at one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Tick the snapshot was taken at.
    pub tick: u64,
    /// Round status at that tick.
    pub outcome: Outcome,
    /// Arena width in cells.
    pub width: u32,
    /// Arena height in cells.
    pub height: u32,
    /// Grid cells in row-major order.
    pub cells: Vec<Cell>,
    /// All agents in ascending id order.
    pub agents: Vec<Agent>,
}

impl Snapshot {
    /// Check whether a position lies on the lattice.
    #[must_use]
    pub const fn in_bounds(&self, pos: CellPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Occupancy of a cell; `None` for out-of-bounds positions.
    #[must_use]
    pub fn cell(&self, pos: CellPos) -> Option<Cell> {
        if self.in_bounds(pos) {
            let index = (pos.y as usize) * (self.width as usize) + (pos.x as usize);
            Some(self.cells[index])
        } else {
            None
        }
    }

    /// True when entering `pos` is fatal: off the lattice or already a trail.
    #[must_use]
    pub fn is_lethal(&self, pos: CellPos) -> bool {
        match self.cell(pos) {
            Some(cell) => !cell.is_empty(),
            None => true,
        }
    }

    /// Look up an agent by id.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    /// Agents still alive, in ascending id order.
    pub fn alive_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|agent| agent.alive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Heading;
    use crate::simulation::{IntentMap, Simulation};

    #[test]
    fn test_snapshot_queries() {
        let mut sim = Simulation::new(4, 3);
        let a = sim.spawn_agent(CellPos::new(1, 1), Heading::East).unwrap();
        let snapshot = sim.snapshot();

        assert_eq!(snapshot.width, 4);
        assert_eq!(snapshot.height, 3);
        assert!(snapshot.is_lethal(CellPos::new(1, 1)));
        assert!(snapshot.is_lethal(CellPos::new(4, 0)));
        assert!(!snapshot.is_lethal(CellPos::new(2, 1)));
        assert_eq!(snapshot.cell(CellPos::new(1, 1)).unwrap().owner(), Some(a));
        assert_eq!(snapshot.agent(a).unwrap().heading, Heading::East);
        assert!(snapshot.agent(99).is_none());
    }

    #[test]
    fn test_dead_agents_stay_visible() {
        let mut sim = Simulation::new(3, 3);
        let a = sim.spawn_agent(CellPos::new(2, 1), Heading::East).unwrap();
        let b = sim.spawn_agent(CellPos::new(0, 1), Heading::East).unwrap();
        sim.step(&IntentMap::new()).unwrap();

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.agents.len(), 2);
        assert!(!snapshot.agent(a).unwrap().alive);
        assert_eq!(snapshot.alive_agents().count(), 1);
        assert_eq!(snapshot.alive_agents().next().unwrap().id, b);
    }
}
