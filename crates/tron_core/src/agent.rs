//! Agents and the moves they propose.
//!
//! An agent is one light cycle: an identity, a position, a heading and an
//! alive flag. Agents never mutate themselves; [`Agent::propose_move`]
//! computes a candidate move and the simulation's commit phase applies it.

use serde::{Deserialize, Serialize};

use crate::grid::CellPos;

/// Unique identifier for agents.
pub type AgentId = u32;

/// One of the four travel directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    /// Toward smaller `y`.
    North,
    /// Toward larger `x`.
    East,
    /// Toward larger `y`.
    South,
    /// Toward smaller `x`.
    West,
}

impl Heading {
    /// All headings in a fixed, deterministic order.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// The opposite travel direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// 90 degrees counter-clockwise.
    #[must_use]
    pub const fn left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// 90 degrees clockwise.
    #[must_use]
    pub const fn right(self) -> Self {
        self.left().reversed()
    }

    /// Unit offset on the lattice (`y` grows southward).
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// The cell one step ahead of `pos` in this direction.
    #[must_use]
    pub const fn advance(self, pos: CellPos) -> CellPos {
        let (dx, dy) = self.delta();
        CellPos::new(pos.x + dx, pos.y + dy)
    }
}

/// Per-tick input for one agent.
///
/// Intents are ephemeral: the step that receives one consumes it, nothing is
/// carried over. An agent without an intent continues straight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Intent {
    /// Requested travel direction for this tick.
    pub heading: Heading,
    /// Cover two cells this tick instead of one.
    pub boost: bool,
}

impl Intent {
    /// A plain move in the requested direction.
    #[must_use]
    pub const fn new(heading: Heading) -> Self {
        Self {
            heading,
            boost: false,
        }
    }

    /// A boosted move: two cells in one tick.
    #[must_use]
    pub const fn boosted(heading: Heading) -> Self {
        Self {
            heading,
            boost: true,
        }
    }
}

/// The cells an agent would enter if its move committed.
///
/// Produced by [`Agent::propose_move`] without mutating anything. A plain
/// move enters one cell; a boosted move enters two along the same line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveProposal {
    /// Heading after the (possibly suppressed) turn.
    pub heading: Heading,
    /// First cell entered.
    pub first: CellPos,
    /// Second cell entered, on a boosted move.
    pub second: Option<CellPos>,
}

impl MoveProposal {
    /// Cells entered, in travel order.
    pub fn cells(&self) -> impl Iterator<Item = CellPos> + '_ {
        std::iter::once(self.first).chain(self.second)
    }

    /// Final cell the agent comes to rest in.
    #[must_use]
    pub fn destination(&self) -> CellPos {
        self.second.unwrap_or(self.first)
    }
}

/// One light cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Cell the agent currently rests in.
    pub position: CellPos,
    /// Current travel direction.
    pub heading: Heading,
    /// Dead agents stay in storage for post-mortem snapshots.
    pub alive: bool,
    /// Tick the agent was spawned at.
    pub spawned_tick: u64,
}

impl Agent {
    /// Create a live agent.
    #[must_use]
    pub const fn new(id: AgentId, position: CellPos, heading: Heading, spawned_tick: u64) -> Self {
        Self {
            id,
            position,
            heading,
            alive: true,
            spawned_tick,
        }
    }

    /// Default per-tick input: keep going straight, no boost.
    #[must_use]
    pub const fn default_intent(&self) -> Intent {
        Intent::new(self.heading)
    }

    /// Compute the candidate move for `intent` without mutating the agent.
    ///
    /// A requested heading that reverses travel outright is rejected and the
    /// agent keeps its current heading; 90-degree turns and straight-ahead
    /// are the only legal deltas.
    #[must_use]
    pub fn propose_move(&self, intent: Intent) -> MoveProposal {
        let heading = if intent.heading == self.heading.reversed() {
            self.heading
        } else {
            intent.heading
        };
        let first = heading.advance(self.position);
        let second = if intent.boost {
            Some(heading.advance(first))
        } else {
            None
        };
        MoveProposal {
            heading,
            first,
            second,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_reversal_is_involutive() {
        for heading in Heading::ALL {
            assert_eq!(heading.reversed().reversed(), heading);
        }
    }

    #[test]
    fn test_four_lefts_make_a_circle() {
        for heading in Heading::ALL {
            assert_eq!(heading.left().left().left().left(), heading);
            assert_eq!(heading.left().right(), heading);
        }
    }

    #[test]
    fn test_advance_offsets() {
        let pos = CellPos::new(2, 2);
        assert_eq!(Heading::North.advance(pos), CellPos::new(2, 1));
        assert_eq!(Heading::East.advance(pos), CellPos::new(3, 2));
        assert_eq!(Heading::South.advance(pos), CellPos::new(2, 3));
        assert_eq!(Heading::West.advance(pos), CellPos::new(1, 2));
    }

    #[test]
    fn test_propose_move_straight() {
        let agent = Agent::new(1, CellPos::new(2, 2), Heading::East, 0);
        let proposal = agent.propose_move(agent.default_intent());

        assert_eq!(proposal.heading, Heading::East);
        assert_eq!(proposal.first, CellPos::new(3, 2));
        assert_eq!(proposal.second, None);
        assert_eq!(proposal.destination(), CellPos::new(3, 2));
    }

    #[test]
    fn test_propose_move_turn() {
        let agent = Agent::new(1, CellPos::new(2, 2), Heading::East, 0);
        let proposal = agent.propose_move(Intent::new(Heading::North));

        assert_eq!(proposal.heading, Heading::North);
        assert_eq!(proposal.first, CellPos::new(2, 1));
    }

    #[test]
    fn test_reversal_is_suppressed() {
        let agent = Agent::new(1, CellPos::new(2, 2), Heading::East, 0);
        let proposal = agent.propose_move(Intent::new(Heading::West));

        // Illegal 180: the agent continues straight instead
        assert_eq!(proposal.heading, Heading::East);
        assert_eq!(proposal.first, CellPos::new(3, 2));
    }

    #[test]
    fn test_boost_enters_two_cells() {
        let agent = Agent::new(1, CellPos::new(1, 1), Heading::South, 0);
        let proposal = agent.propose_move(Intent::boosted(Heading::South));

        let cells: Vec<_> = proposal.cells().collect();
        assert_eq!(cells, vec![CellPos::new(1, 2), CellPos::new(1, 3)]);
        assert_eq!(proposal.destination(), CellPos::new(1, 3));
    }

    #[test]
    fn test_boosted_reversal_boosts_straight() {
        let agent = Agent::new(1, CellPos::new(2, 2), Heading::North, 0);
        let proposal = agent.propose_move(Intent::boosted(Heading::South));

        assert_eq!(proposal.heading, Heading::North);
        assert_eq!(proposal.destination(), CellPos::new(2, 0));
    }
}
