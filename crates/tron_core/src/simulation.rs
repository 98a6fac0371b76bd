//! Core simulation loop.
//!
//! The simulation advances in discrete ticks. One call to
//! [`Simulation::step`] consumes the per-tick intents, resolves every
//! agent's move simultaneously, commits trails to the grid and reports the
//! round outcome. The step is the sole mutator of grid and agent state; no
//! partial-tick state is ever observable from outside.
//!
//! # Determinism
//!
//! All operations are fully deterministic:
//! - Integer lattice math only, no floating point
//! - No system randomness
//! - Consistent iteration order (sorted agent ids)
//! - Same inputs always produce same outputs
//!
//! # Example
//!
//! ```
//! use tron_core::agent::{Heading, Intent};
//! use tron_core::grid::CellPos;
//! use tron_core::simulation::{IntentMap, Simulation};
//!
//! let mut sim = Simulation::new(10, 10);
//! let a = sim.spawn_agent(CellPos::new(2, 5), Heading::East).unwrap();
//! let b = sim.spawn_agent(CellPos::new(7, 5), Heading::West).unwrap();
//!
//! let mut intents = IntentMap::new();
//! intents.insert(a, Intent::new(Heading::North));
//!
//! let events = sim.step(&intents).unwrap();
//! assert_eq!(sim.tick(), 1);
//! assert!(events.deaths.is_empty());
//! # let _ = b;
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, Heading, Intent, MoveProposal};
use crate::error::{GameError, Result};
use crate::grid::{Cell, CellPos, Grid};
use crate::snapshot::Snapshot;

/// Nominal presentation ticks per second.
///
/// The core itself has no clock; the caller decides when to step. This
/// constant only documents the rate the engine is tuned for.
pub const TICK_RATE: u32 = 60;

/// Per-tick mapping from agent to requested move.
///
/// Agents without an entry continue straight. Entries for unknown agents are
/// dropped with a warning, never fatal to the tick.
pub type IntentMap = HashMap<AgentId, Intent>;

/// Why an agent died during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// The candidate cell left the lattice.
    LeftArena,
    /// Drove into an existing trail (possibly the agent's own).
    HitTrail {
        /// Agent whose trail was hit.
        owner: AgentId,
    },
    /// Two or more agents entered the same cell in the same tick.
    HeadOn,
}

/// One elimination recorded during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Death {
    /// Agent that died.
    pub agent: AgentId,
    /// Cell the fatal move pointed at.
    pub at: CellPos,
    /// What killed the agent.
    pub cause: DeathCause,
}

/// Termination status of a round, reported as a value and never thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    /// The round continues.
    #[default]
    Ongoing,
    /// Exactly one agent is left alive.
    Winner(AgentId),
    /// Nobody is left, or the tick bound was reached with rivals alive.
    Draw,
}

impl Outcome {
    /// True once the round has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

/// Events produced by one step, for the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct StepEvents {
    /// Agents eliminated this tick, in ascending id order.
    pub deaths: Vec<Death>,
    /// Round status after the step.
    pub outcome: Outcome,
}

/// Storage for all agents in the simulation.
///
/// Uses a `HashMap` for O(1) lookup by id, with deterministic iteration via
/// sorted keys during the step. Dead agents are never removed, preserving
/// post-mortem snapshot and replay integrity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStorage {
    /// Map of agent id to agent data.
    agents: HashMap<AgentId, Agent>,
    /// Next agent id to assign.
    next_id: AgentId,
}

impl AgentStorage {
    /// Create empty agent storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a new agent and return its assigned id.
    pub fn insert(&mut self, mut agent: Agent) -> AgentId {
        let id = self.next_id;
        self.next_id += 1;
        agent.id = id;
        self.agents.insert(id, agent);
        id
    }

    /// Get an agent by id.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Get a mutable reference to an agent by id.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// Check if an agent exists.
    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Total number of agents, dead ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Number of agents still alive.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.agents.values().filter(|agent| agent.alive).count()
    }

    /// Sorted agent ids for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<AgentId> {
        let mut ids: Vec<_> = self.agents.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all agents (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&AgentId, &Agent)> {
        self.agents.iter()
    }
}

/// The core arena simulation.
///
/// Owns the grid and all agents, and advances them deterministically. Each
/// step resolves simultaneous moves in four phases:
///
/// 1. **Propose** - collect intents (default: straight) and candidate cells
/// 2. **Resolve** - out-of-bounds and collision conflicts become deaths
/// 3. **Commit** - surviving moves write trails; a failure here is fatal
/// 4. **Settle** - agent positions, the tick counter and the outcome update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Simulation {
    /// Current simulation tick.
    tick: u64,
    /// Tick bound for the round; 0 means unbounded.
    max_ticks: u64,
    /// The arena.
    grid: Grid,
    /// All agents, dead ones included.
    agents: AgentStorage,
    /// Round status after the most recent step.
    outcome: Outcome,
}

impl Simulation {
    /// Create a new simulation with an empty arena of the given size.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            tick: 0,
            max_ticks: 0,
            grid: Grid::new(width, height),
            agents: AgentStorage::new(),
            outcome: Outcome::Ongoing,
        }
    }

    /// Bound the round to `max_ticks`; reaching the bound with more than one
    /// agent alive ends the round in a draw. Zero removes the bound.
    #[must_use]
    pub const fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Current tick number.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The arena grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Agent storage.
    #[must_use]
    pub fn agents(&self) -> &AgentStorage {
        &self.agents
    }

    /// Round status after the most recent step.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Spawn a new agent, occupying its start cell at the current tick.
    ///
    /// # Errors
    ///
    /// [`GameError::SpawnBlocked`] if the position is off the lattice or
    /// already occupied.
    pub fn spawn_agent(&mut self, position: CellPos, heading: Heading) -> Result<AgentId> {
        if !self.grid.in_bounds(position) {
            return Err(GameError::SpawnBlocked {
                x: position.x,
                y: position.y,
                reason: "outside the arena".into(),
            });
        }
        if let Some(Cell::Occupied { owner, .. }) = self.grid.query(position) {
            return Err(GameError::SpawnBlocked {
                x: position.x,
                y: position.y,
                reason: format!("cell held by agent {owner}"),
            });
        }

        let id = self.agents.insert(Agent::new(0, position, heading, self.tick));
        self.grid.occupy(position, id, self.tick)?;
        tracing::debug!(agent = id, x = position.x, y = position.y, "agent spawned");
        Ok(id)
    }

    /// Advance the round by exactly one tick.
    ///
    /// Once the round has ended this is a no-op returning the terminal
    /// outcome, so callers may simply stop stepping.
    ///
    /// # Errors
    ///
    /// [`GameError::InvariantViolation`] if a grid commit fails after
    /// conflict resolution declared the move safe. The step aborts rather
    /// than corrupt state; this indicates a bug in conflict detection.
    pub fn step(&mut self, intents: &IntentMap) -> Result<StepEvents> {
        if self.outcome.is_terminal() {
            return Ok(StepEvents {
                deaths: Vec::new(),
                outcome: self.outcome,
            });
        }

        // Intents for unknown agents are dropped, never fatal to the tick.
        let mut intent_ids: Vec<AgentId> = intents.keys().copied().collect();
        intent_ids.sort_unstable();
        for id in intent_ids {
            if !self.agents.contains(id) {
                tracing::warn!(agent = id, "dropping intent for unknown agent");
            }
        }

        let next_tick = self.tick + 1;

        // Phase 1: candidate moves for every alive agent, in id order.
        let mut proposals: Vec<(AgentId, MoveProposal)> = Vec::new();
        for id in self.agents.sorted_ids() {
            let Some(agent) = self.agents.get(id) else {
                continue;
            };
            if !agent.alive {
                continue;
            }
            let intent = intents
                .get(&id)
                .copied()
                .unwrap_or_else(|| agent.default_intent());
            proposals.push((id, agent.propose_move(intent)));
        }

        let mut deaths: Vec<Death> = Vec::new();

        // Phase 2a: leaving the lattice eliminates the agent outright. The
        // move contributes no entered cells and causes no grid mutation.
        let mut movers: Vec<(AgentId, MoveProposal)> = Vec::with_capacity(proposals.len());
        for (id, proposal) in proposals {
            match proposal.cells().find(|&cell| !self.grid.in_bounds(cell)) {
                Some(cell) => deaths.push(Death {
                    agent: id,
                    at: cell,
                    cause: DeathCause::LeftArena,
                }),
                None => movers.push((id, proposal)),
            }
        }

        // Phase 2b: simultaneous conflict detection. Every entered cell of
        // every in-bounds move counts, so moves crossing on the same cell
        // eliminate all parties with no priority ordering between agents.
        let mut entered: HashMap<CellPos, u32> = HashMap::new();
        for (_, proposal) in &movers {
            for cell in proposal.cells() {
                *entered.entry(cell).or_insert(0) += 1;
            }
        }

        let mut survivors: Vec<(AgentId, MoveProposal)> = Vec::with_capacity(movers.len());
        for (id, proposal) in movers {
            let mut fatal = None;
            for cell in proposal.cells() {
                if let Some(Cell::Occupied { owner, .. }) = self.grid.query(cell) {
                    fatal = Some(Death {
                        agent: id,
                        at: cell,
                        cause: DeathCause::HitTrail { owner },
                    });
                    break;
                }
                if entered[&cell] > 1 {
                    fatal = Some(Death {
                        agent: id,
                        at: cell,
                        cause: DeathCause::HeadOn,
                    });
                    break;
                }
            }
            match fatal {
                Some(death) => deaths.push(death),
                None => survivors.push((id, proposal)),
            }
        }

        // Phase 3: commit surviving moves. Conflict resolution has already
        // cleared these cells, so any failure is an internal invariant
        // violation and aborts the step.
        for (id, proposal) in &survivors {
            for cell in proposal.cells() {
                self.grid
                    .occupy(cell, *id, next_tick)
                    .map_err(|err| GameError::InvariantViolation {
                        tick: next_tick,
                        message: format!("commit failed for agent {id}: {err}"),
                    })?;
            }
        }

        // A head-on crash site becomes part of the wall too. Deaths are in
        // ascending id order, so the lowest-id party owns the cell.
        for death in &deaths {
            if matches!(death.cause, DeathCause::HeadOn)
                && matches!(self.grid.query(death.at), Some(Cell::Empty))
            {
                self.grid
                    .occupy(death.at, death.agent, next_tick)
                    .map_err(|err| GameError::InvariantViolation {
                        tick: next_tick,
                        message: format!("crash-site commit failed: {err}"),
                    })?;
            }
        }

        // Phase 4: settle agent state.
        for (id, proposal) in &survivors {
            if let Some(agent) = self.agents.get_mut(*id) {
                agent.position = proposal.destination();
                agent.heading = proposal.heading;
            }
        }
        deaths.sort_unstable_by_key(|death| death.agent);
        for death in &deaths {
            if let Some(agent) = self.agents.get_mut(death.agent) {
                agent.alive = false;
            }
            tracing::debug!(
                agent = death.agent,
                cause = ?death.cause,
                x = death.at.x,
                y = death.at.y,
                "agent eliminated"
            );
        }

        self.tick = next_tick;

        // Termination: last agent standing, or the external tick bound.
        let alive: Vec<AgentId> = self
            .agents
            .sorted_ids()
            .into_iter()
            .filter(|&id| self.agents.get(id).is_some_and(|agent| agent.alive))
            .collect();
        self.outcome = match alive.as_slice() {
            [] => Outcome::Draw,
            [winner] => Outcome::Winner(*winner),
            _ if self.max_ticks > 0 && self.tick >= self.max_ticks => Outcome::Draw,
            _ => Outcome::Ongoing,
        };

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "simulation state hash");
        }

        Ok(StepEvents {
            deaths,
            outcome: self.outcome,
        })
    }

    /// Immutable snapshot of the whole world for presentation and pilots.
    ///
    /// Shares no mutable state with the live simulation.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let mut agents: Vec<Agent> = Vec::with_capacity(self.agents.len());
        for id in self.agents.sorted_ids() {
            if let Some(agent) = self.agents.get(id) {
                agents.push(*agent);
            }
        }
        Snapshot {
            tick: self.tick,
            outcome: self.outcome,
            width: self.grid.width(),
            height: self.grid.height(),
            cells: self.grid.cells().to_vec(),
            agents,
        }
    }

    /// Compute a hash of the complete simulation state.
    ///
    /// Identical inputs must produce identical hashes at every tick; the
    /// replay verifier and the determinism harness rely on this.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.outcome.hash(&mut hasher);

        let ids = self.agents.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            if let Some(agent) = self.agents.get(id) {
                agent.hash(&mut hasher);
            }
        }

        self.grid.cells().hash(&mut hasher);

        hasher.finish()
    }

    /// Serialize the simulation to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("failed to serialize simulation: {e}")))
    }

    /// Restore a simulation from bytes produced by [`Self::serialize`].
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if deserialization fails.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| GameError::InvalidState(format!("failed to deserialize simulation: {e}")))
    }
}
