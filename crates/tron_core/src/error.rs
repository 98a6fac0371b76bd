//! Error types for the arena simulation.

use thiserror::Error;

use crate::agent::AgentId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
///
/// Per-agent failures (a candidate cell out of bounds, a trail hit) are
/// absorbed by the step as eliminations and never surface here. Variants of
/// this enum are structural: they indicate a misuse of the API or, in the
/// case of [`GameError::InvariantViolation`], a bug in conflict resolution.
#[derive(Debug, Error)]
pub enum GameError {
    /// Cell lies outside the arena lattice.
    #[error("Cell ({x}, {y}) is outside the arena")]
    OutOfBounds {
        /// Cell x coordinate.
        x: i32,
        /// Cell y coordinate.
        y: i32,
    },

    /// Cell is already part of a trail.
    #[error("Cell ({x}, {y}) is already occupied by agent {owner}")]
    AlreadyOccupied {
        /// Cell x coordinate.
        x: i32,
        /// Cell y coordinate.
        y: i32,
        /// Agent whose trail holds the cell.
        owner: AgentId,
    },

    /// Intent referenced an agent that does not exist.
    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    /// Spawn position is outside the arena or already occupied.
    #[error("Cannot spawn at ({x}, {y}): {reason}")]
    SpawnBlocked {
        /// Requested x coordinate.
        x: i32,
        /// Requested y coordinate.
        y: i32,
        /// Why the spawn was rejected.
        reason: String,
    },

    /// Invalid simulation state (serialization framing, version checks).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A replayed match ended with a different state hash than recorded.
    #[error("Replay diverged at tick {tick}: expected hash {expected}, got {actual}")]
    ReplayDivergence {
        /// Tick at which the hashes were compared.
        tick: u64,
        /// Hash recorded in the replay.
        expected: u64,
        /// Hash produced by re-simulation.
        actual: u64,
    },

    /// Grid commit failed after conflict resolution declared the move safe.
    ///
    /// This is fatal: the step aborts rather than corrupt state, because it
    /// means the conflict-detection pass itself is broken.
    #[error("Invariant violation at tick {tick}: {message}")]
    InvariantViolation {
        /// Tick being committed when the violation surfaced.
        tick: u64,
        /// Diagnostic description.
        message: String,
    },
}
