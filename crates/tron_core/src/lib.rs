//! # Tron Core
//!
//! Deterministic light-cycle arena simulation core.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No network IO
//! - No system randomness
//! - No floating-point math (the arena is an integer lattice)
//!
//! This separation enables:
//! - Headless batch testing
//! - Replay systems with hash verification
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`grid`] - the bounded arena lattice and trail cells
//! - [`agent`] - light cycles, headings and move proposals
//! - [`simulation`] - the simultaneous-move step and round outcome
//! - [`snapshot`] - read-only world views for presentation and pilots
//! - [`replay`] - intent-stream recording and verified playback

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod error;
pub mod grid;
pub mod replay;
pub mod simulation;
pub mod snapshot;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::agent::{Agent, AgentId, Heading, Intent, MoveProposal};
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{Cell, CellPos, Grid};
    pub use crate::replay::Replay;
    pub use crate::simulation::{
        Death, DeathCause, IntentMap, Outcome, Simulation, StepEvents,
    };
    pub use crate::snapshot::Snapshot;
}
