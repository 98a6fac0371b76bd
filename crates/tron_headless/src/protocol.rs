//! JSON line protocol for interactive headless matches.
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! **Input (stdin):** commands from the controller
//! **Output (stdout):** snapshots and responses
//! **Logs (stderr):** human-readable diagnostics
//!
//! # Protocol Flow
//!
//! 1. Session starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends `turn` commands for the agents it drives
//! 3. `tick` advances the round and answers with a `state` snapshot
//! 4. On round end the session outputs `game_over` and exits
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"cmd":"turn","agent":1,"heading":"North"}
//! -> {"cmd":"tick","count":1}
//! <- {"type":"state","snapshot":{...}}
//! -> {"cmd":"tick","count":50}
//! <- {"type":"state","snapshot":{...}}
//! <- {"type":"game_over","outcome":{"Winner":2},"tick":37,"final_hash":123}
//! ```

use serde::{Deserialize, Serialize};

use tron_core::agent::{AgentId, Heading};
use tron_core::simulation::Outcome;
use tron_core::snapshot::Snapshot;

/// Protocol version reported in the `ready` response.
pub const PROTOCOL_VERSION: &str = "1.0";

fn default_tick_count() -> u32 {
    1
}

/// Commands accepted by an interactive session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Request a heading for one agent, consumed by the next tick.
    Turn {
        /// Agent to steer.
        agent: AgentId,
        /// Requested travel direction.
        heading: Heading,
        /// Cover two cells next tick.
        #[serde(default)]
        boost: bool,
    },

    /// Advance the round by N ticks (default: 1). Pending turns apply to
    /// the first tick; the rest run on defaults.
    Tick {
        /// Number of ticks to advance.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Output the current snapshot without advancing time.
    Query,

    /// End the session.
    Quit,
}

/// Responses emitted by an interactive session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Session is up and listening.
    Ready {
        /// Protocol version.
        version: String,
        /// Current tick.
        tick: u64,
    },

    /// World snapshot after a `tick` or `query`.
    State {
        /// Complete read-only world view.
        snapshot: Snapshot,
    },

    /// The round has ended; the session exits after this.
    GameOver {
        /// Terminal outcome.
        outcome: Outcome,
        /// Final tick.
        tick: u64,
        /// Final state hash for verification.
        final_hash: u64,
    },

    /// A command could not be honored; the session continues.
    Error {
        /// Human-readable description.
        message: String,
    },
}
