//! Scenario loading and configuration.
//!
//! Scenarios define the initial match state for headless testing: arena
//! dimensions, the tick bound and the spawn list with pilot assignments.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tron_core::agent::Heading;

use crate::pilots::PilotSpec;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Scenario content is unusable.
    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// One cycle's starting state and pilot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSetup {
    /// Start column.
    pub x: i32,
    /// Start row.
    pub y: i32,
    /// Initial travel direction.
    pub heading: Heading,
    /// Pilot driving this cycle in scripted matches.
    pub pilot: PilotSpec,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Arena dimensions (width, height) in cells.
    pub arena: (u32, u32),
    /// Tick bound for the round; 0 means unbounded.
    pub max_ticks: u64,
    /// Spawn list.
    pub cycles: Vec<CycleSetup>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::duel()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] if the file is missing, unreadable or
    /// fails to parse.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    ///
    /// # Errors
    ///
    /// Returns a [`ScenarioError`] if parsing or validation fails.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Basic sanity checks before a scenario is instantiated.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Invalid`] for a degenerate arena or an empty
    /// spawn list.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let (width, height) = self.arena;
        if width == 0 || height == 0 {
            return Err(ScenarioError::Invalid(format!(
                "arena {width}x{height} has a zero dimension"
            )));
        }
        if self.cycles.is_empty() {
            return Err(ScenarioError::Invalid("no cycles to spawn".into()));
        }
        Ok(())
    }

    /// Look up a built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "duel" => Some(Self::duel()),
            "free_for_all" => Some(Self::free_for_all()),
            _ => None,
        }
    }

    /// The classic two-cycle duel: back to back at center, driving apart,
    /// wall-avoiding pilots.
    #[must_use]
    pub fn duel() -> Self {
        Self {
            name: "duel".to_string(),
            description: "Two cycles starting back to back on a 21x21 arena".to_string(),
            arena: (21, 21),
            max_ticks: 2000,
            cycles: vec![
                CycleSetup {
                    x: 8,
                    y: 10,
                    heading: Heading::West,
                    pilot: PilotSpec::WallAvoider,
                },
                CycleSetup {
                    x: 12,
                    y: 10,
                    heading: Heading::East,
                    pilot: PilotSpec::WallAvoider,
                },
            ],
        }
    }

    /// Four seeded wanderers, one near each corner of a 32x32 arena.
    #[must_use]
    pub fn free_for_all() -> Self {
        Self {
            name: "free_for_all".to_string(),
            description: "Four seeded cycles on a 32x32 arena".to_string(),
            arena: (32, 32),
            max_ticks: 5000,
            cycles: vec![
                CycleSetup {
                    x: 2,
                    y: 2,
                    heading: Heading::East,
                    pilot: PilotSpec::Seeded,
                },
                CycleSetup {
                    x: 29,
                    y: 2,
                    heading: Heading::South,
                    pilot: PilotSpec::Seeded,
                },
                CycleSetup {
                    x: 29,
                    y: 29,
                    heading: Heading::West,
                    pilot: PilotSpec::Seeded,
                },
                CycleSetup {
                    x: 2,
                    y: 29,
                    heading: Heading::North,
                    pilot: PilotSpec::Seeded,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert!(Scenario::builtin("duel").is_some());
        assert!(Scenario::builtin("free_for_all").is_some());
        assert!(Scenario::builtin("nope").is_none());
    }

    #[test]
    fn test_builtins_validate() {
        Scenario::duel().validate().unwrap();
        Scenario::free_for_all().validate().unwrap();
    }

    #[test]
    fn test_ron_roundtrip() {
        let scenario = Scenario::free_for_all();
        let ron = ron::ser::to_string(&scenario).unwrap();
        let parsed = Scenario::from_ron_str(&ron).unwrap();
        assert_eq!(parsed, scenario);
    }

    #[test]
    fn test_ron_literal() {
        let ron = r#"(
            name: "corridor",
            description: "tight corridor duel",
            arena: (15, 3),
            max_ticks: 100,
            cycles: [
                (x: 1, y: 1, heading: East, pilot: Straight),
                (x: 13, y: 1, heading: West, pilot: Straight),
            ],
        )"#;
        let scenario = Scenario::from_ron_str(ron).unwrap();
        assert_eq!(scenario.arena, (15, 3));
        assert_eq!(scenario.cycles.len(), 2);
        assert_eq!(scenario.cycles[0].pilot, PilotSpec::Straight);
    }

    #[test]
    fn test_invalid_scenarios_rejected() {
        let mut scenario = Scenario::duel();
        scenario.cycles.clear();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Invalid(_))
        ));

        let mut scenario = Scenario::duel();
        scenario.arena = (0, 21);
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::load("/definitely/not/here.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
