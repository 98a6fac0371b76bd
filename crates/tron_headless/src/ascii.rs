//! ASCII arena renderer for terminal review.
//!
//! Renders snapshots as framed character grids: uppercase letters for live
//! cycle heads, lowercase for their trails, `*` for dead heads.

use tron_core::agent::AgentId;
use tron_core::grid::CellPos;
use tron_core::snapshot::Snapshot;

/// ANSI color codes cycled per agent.
const AGENT_COLORS: [&str; 6] = ["31", "34", "32", "33", "35", "36"];

/// ASCII rendering configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Use colored output (ANSI).
    pub use_color: bool,
    /// Append a per-agent legend below the arena.
    pub show_legend: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            use_color: true,
            show_legend: true,
        }
    }
}

/// Trail glyph for an agent: `a` for id 1, `b` for id 2, wrapping at `z`.
fn trail_glyph(id: AgentId) -> char {
    let index = (id.saturating_sub(1) % 26) as u8;
    (b'a' + index) as char
}

/// Head glyph: the uppercase trail glyph.
fn head_glyph(id: AgentId) -> char {
    trail_glyph(id).to_ascii_uppercase()
}

fn paint(glyph: char, id: AgentId, config: &AsciiConfig) -> String {
    if config.use_color {
        let color = AGENT_COLORS[(id.saturating_sub(1) as usize) % AGENT_COLORS.len()];
        format!("\x1b[{color}m{glyph}\x1b[0m")
    } else {
        glyph.to_string()
    }
}

/// Render a snapshot as ASCII art.
#[must_use]
pub fn render(snapshot: &Snapshot, config: &AsciiConfig) -> String {
    let width = snapshot.width as usize;
    let mut out = String::new();

    out.push('+');
    out.push_str(&"-".repeat(width));
    out.push_str("+\n");

    for y in 0..snapshot.height as i32 {
        out.push('|');
        for x in 0..snapshot.width as i32 {
            let pos = CellPos::new(x, y);
            // Heads draw over trail cells
            if let Some(agent) = snapshot.agents.iter().find(|agent| agent.position == pos) {
                let glyph = if agent.alive {
                    head_glyph(agent.id)
                } else {
                    '*'
                };
                out.push_str(&paint(glyph, agent.id, config));
                continue;
            }
            match snapshot.cell(pos).and_then(|cell| cell.owner()) {
                Some(owner) => out.push_str(&paint(trail_glyph(owner), owner, config)),
                None => out.push('.'),
            }
        }
        out.push_str("|\n");
    }

    out.push('+');
    out.push_str(&"-".repeat(width));
    out.push_str("+\n");

    if config.show_legend {
        out.push_str(&format!(
            "tick {}  outcome {:?}\n",
            snapshot.tick, snapshot.outcome
        ));
        for agent in &snapshot.agents {
            out.push_str(&format!(
                "  {} agent {} at ({}, {}) heading {:?}{}\n",
                head_glyph(agent.id),
                agent.id,
                agent.position.x,
                agent.position.y,
                agent.heading,
                if agent.alive { "" } else { " [dead]" },
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tron_core::agent::Heading;
    use tron_core::simulation::{IntentMap, Simulation};

    fn plain() -> AsciiConfig {
        AsciiConfig {
            use_color: false,
            show_legend: false,
        }
    }

    #[test]
    fn test_render_heads_and_trails() {
        let mut sim = Simulation::new(5, 3);
        sim.spawn_agent(CellPos::new(1, 1), Heading::East).unwrap();
        sim.step(&IntentMap::new()).unwrap();

        let art = render(&sim.snapshot(), &plain());
        let lines: Vec<&str> = art.lines().collect();

        assert_eq!(lines[0], "+-----+");
        assert_eq!(lines[1], "|.....|");
        // Trail at (1,1), head at (2,1)
        assert_eq!(lines[2], "|.aA..|");
        assert_eq!(lines[3], "|.....|");
        assert_eq!(lines[4], "+-----+");
    }

    #[test]
    fn test_dead_head_renders_star() {
        let mut sim = Simulation::new(3, 3);
        sim.spawn_agent(CellPos::new(2, 0), Heading::East).unwrap();
        sim.step(&IntentMap::new()).unwrap();

        let art = render(&sim.snapshot(), &plain());
        assert!(art.contains('*'));
    }

    #[test]
    fn test_legend_lists_agents() {
        let mut sim = Simulation::new(4, 4);
        sim.spawn_agent(CellPos::new(0, 0), Heading::South).unwrap();
        sim.spawn_agent(CellPos::new(3, 3), Heading::North).unwrap();

        let config = AsciiConfig {
            use_color: false,
            show_legend: true,
        };
        let art = render(&sim.snapshot(), &config);
        assert!(art.contains("agent 1"));
        assert!(art.contains("agent 2"));
        assert!(art.contains("tick 0"));
    }

    #[test]
    fn test_glyphs_wrap_alphabet() {
        assert_eq!(trail_glyph(1), 'a');
        assert_eq!(head_glyph(2), 'B');
        assert_eq!(trail_glyph(27), 'a');
    }
}
