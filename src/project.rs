//! Project records and colour handling.
//!
//! Projects form a forest through `parent_id`. Each project carries a display
//! colour picked from a fixed palette.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// A node in the project forest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: u64,
    pub parent_id: Option<u64>,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub order: i32,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
}

/// Fields supplied when creating or editing a project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectDraft {
    pub parent_id: Option<u64>,
    pub name: String,
    pub description: String,
    /// `None` picks an unused palette colour.
    pub color: Option<String>,
}

pub const PROJECT_COLORS: [&str; 16] = [
    "#EF4444", "#F97316", "#F59E0B", "#EAB308", "#84CC16", "#22C55E", "#10B981", "#14B8A6",
    "#06B6D4", "#0EA5E9", "#3B82F6", "#6366F1", "#8B5CF6", "#A855F7", "#D946EF", "#EC4899",
];

pub const DEFAULT_COLOR: &str = "#3B82F6";

/// Pick a random palette colour no existing project uses, falling back to any
/// palette colour once all are taken.
pub fn random_unused_color(projects: &[Project]) -> String {
    let mut rng = rand::thread_rng();
    let unused: Vec<&str> = PROJECT_COLORS
        .iter()
        .copied()
        .filter(|c| !projects.iter().any(|p| p.color.eq_ignore_ascii_case(c)))
        .collect();
    unused
        .choose(&mut rng)
        .or_else(|| PROJECT_COLORS.choose(&mut rng))
        .copied()
        .unwrap_or(DEFAULT_COLOR)
        .to_string()
}

/// Parse `#RRGGBB` into its components.
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Step through the palette from the current colour.
pub fn cycle_color(current: &str, forward: bool) -> String {
    let len = PROJECT_COLORS.len();
    let idx = PROJECT_COLORS
        .iter()
        .position(|c| c.eq_ignore_ascii_case(current));
    let next = match (idx, forward) {
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
        (None, _) => 0,
    };
    PROJECT_COLORS[next].to_string()
}
