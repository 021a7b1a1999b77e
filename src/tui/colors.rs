//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Priority, TaskStatus, Theme};
use crate::project::{parse_hex_color, DEFAULT_COLOR};

/// Header and status bar background.
pub const ACCENT: Color = Color::Rgb(36, 129, 204);
/// Error toasts and confirm overlays.
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
/// Success toasts.
pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
pub const GOLD: Color = Color::Rgb(255, 215, 0);
pub const MUTED: Color = Color::Rgb(128, 128, 128);

/// Terminal color for a project's `#RRGGBB`.
pub fn project_color(hex: &str) -> Color {
    parse_hex_color(hex)
        .or_else(|| parse_hex_color(DEFAULT_COLOR))
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::Blue)
}

pub fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::Yellow,
        TaskStatus::InProgress => Color::Cyan,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Cancelled => MUTED,
    }
}

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Urgent => Color::Red,
        Priority::High => Color::LightRed,
        Priority::Normal => Color::Reset,
        Priority::Low => MUTED,
    }
}

/// Foreground used for body text under the requested theme.
pub fn text_color(theme: Theme) -> Color {
    match theme {
        Theme::Auto => Color::Reset,
        Theme::Light => Color::Black,
        Theme::Dark => Color::White,
    }
}

pub fn background_color(theme: Theme) -> Color {
    match theme {
        Theme::Auto => Color::Reset,
        Theme::Light => Color::White,
        Theme::Dark => Color::Black,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_color_falls_back() {
        assert_eq!(project_color("#FF0000"), Color::Rgb(255, 0, 0));
        assert_eq!(project_color("red"), Color::Rgb(0x3b, 0x82, 0xf6));
    }
}
