//! Colors resolved from the `theme` config section.

use bitsmuggler_core::config::ThemeConfig;
use ratatui::style::{Color, Modifier, Style};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub border: Color,
    pub selection_fg: Color,
    pub selection_bg: Color,
    pub spinner: Color,
    pub download: Color,
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Self {
        Self {
            border: parse_color("table_border_color", &config.table_border_color),
            selection_fg: parse_color("table_selection_fg_color", &config.table_selection_fg_color),
            selection_bg: parse_color("table_selection_bg_color", &config.table_selection_bg_color),
            spinner: parse_color("spinner_color", &config.spinner_color),
            download: parse_color("download_color", &config.download_color),
        }
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn selection_style(&self) -> Style {
        Style::default()
            .fg(self.selection_fg)
            .bg(self.selection_bg)
            .add_modifier(Modifier::BOLD)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default())
    }
}

/// ANSI 256 palette index; anything else falls back to the terminal default.
fn parse_color(key: &str, value: &str) -> Color {
    match value.trim().parse::<u8>() {
        Ok(index) => Color::Indexed(index),
        Err(_) => {
            warn!(key, value, "Invalid theme color, using terminal default");
            Color::Reset
        }
    }
}
