//! Colour palette and text styles used across the UI.

use ratatui::style::{Color, Modifier, Style};

use crate::core::view::Fill;

/// Central theme — change colours here and they propagate everywhere.
pub struct Theme;

impl Theme {
    // ── diagram ────────────────────────────────────────────────
    pub fn fill_color(fill: Fill) -> Color {
        match fill {
            Fill::Cursor => Color::Rgb(0x77, 0x77, 0x77),
            Fill::Collapsed => Color::Rgb(0x31, 0x82, 0xbd),
            Fill::Expanded => Color::Rgb(0xc6, 0xdb, 0xef),
            Fill::Leaf => Color::Rgb(0xfd, 0x8d, 0x3c),
        }
    }

    /// Label style for a node box; dark fills get light text.
    pub fn node_style(fill: Fill) -> Style {
        let fg = match fill {
            Fill::Cursor | Fill::Collapsed => Color::White,
            Fill::Expanded | Fill::Leaf => Color::Black,
        };
        Style::default().bg(Self::fill_color(fill)).fg(fg)
    }

    /// Applied on top of [`Theme::node_style`] while a node fades.
    pub fn fading_modifier() -> Modifier {
        Modifier::DIM
    }

    pub fn link_style() -> Style {
        Style::default().fg(Color::Rgb(0xcc, 0xcc, 0xcc))
    }

    pub fn placeholder_style() -> Style {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC)
    }

    // ── chrome ─────────────────────────────────────────────────
    pub fn border_style() -> Style {
        Style::default().fg(Color::Gray)
    }

    pub fn title_style() -> Style {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }

    pub fn status_bar_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    }

    pub fn error_style() -> Style {
        Style::default().bg(Color::DarkGray).fg(Color::LightRed)
    }
}
