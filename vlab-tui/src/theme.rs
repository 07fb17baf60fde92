//! Parrot/neon theme tokens for the VolatilityLab console.
//!
//! # Color Palette
//! - **Background**: Near-black / deep charcoal (base layer)
//! - **Accent**: Electric cyan (primary highlights, focus)
//! - **Positive**: Neon green (gains, success)
//! - **Negative**: Hot pink (losses, failures)
//! - **Warning**: Neon orange (alerts, disabled submit hints)
//! - **Neutral**: Cool purple (secondary info)
//! - **Muted**: Steel blue (disabled, secondary text)

use ratatui::style::{Color, Modifier, Style};

pub const BACKGROUND: Color = Color::Rgb(18, 18, 20);
pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
pub const TEXT_PRIMARY: Color = Color::White;
pub const TEXT_SECONDARY: Color = Color::Rgb(170, 170, 170);
/// Cards rendered during a page transition.
pub const DIMMED: Color = Color::Rgb(70, 70, 80);

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn text() -> Style {
    Style::default().fg(TEXT_PRIMARY)
}

pub fn text_secondary() -> Style {
    Style::default().fg(TEXT_SECONDARY)
}

pub fn dimmed() -> Style {
    Style::default().fg(DIMMED)
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Gains green, losses pink.
pub fn pnl_color(value: f64) -> Color {
    if value >= 0.0 {
        POSITIVE
    } else {
        NEGATIVE
    }
}

pub fn metric_style(value: f64) -> Style {
    Style::default().fg(pnl_color(value))
}

/// Gradient from muted to positive.
pub fn sharpe_color(sharpe: f64) -> Color {
    match sharpe {
        s if s >= 2.0 => POSITIVE,
        s if s >= 1.0 => ACCENT,
        s if s >= 0.5 => NEUTRAL,
        s if s >= 0.0 => MUTED,
        _ => NEGATIVE,
    }
}

pub fn sharpe_style(sharpe: f64) -> Style {
    Style::default().fg(sharpe_color(sharpe))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pnl_color() {
        assert_eq!(pnl_color(100.0), POSITIVE);
        assert_eq!(pnl_color(-50.0), NEGATIVE);
        assert_eq!(pnl_color(0.0), POSITIVE);
    }

    #[test]
    fn test_sharpe_color() {
        assert_eq!(sharpe_color(2.5), POSITIVE);
        assert_eq!(sharpe_color(1.85), ACCENT);
        assert_eq!(sharpe_color(0.7), NEUTRAL);
        assert_eq!(sharpe_color(0.3), MUTED);
        assert_eq!(sharpe_color(-0.5), NEGATIVE);
    }

    #[test]
    fn test_panel_styles() {
        assert_eq!(panel_border(true), accent());
        assert_eq!(panel_title(false), muted());
    }
}
