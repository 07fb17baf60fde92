//! Home dashboard: greeting, last run, quick hints.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use vlab_core::format::{format_percentage, format_ratio};

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            "Welcome to VolatilityLab",
            theme::accent_bold(),
        )),
        Line::from(Span::styled(
            "Backtest trading strategies against historical prices.",
            theme::text_secondary(),
        )),
        Line::from(""),
    ];

    match &app.last_result {
        Some(r) => {
            lines.push(Line::from(Span::styled("Last backtest", theme::neutral())));
            lines.push(Line::from(vec![
                Span::styled(format!("  {} · {}", r.symbol, r.strategy), theme::text()),
                Span::styled(
                    format!("  ({})", r.finished_at.format("%H:%M:%S")),
                    theme::muted(),
                ),
            ]));
            lines.push(Line::from(vec![
                Span::styled("  Return ", theme::muted()),
                Span::styled(
                    format_percentage(r.total_return, 2),
                    theme::metric_style(r.total_return),
                ),
                Span::styled("  Sharpe ", theme::muted()),
                Span::styled(format_ratio(r.sharpe_ratio), theme::sharpe_style(r.sharpe_ratio)),
                Span::styled("  Max DD ", theme::muted()),
                Span::styled(format_percentage(r.max_drawdown, 2), theme::negative()),
            ]));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "No backtests yet this session.",
                theme::muted(),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "{} strategies available. Press Enter or 2 to open Trade.",
            app.controller.strategies().len()
        ),
        theme::muted(),
    )));

    f.render_widget(Paragraph::new(lines), area);
}
