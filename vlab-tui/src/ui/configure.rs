//! Configuration form: symbol and date range, with the submit affordance.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use vlab_core::Strategy;

use crate::app::{AppState, FormField};
use crate::theme;

const FIELDS: [FormField; 3] = [FormField::Symbol, FormField::Start, FormField::End];

pub fn render(f: &mut Frame, area: Rect, app: &AppState, strategy: &Strategy) {
    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled("Strategy: ", theme::muted()),
            Span::styled(strategy.name.as_str(), theme::accent_bold()),
        ]),
        Line::from(""),
    ];

    for field in FIELDS {
        let focused = field == app.form.focus;
        let value = app.form.field(field);
        let placeholder = match field {
            FormField::Symbol => "e.g. AAPL",
            FormField::Start | FormField::End => "YYYY-MM-DD",
        };
        let (text, style) = if value.is_empty() && !focused {
            (placeholder.to_string(), theme::muted())
        } else if focused {
            (format!("{value}▏"), theme::accent().add_modifier(Modifier::REVERSED))
        } else {
            (value.to_string(), theme::text())
        };
        let label_style = if focused {
            theme::accent_bold()
        } else {
            theme::neutral()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>12}: ", field.label()), label_style),
            Span::styled(format!(" {text:<16}"), style),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(submit_line(app));

    f.render_widget(Paragraph::new(lines), area);
}

/// Enabled `[ Run Backtest ]`, or a disabled one with the reason.
fn submit_line(app: &AppState) -> Line<'static> {
    let issue = match app.controller.readiness() {
        Some(Ok(())) => None,
        Some(Err(issue)) => Some(match app.form.invalid_field() {
            Some(field) => format!("{} is not a valid date", field.label()),
            None => issue.hint().to_string(),
        }),
        None => Some(String::new()),
    };
    match issue {
        None => Line::from(vec![
            Span::styled("[ Run Backtest ]", theme::positive().add_modifier(Modifier::BOLD)),
            Span::styled("  press Enter", theme::muted()),
        ]),
        Some(hint) => Line::from(vec![
            Span::styled("[ Run Backtest ]", theme::dimmed()),
            Span::styled(format!("  {hint}"), theme::warning()),
        ]),
    }
}
