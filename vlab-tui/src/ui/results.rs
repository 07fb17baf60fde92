//! Submitting spinner, results (metrics card + equity chart), failure view.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap};
use ratatui::Frame;

use vlab_core::format::{format_number, format_percentage, format_ratio};
use vlab_core::{BacktestConfiguration, BacktestResult, EquityPoint, Strategy};

use crate::theme;

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

fn run_label(strategy: &Strategy, config: &BacktestConfiguration) -> String {
    format!(
        "{} on {} from {} to {}",
        strategy.name, config.symbol, config.start_date, config.end_date
    )
}

pub fn render_submitting(
    f: &mut Frame,
    area: Rect,
    tick: u64,
    strategy: &Strategy,
    config: &BacktestConfiguration,
) {
    let frame = SPINNER[(tick / 2) as usize % SPINNER.len()];
    let top = area.height / 3;
    let mut lines: Vec<Line> = (0..top).map(|_| Line::from("")).collect();
    lines.push(Line::from(Span::styled(
        format!("{frame} Running backtest…"),
        theme::accent_bold(),
    )));
    lines.push(Line::from(Span::styled(
        run_label(strategy, config),
        theme::muted(),
    )));
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

pub fn render_failed(
    f: &mut Frame,
    area: Rect,
    strategy: &Strategy,
    config: &BacktestConfiguration,
    message: &str,
) {
    let lines = vec![
        Line::from(Span::styled("Backtest failed", theme::negative())),
        Line::from(Span::styled(run_label(strategy, config), theme::muted())),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme::text())),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to go back to configure and try again.",
            theme::muted(),
        )),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative());
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

pub fn render_results(
    f: &mut Frame,
    area: Rect,
    strategy: &Strategy,
    config: &BacktestConfiguration,
    result: &BacktestResult,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(4)])
        .split(area);

    render_metrics(f, chunks[0], strategy, config, result);
    render_chart(f, chunks[1], &result.equity_curve, &result.symbol);
}

fn render_metrics(
    f: &mut Frame,
    area: Rect,
    strategy: &Strategy,
    config: &BacktestConfiguration,
    result: &BacktestResult,
) {
    let title = if result.strategy_display_name.is_empty() {
        strategy.name.as_str()
    } else {
        result.strategy_display_name.as_str()
    };
    let lines = vec![
        Line::from(vec![
            Span::styled(format!("{} · {}", result.symbol, title), theme::accent_bold()),
            Span::styled(
                format!("  {} → {}", config.start_date, config.end_date),
                theme::muted(),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Total Return ", theme::muted()),
            Span::styled(
                format!("{:>9}", format_percentage(result.total_return, 2)),
                theme::metric_style(result.total_return),
            ),
            Span::styled("   Sharpe Ratio ", theme::muted()),
            Span::styled(
                format!("{:>6}", format_ratio(result.sharpe_ratio)),
                theme::sharpe_style(result.sharpe_ratio),
            ),
            Span::styled("   Max Drawdown ", theme::muted()),
            Span::styled(
                format!("{:>9}", format_percentage(result.max_drawdown, 2)),
                theme::negative(),
            ),
        ]),
        Line::from(vec![
            Span::styled("Final Equity ", theme::muted()),
            Span::styled(format_number(result.final_equity(), 2), theme::text()),
            Span::styled(
                format!("   {} points", result.equity_curve.len()),
                theme::muted(),
            ),
        ]),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::muted())
        .title(Span::styled(" Metrics ", theme::neutral()));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Braille line chart. The x-axis is the point's position in the curve.
fn render_chart(f: &mut Frame, area: Rect, curve: &[EquityPoint], label: &str) {
    let data: Vec<(f64, f64)> = curve.iter().map(|p| (p.index as f64, p.value)).collect();

    let min_y = curve.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
    let max_y = curve
        .iter()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let padding = ((max_y - min_y).abs() * 0.05).max(1.0);
    let y_min = min_y - padding;
    let y_max = max_y + padding;
    let x_max = curve.len().saturating_sub(1) as f64;

    let dataset = Dataset::default()
        .name(label.to_string())
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(theme::ACCENT))
        .graph_type(GraphType::Line)
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme::muted())
                .title(Span::styled(" Equity Curve ", theme::neutral())),
        )
        .x_axis(
            Axis::default()
                .title(Span::styled("Point", theme::muted()))
                .style(theme::muted())
                .bounds([0.0, x_max.max(1.0)])
                .labels(vec![
                    Span::styled("0", theme::muted()),
                    Span::styled(format!("{}", curve.len().saturating_sub(1)), theme::muted()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("Equity", theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(vec![
                    Span::styled(format!("{y_min:.0}"), theme::muted()),
                    Span::styled(format!("{y_max:.0}"), theme::muted()),
                ]),
        );

    f.render_widget(chart, area);
}
