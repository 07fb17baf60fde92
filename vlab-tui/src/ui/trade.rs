//! Trade page: wizard header plus the view for the controller's current step.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use vlab_core::WorkflowState;

use crate::app::AppState;
use crate::theme;

const STAGES: [&str; 3] = ["Select Strategy", "Configure", "Results"];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    render_header(f, chunks[0], app);

    let body = chunks[1];
    match app.controller.state() {
        WorkflowState::SelectStrategy => super::strategy_select::render(f, body, app),
        WorkflowState::Configure { strategy, .. } => {
            super::configure::render(f, body, app, strategy)
        }
        WorkflowState::Submitting {
            strategy, config, ..
        } => super::results::render_submitting(f, body, app.tick, strategy, config),
        WorkflowState::Results {
            strategy,
            config,
            result,
        } => super::results::render_results(f, body, strategy, config, result),
        WorkflowState::Failed {
            strategy,
            config,
            message,
        } => super::results::render_failed(f, body, strategy, config, message),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let current = app.controller.state().step().stage();
    let mut spans: Vec<Span> = Vec::new();
    for (i, label) in STAGES.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ›  ", theme::muted()));
        }
        let style = if i == current {
            theme::accent().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else if i < current {
            theme::positive()
        } else {
            theme::muted()
        };
        spans.push(Span::styled(format!("{}. {label}", i + 1), style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use crate::app::tests::{settle, test_app};
    use crate::app::Page;
    use crate::ui::tests::render_to_string;

    #[test]
    fn every_step_renders() {
        let mut app = test_app();
        app.active_page = Page::Trade;
        let screen = render_to_string(&app, 120, 36);
        assert!(screen.contains("Simple Moving Average"));

        app.choose_card();
        app.form.symbol = "aapl".into();
        app.form.start = "2023-01-01".into();
        app.form.end = "2023-06-01".into();
        app.push_form();
        let screen = render_to_string(&app, 120, 36);
        assert!(screen.contains("Symbol"));

        app.submit();
        render_to_string(&app, 120, 36);
        settle(&mut app);
        let screen = render_to_string(&app, 120, 36);
        assert!(screen.contains("Sharpe"));
        assert!(screen.contains("15.30%"));
    }
}
