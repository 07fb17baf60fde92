//! Strategy carousel: one page of cards, page dots, dimmed mid-transition.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use vlab_core::{PageWindow, Strategy};

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(area);

    f.render_widget(
        Paragraph::new(Span::styled(
            "Choose a strategy to backtest",
            theme::text_secondary(),
        )),
        chunks[0],
    );

    let page = app.carousel.current_page();
    if page.is_empty() {
        let msg = match app.controller.catalog_error() {
            Some(err) => format!("No strategies available ({err}). Press r to retry."),
            None => "No strategies available. Press r to refresh.".to_string(),
        };
        f.render_widget(
            Paragraph::new(Span::styled(msg, theme::warning())).alignment(Alignment::Center),
            chunks[1],
        );
    } else {
        let dimmed = app.carousel.in_transition();
        let slots = app.carousel.window().page_size;
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, slots as u32); slots])
            .split(chunks[1]);
        for (slot, strategy) in page.iter().enumerate() {
            render_card(f, columns[slot], strategy, slot == app.carousel_slot, dimmed);
        }
    }

    f.render_widget(
        Paragraph::new(page_dots(&app.carousel.window())).alignment(Alignment::Center),
        chunks[2],
    );
}

fn render_card(f: &mut Frame, area: Rect, strategy: &Strategy, selected: bool, dimmed: bool) {
    let (border, title, body) = if dimmed {
        (theme::dimmed(), theme::dimmed(), theme::dimmed())
    } else if selected {
        (
            theme::accent(),
            theme::accent_bold(),
            theme::text(),
        )
    } else {
        (theme::muted(), theme::neutral(), theme::text_secondary())
    };

    let mut lines: Vec<Line> = strategy
        .bullet_points
        .iter()
        .map(|b| Line::from(Span::styled(format!("• {b}"), body)))
        .collect();
    if let Some(description) = &strategy.description {
        if selected {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                description.as_str(),
                body.add_modifier(Modifier::ITALIC),
            )));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(format!(" {} ", strategy.name), title));
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

/// `● ○ ○` with the current page filled.
fn page_dots(window: &PageWindow) -> Line<'static> {
    let spans: Vec<Span> = (0..window.page_count())
        .map(|i| {
            if i == window.page_index {
                Span::styled("● ", theme::accent())
            } else {
                Span::styled("○ ", theme::muted())
            }
        })
        .collect();
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use crate::app::Page;
    use crate::ui::tests::render_to_string;

    #[test]
    fn dots_track_page() {
        let window = PageWindow {
            page_index: 1,
            page_size: 3,
            total_items: 7,
        };
        let text: String = page_dots(&window)
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(text, "○ ● ○ ");
    }

    #[test]
    fn first_page_shows_three_cards() {
        let mut app = test_app();
        app.active_page = Page::Trade;
        let screen = render_to_string(&app, 140, 30);
        assert!(screen.contains("Simple Moving Average"));
        assert!(screen.contains("Relative Strength Index"));
        assert!(!screen.contains("Momentum Regression"));

        app.next_page();
        let screen = render_to_string(&app, 140, 30);
        assert!(screen.contains("Momentum Regression"));
    }
}
