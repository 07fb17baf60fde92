//! Left navigation rail.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AppState, Page};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(" VolatilityLab", theme::accent_bold())),
        Line::from(""),
    ];

    for page in Page::ALL {
        let active = page == app.active_page;
        let marker = if active { "▌" } else { " " };
        let style = if active {
            theme::accent().add_modifier(Modifier::REVERSED)
        } else if page.is_coming_soon() {
            theme::muted()
        } else {
            theme::text()
        };
        lines.push(Line::from(vec![
            Span::styled(marker, theme::accent()),
            Span::styled(format!("{} {:<12}", page.index() + 1, page.label()), style),
        ]));
    }

    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(theme::muted());
    f.render_widget(Paragraph::new(lines).block(block), area);
}
