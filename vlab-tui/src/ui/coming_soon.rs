use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::Page;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, page: Page) {
    let top = area.height / 3;
    let mut lines: Vec<Line> = (0..top).map(|_| Line::from("")).collect();
    lines.push(Line::from(Span::styled(page.label(), theme::accent_bold())));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "This page is coming soon.",
        theme::muted(),
    )));
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}
