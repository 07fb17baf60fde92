//! Bottom status bar: key hints for the current context, last status message.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use vlab_core::Step;

use crate::app::{AppState, Page, StatusLevel};
use crate::theme;

fn hints(app: &AppState) -> &'static str {
    if app.active_page != Page::Trade {
        return " 1-5:pages Tab:next q:quit";
    }
    match app.controller.state().step() {
        Step::SelectStrategy => " h/l:page j/k:card Enter:select r:refresh q:quit",
        Step::Configure => " Tab:field Enter:run Esc:back",
        Step::Submitting => " Esc:abandon",
        Step::Results => " x:export Esc:back q:quit",
        Step::Failed => " Enter/Esc:back to configure",
    }
}

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let mut spans: Vec<Span> = vec![Span::styled(hints(app), theme::muted())];

    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(msg.as_str(), style));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
