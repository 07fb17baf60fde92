//! Top-level UI layout: sidebar, active page, status bar.

pub mod coming_soon;
pub mod configure;
pub mod home;
pub mod results;
pub mod sidebar;
pub mod status_bar;
pub mod strategy_select;
pub mod trade;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::app::{AppState, Page};
use crate::theme;

const SIDEBAR_WIDTH: u16 = 20;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    f.render_widget(
        Block::default().style(Style::default().bg(theme::BACKGROUND)),
        f.area(),
    );

    // Split: main area + 1-line status bar.
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(chunks[0]);

    sidebar::render(f, columns[0], app);
    draw_page(f, columns[1], app);
    status_bar::render(f, chunks[1], app);
}

/// Draw the active page inside its border.
fn draw_page(f: &mut Frame, area: Rect, app: &AppState) {
    let page = app.active_page;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} ", page.label()))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    match page {
        Page::Home => home::render(f, inner, app),
        Page::Trade => trade::render(f, inner, app),
        Page::Performance | Page::News | Page::Settings => coming_soon::render(f, inner, page),
    }
}
