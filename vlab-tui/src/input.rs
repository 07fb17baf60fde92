//! Keyboard input dispatch: form editing → global keys → page-specific handlers.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use vlab_core::Step;

use crate::app::{AppState, Page};

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.running = false;
        return;
    }

    // 1. The configuration form consumes printable keys.
    if app.is_editing() {
        handle_form_key(app, key);
        return;
    }

    // 2. Global keys.
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char(c @ '1'..='5') => {
            let idx = c as usize - '1' as usize;
            if let Some(page) = Page::from_index(idx) {
                app.active_page = page;
            }
            return;
        }
        KeyCode::Tab => {
            app.active_page = app.active_page.next();
            return;
        }
        KeyCode::BackTab => {
            app.active_page = app.active_page.prev();
            return;
        }
        _ => {}
    }

    // 3. Page-specific keys.
    match app.active_page {
        Page::Home => {
            if key.code == KeyCode::Enter {
                app.active_page = Page::Trade;
            }
        }
        Page::Trade => handle_trade_key(app, key),
        Page::Performance | Page::News | Page::Settings => {}
    }
}

fn handle_trade_key(app: &mut AppState, key: KeyEvent) {
    match app.controller.state().step() {
        Step::SelectStrategy => match key.code {
            KeyCode::Char('l') | KeyCode::Right => app.next_page(),
            KeyCode::Char('h') | KeyCode::Left => app.prev_page(),
            KeyCode::Char('j') | KeyCode::Down => app.move_slot(true),
            KeyCode::Char('k') | KeyCode::Up => app.move_slot(false),
            KeyCode::Enter | KeyCode::Char(' ') => app.choose_card(),
            KeyCode::Char('r') => app.refresh_strategies(),
            _ => {}
        },
        Step::Configure => handle_form_key(app, key),
        Step::Submitting => {
            if key.code == KeyCode::Esc {
                app.back();
            }
        }
        Step::Results => match key.code {
            KeyCode::Esc | KeyCode::Char('b') => app.back(),
            KeyCode::Char('x') => app.export_result(),
            _ => {}
        },
        Step::Failed => match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Enter => app.back(),
            _ => {}
        },
    }
}

fn handle_form_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.back(),
        KeyCode::Enter => app.submit(),
        KeyCode::Tab | KeyCode::Down => app.form.focus = app.form.focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.form.focus = app.form.focus.prev(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(c) if !c.is_control() => app.type_char(c),
        _ => {}
    }
}
