//! Keyboard-driven walks through the console against stub backtest clients.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

use vlab_core::config::CarouselConfig;
use vlab_core::{
    BacktestClient, BacktestConfiguration, ClientError, ManualClock, RawBacktestResult,
    StaticCatalog, Step, WorkflowController,
};
use vlab_tui::{handle_key, persistence, ui, AppState, Page};

struct Succeeds;

impl BacktestClient for Succeeds {
    fn run(&self, config: &BacktestConfiguration) -> Result<RawBacktestResult, ClientError> {
        Ok(RawBacktestResult {
            symbol: Some(config.symbol.clone()),
            total_return: Some(0.153),
            sharpe_ratio: Some(1.85),
            max_drawdown: Some(-0.082),
            equity_curve: Some(vec![100.0, 105.0, 98.0, 112.0]),
            ..RawBacktestResult::default()
        })
    }
}

struct Rejects;

impl BacktestClient for Rejects {
    fn run(&self, _config: &BacktestConfiguration) -> Result<RawBacktestResult, ClientError> {
        Err(ClientError::Status {
            status: 500,
            detail: Some("symbol not found".into()),
        })
    }
}

fn app_with(client: Arc<dyn BacktestClient>, export_dir: PathBuf) -> AppState {
    let controller = WorkflowController::new(Arc::new(StaticCatalog::builtin()), client)
        .unwrap()
        .with_today(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    AppState::new(
        controller,
        &CarouselConfig::default(),
        Arc::new(ManualClock::new()),
        export_dir.join("state.json"),
        export_dir,
    )
}

fn press(app: &mut AppState, code: KeyCode) {
    handle_key(
        app,
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        },
    );
}

fn type_str(app: &mut AppState, s: &str) {
    for c in s.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn fill_form(app: &mut AppState, symbol: &str, start: &str, end: &str) {
    type_str(app, symbol);
    press(app, KeyCode::Tab);
    type_str(app, start);
    press(app, KeyCode::Tab);
    type_str(app, end);
}

fn settle(app: &mut AppState) {
    for _ in 0..500 {
        app.tick();
        if app.controller.state().step() != Step::Submitting {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("controller never left Submitting");
}

fn screen(app: &AppState) -> String {
    let mut terminal = Terminal::new(TestBackend::new(140, 36)).unwrap();
    terminal.draw(|f| ui::draw(f, app)).unwrap();
    let buffer = terminal.backend().buffer().clone();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

#[test]
fn select_configure_run_and_export() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with(Arc::new(Succeeds), dir.path().join("exports"));

    press(&mut app, KeyCode::Char('2'));
    assert_eq!(app.active_page, Page::Trade);
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.controller.state().step(), Step::Configure);

    fill_form(&mut app, "aapl", "2023-01-01", "2023-06-01");
    assert!(screen(&app).contains("press Enter"));
    press(&mut app, KeyCode::Enter);
    settle(&mut app);

    assert_eq!(app.controller.state().step(), Step::Results);
    let out = screen(&app);
    assert!(out.contains("AAPL"));
    assert!(out.contains("1.85"));
    assert!(out.contains("Equity Curve"));

    let summary = app.last_result.as_ref().unwrap();
    assert_eq!(summary.symbol, "AAPL");

    press(&mut app, KeyCode::Char('x'));
    let mut exported: Vec<String> = std::fs::read_dir(dir.path().join("exports"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    exported.sort();
    assert_eq!(exported.len(), 2);
    assert!(exported[0].ends_with(".csv"));
    assert!(exported[1].ends_with(".json"));

    // Home keeps the headline numbers after leaving the wizard.
    press(&mut app, KeyCode::Char('1'));
    assert!(screen(&app).contains("AAPL"));
}

#[test]
fn failure_shows_detail_and_returns_to_form() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with(Arc::new(Rejects), dir.path().to_path_buf());

    press(&mut app, KeyCode::Char('2'));
    press(&mut app, KeyCode::Enter);
    fill_form(&mut app, "zzzz", "2023-01-01", "2023-06-01");
    press(&mut app, KeyCode::Enter);
    settle(&mut app);

    assert_eq!(app.controller.state().step(), Step::Failed);
    assert!(screen(&app).contains("symbol not found"));

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.controller.state().step(), Step::Configure);
    assert_eq!(app.form.symbol, "ZZZZ");
    assert_eq!(app.form.start, "2023-01-01");
}

#[test]
fn invalid_range_keeps_submit_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with(Arc::new(Succeeds), dir.path().to_path_buf());

    press(&mut app, KeyCode::Char('2'));
    press(&mut app, KeyCode::Enter);
    fill_form(&mut app, "spy", "2023-06-01", "2023-01-01");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.controller.state().step(), Step::Configure);
    assert!(screen(&app).contains("start date must not be after end date"));
}

#[test]
fn preferences_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("vlab").join("state.json");

    let mut app = app_with(Arc::new(Succeeds), dir.path().to_path_buf());
    press(&mut app, KeyCode::Char('2'));
    press(&mut app, KeyCode::Enter);
    fill_form(&mut app, "msft", "2022-01-03", "2022-12-30");
    persistence::save(&state_path, &persistence::extract(&app)).unwrap();
    drop(app);

    let mut restarted = app_with(Arc::new(Succeeds), dir.path().to_path_buf());
    persistence::apply(&mut restarted, persistence::load(&state_path));
    assert_eq!(restarted.active_page, Page::Trade);
    assert_eq!(restarted.form.symbol, "msft");

    // Choosing a card hands the remembered inputs to the controller.
    press(&mut restarted, KeyCode::Enter);
    assert_eq!(restarted.controller.readiness(), Some(Ok(())));
}

#[test]
fn coming_soon_pages_ignore_wizard_keys() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_with(Arc::new(Succeeds), dir.path().to_path_buf());

    press(&mut app, KeyCode::Char('4'));
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.active_page, Page::News);
    assert_eq!(app.controller.state().step(), Step::SelectStrategy);
    assert!(screen(&app).contains("coming soon"));

    press(&mut app, KeyCode::Char('q'));
    assert!(!app.running);
}
