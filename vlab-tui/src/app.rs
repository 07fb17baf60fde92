//! Application state: single-owner, main-thread only.
//!
//! All TUI state lives here. Backtest work happens on the controller's worker
//! thread; the main loop calls [`AppState::tick`] to drain its responses.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vlab_core::config::CarouselConfig;
use vlab_core::{
    export, BacktestConfiguration, Clock, ConfigDraft, ConfigPatch, PaginationCursor, Step,
    Strategy, SubmitOutcome, WorkflowController, WorkflowState,
};

/// Which sidebar page is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Page {
    Home,
    Trade,
    Performance,
    News,
    Settings,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Home,
        Page::Trade,
        Page::Performance,
        Page::News,
        Page::Settings,
    ];

    pub fn index(self) -> usize {
        match self {
            Page::Home => 0,
            Page::Trade => 1,
            Page::Performance => 2,
            Page::News => 3,
            Page::Settings => 4,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Trade => "Trade",
            Page::Performance => "Performance",
            Page::News => "News",
            Page::Settings => "Settings",
        }
    }

    /// Pages that only show a placeholder for now.
    pub fn is_coming_soon(self) -> bool {
        matches!(self, Page::Performance | Page::News | Page::Settings)
    }

    pub fn next(self) -> Page {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Page {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// Input field of the configuration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Symbol,
    Start,
    End,
}

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            FormField::Symbol => "Symbol",
            FormField::Start => "Start date",
            FormField::End => "End date",
        }
    }

    pub fn next(self) -> FormField {
        match self {
            FormField::Symbol => FormField::Start,
            FormField::Start => FormField::End,
            FormField::End => FormField::Symbol,
        }
    }

    pub fn prev(self) -> FormField {
        match self {
            FormField::Symbol => FormField::End,
            FormField::Start => FormField::Symbol,
            FormField::End => FormField::Start,
        }
    }
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// File stem for an export: `<symbol>_<strategy>_<start>_<end>`, with every
/// character outside `[A-Za-z0-9._-]` replaced so the name stays one path
/// component.
fn export_stem(config: &BacktestConfiguration) -> String {
    let safe = |text: &str| -> String {
        text.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    };
    format!(
        "{}_{}_{}_{}",
        safe(&config.symbol),
        safe(&config.strategy_id),
        config.start_date,
        config.end_date
    )
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

/// Text buffers behind the configuration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub symbol: String,
    pub start: String,
    pub end: String,
    pub focus: FormField,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            start: String::new(),
            end: String::new(),
            focus: FormField::Symbol,
        }
    }
}

impl FormState {
    pub fn from_draft(draft: &ConfigDraft) -> Self {
        let fmt = |d: Option<NaiveDate>| d.map(|d| d.format(DATE_FORMAT).to_string());
        Self {
            symbol: draft.symbol.clone(),
            start: fmt(draft.start_date).unwrap_or_default(),
            end: fmt(draft.end_date).unwrap_or_default(),
            focus: FormField::Symbol,
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Symbol => &self.symbol,
            FormField::Start => &self.start,
            FormField::End => &self.end,
        }
    }

    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Symbol => &mut self.symbol,
            FormField::Start => &mut self.start,
            FormField::End => &mut self.end,
        }
    }

    /// Full patch for the controller. Unparseable dates clear the field.
    pub fn patch(&self) -> ConfigPatch {
        ConfigPatch {
            symbol: Some(self.symbol.clone()),
            start_date: Some(parse_date(&self.start)),
            end_date: Some(parse_date(&self.end)),
        }
    }

    /// First date field holding text that is not a valid date.
    pub fn invalid_field(&self) -> Option<FormField> {
        [FormField::Start, FormField::End].into_iter().find(|&f| {
            let text = self.field(f).trim();
            !text.is_empty() && parse_date(text).is_none()
        })
    }
}

/// Headline numbers of the most recent successful run, for the home page.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub symbol: String,
    pub strategy: String,
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub finished_at: NaiveDateTime,
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_page: Page,
    pub running: bool,

    // Backtest wizard
    pub controller: WorkflowController,
    pub carousel: PaginationCursor<Strategy>,
    carousel_revision: u64,
    reported_catalog_error: Option<String>,
    pub carousel_slot: usize,
    pub form: FormState,

    // Cross-cutting
    pub last_result: Option<ResultSummary>,
    pub status_message: Option<(String, StatusLevel)>,
    pub tick: u64,

    // Paths
    pub export_dir: PathBuf,
    pub state_path: PathBuf,
}

impl AppState {
    pub fn new(
        controller: WorkflowController,
        carousel: &CarouselConfig,
        clock: Arc<dyn Clock>,
        state_path: PathBuf,
        export_dir: PathBuf,
    ) -> Self {
        let cursor = PaginationCursor::new(controller.strategies().to_vec(), carousel.page_size)
            .with_transition(carousel.transition(), clock);
        let revision = controller.catalog_revision();
        Self {
            active_page: Page::Home,
            running: true,
            controller,
            carousel: cursor,
            carousel_revision: revision,
            reported_catalog_error: None,
            carousel_slot: 0,
            form: FormState::default(),
            last_result: None,
            status_message: None,
            tick: 0,
            export_dir,
            state_path,
        }
    }

    /// Advance one frame: drain worker responses and resync derived state.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        if self.controller.poll() {
            self.on_controller_update();
        }
        self.sync_carousel();
    }

    fn on_controller_update(&mut self) {
        match self.controller.state() {
            WorkflowState::Results { result, .. } => {
                self.last_result = Some(ResultSummary {
                    symbol: result.symbol.clone(),
                    strategy: result.strategy_display_name.clone(),
                    total_return: result.total_return,
                    sharpe_ratio: result.sharpe_ratio,
                    max_drawdown: result.max_drawdown,
                    finished_at: chrono::Local::now().naive_local(),
                });
                let msg = format!(
                    "Backtest complete: {} return, Sharpe {}",
                    vlab_core::format::format_percentage(result.total_return, 2),
                    vlab_core::format::format_ratio(result.sharpe_ratio),
                );
                self.set_status(msg);
            }
            WorkflowState::Failed { message, .. } => {
                let msg = format!("Backtest failed: {message}");
                self.set_error(msg);
            }
            _ => {}
        }
        // Only a new catalog failure earns the status line.
        let catalog_error = self.controller.catalog_error().map(str::to_owned);
        if catalog_error != self.reported_catalog_error {
            if let Some(err) = &catalog_error {
                self.set_warning(format!("Strategy list unavailable: {err}"));
            }
            self.reported_catalog_error = catalog_error;
        }
    }

    /// Replace the carousel's items when the controller's catalog changed.
    pub fn sync_carousel(&mut self) {
        let revision = self.controller.catalog_revision();
        if revision == self.carousel_revision {
            return;
        }
        self.carousel_revision = revision;
        self.carousel
            .replace_items(self.controller.strategies().to_vec());
        self.clamp_slot();
    }

    // ── Carousel ─────────────────────────────────────────────────────

    pub fn selected_card(&self) -> Option<&Strategy> {
        self.carousel.item_on_page(self.carousel_slot)
    }

    pub fn next_page(&mut self) {
        let before = self.carousel.window().page_index;
        if self.carousel.next().page_index != before {
            self.carousel_slot = 0;
        }
    }

    pub fn prev_page(&mut self) {
        let before = self.carousel.window().page_index;
        if self.carousel.prev().page_index != before {
            self.carousel_slot = 0;
        }
    }

    pub fn move_slot(&mut self, forward: bool) {
        let len = self.carousel.current_page().len();
        if len == 0 {
            return;
        }
        self.carousel_slot = if forward {
            (self.carousel_slot + 1).min(len - 1)
        } else {
            self.carousel_slot.saturating_sub(1)
        };
    }

    fn clamp_slot(&mut self) {
        let len = self.carousel.current_page().len();
        self.carousel_slot = self.carousel_slot.min(len.saturating_sub(1));
    }

    /// Select the highlighted card and move to the form.
    pub fn choose_card(&mut self) {
        let Some(strategy) = self.selected_card().cloned() else {
            return;
        };
        if self.controller.select_strategy(strategy) {
            self.form.focus = FormField::Symbol;
            self.push_form();
        }
    }

    pub fn refresh_strategies(&mut self) {
        if self.controller.refresh_strategies() {
            self.set_status("Refreshing strategy list…");
        }
    }

    // ── Form ─────────────────────────────────────────────────────────

    /// Send the form contents to the controller. Returns the ready predicate.
    pub fn push_form(&mut self) -> bool {
        self.controller.update_config(self.form.patch())
    }

    pub fn type_char(&mut self, c: char) {
        self.form.focused_mut().push(c);
        self.push_form();
    }

    pub fn backspace(&mut self) {
        self.form.focused_mut().pop();
        self.push_form();
    }

    pub fn submit(&mut self) {
        match self.controller.submit() {
            SubmitOutcome::Dispatched(ticket) => {
                info!(?ticket, "submitted from form");
                self.set_status("Running backtest…");
            }
            SubmitOutcome::NotReady(issue) => {
                let hint = match self.form.invalid_field() {
                    Some(field) => format!("{} is not a valid YYYY-MM-DD date", field.label()),
                    None => issue.hint().to_string(),
                };
                self.set_warning(format!("Cannot submit: {hint}"));
            }
            SubmitOutcome::WorkerUnavailable => {
                self.set_error("Backtest worker is not running; restart the console");
            }
            SubmitOutcome::InFlight | SubmitOutcome::WrongStep => {}
        }
    }

    /// Step the wizard backward and resync the form.
    pub fn back(&mut self) {
        let from = self.controller.state().step();
        self.controller.back();
        match self.controller.state() {
            WorkflowState::Configure { draft, .. } => {
                self.form = FormState::from_draft(draft);
            }
            WorkflowState::SelectStrategy if from == Step::Configure => {
                self.form = FormState::default();
            }
            _ => {}
        }
        if from == Step::Submitting {
            self.set_warning("Backtest abandoned; the running request will be ignored");
        }
    }

    // ── Export ───────────────────────────────────────────────────────

    /// Write the current result as CSV and JSON under the export directory.
    pub fn export_result(&mut self) {
        let WorkflowState::Results { result, config, .. } = self.controller.state() else {
            return;
        };
        let stem = export_stem(config);
        let csv_path = self.export_dir.join(format!("{stem}.csv"));
        let json_path = self.export_dir.join(format!("{stem}.json"));

        let outcome = std::fs::create_dir_all(&self.export_dir)
            .map_err(|e| e.to_string())
            .and_then(|_| export::write_equity_csv(result, &csv_path).map_err(|e| e.to_string()))
            .and_then(|_| export::write_json(result, &json_path).map_err(|e| e.to_string()));

        match outcome {
            Ok(()) => {
                let msg = format!("Exported to {}", csv_path.display());
                self.set_status(msg);
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                self.set_error(format!("Export failed: {e}"));
            }
        }
    }

    // ── Status ───────────────────────────────────────────────────────

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Error));
    }

    /// True while the form owns printable keys.
    pub fn is_editing(&self) -> bool {
        self.active_page == Page::Trade && self.controller.state().step() == Step::Configure
    }
}
