//! Backtest workflow state machine.
//!
//! One [`WorkflowController`] drives the wizard: select a strategy, fill in
//! the configuration, submit, then view results or the failure. The
//! controller owns a worker thread that performs the blocking network call;
//! responses come back tagged with a [`RequestTicket`] and are applied only
//! while that ticket is still the active one.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, StrategyCatalog};
use crate::client::{BacktestClient, ClientError, RawBacktestResult};
use crate::domain::{
    BacktestConfiguration, BacktestResult, ConfigDraft, ConfigIssue, ConfigPatch, Strategy,
};
use crate::transform;
use crate::worker::{spawn_worker, WorkerCommand, WorkerControl, WorkerResponse};

const WORKER_GONE: &str = "The backtest worker stopped unexpectedly";

/// Identifies one submission. Monotonic per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    SelectStrategy,
    Configure {
        strategy: Strategy,
        draft: ConfigDraft,
    },
    Submitting {
        strategy: Strategy,
        config: BacktestConfiguration,
        ticket: RequestTicket,
    },
    Results {
        strategy: Strategy,
        config: BacktestConfiguration,
        result: BacktestResult,
    },
    Failed {
        strategy: Strategy,
        config: BacktestConfiguration,
        message: String,
    },
}

impl WorkflowState {
    pub fn step(&self) -> Step {
        match self {
            WorkflowState::SelectStrategy => Step::SelectStrategy,
            WorkflowState::Configure { .. } => Step::Configure,
            WorkflowState::Submitting { .. } => Step::Submitting,
            WorkflowState::Results { .. } => Step::Results,
            WorkflowState::Failed { .. } => Step::Failed,
        }
    }

    /// The selected strategy, in every step past selection.
    pub fn strategy(&self) -> Option<&Strategy> {
        match self {
            WorkflowState::SelectStrategy => None,
            WorkflowState::Configure { strategy, .. }
            | WorkflowState::Submitting { strategy, .. }
            | WorkflowState::Results { strategy, .. }
            | WorkflowState::Failed { strategy, .. } => Some(strategy),
        }
    }

    /// The submitted configuration, once there is one.
    pub fn config(&self) -> Option<&BacktestConfiguration> {
        match self {
            WorkflowState::Submitting { config, .. }
            | WorkflowState::Results { config, .. }
            | WorkflowState::Failed { config, .. } => Some(config),
            _ => None,
        }
    }
}

/// Discriminant of [`WorkflowState`], for progress indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SelectStrategy,
    Configure,
    Submitting,
    Results,
    Failed,
}

impl Step {
    pub fn label(self) -> &'static str {
        match self {
            Step::SelectStrategy => "Select Strategy",
            Step::Configure => "Configure",
            Step::Submitting => "Running",
            Step::Results => "Results",
            Step::Failed => "Failed",
        }
    }

    /// Position in the three-stage wizard header (select, configure, results).
    pub fn stage(self) -> usize {
        match self {
            Step::SelectStrategy => 0,
            Step::Configure => 1,
            Step::Submitting | Step::Results | Step::Failed => 2,
        }
    }
}

/// What [`WorkflowController::submit`] did. Informational, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Request handed to the worker; the state is now `Submitting`.
    Dispatched(RequestTicket),
    /// The draft fails the ready predicate; state unchanged.
    NotReady(ConfigIssue),
    /// A request is already outstanding; state unchanged.
    InFlight,
    /// Not in the `Configure` step; state unchanged.
    WrongStep,
    /// The worker is gone; the state is now `Failed`.
    WorkerUnavailable,
}

pub struct WorkflowController {
    state: WorkflowState,
    strategies: Vec<Strategy>,
    catalog_revision: u64,
    catalog_error: Option<String>,
    last_ticket: u64,
    today: Option<NaiveDate>,
    control: Arc<WorkerControl>,
    cmd_tx: Sender<WorkerCommand>,
    resp_rx: Receiver<WorkerResponse>,
    worker: Option<JoinHandle<()>>,
}

impl WorkflowController {
    /// Spawn the worker and start in `SelectStrategy` with the catalog's
    /// cached list.
    pub fn new(
        catalog: Arc<dyn StrategyCatalog>,
        client: Arc<dyn BacktestClient>,
    ) -> io::Result<Self> {
        let strategies = catalog.cached();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let control = Arc::new(WorkerControl::new());
        let worker = spawn_worker(client, catalog, control.clone(), cmd_rx, resp_tx)?;

        Ok(Self {
            state: WorkflowState::SelectStrategy,
            strategies,
            catalog_revision: 0,
            catalog_error: None,
            last_ticket: 0,
            today: None,
            control,
            cmd_tx,
            resp_rx,
            worker: Some(worker),
        })
    }

    /// Pin "today" for the ready predicate instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Bumped every time a catalog load replaces the strategy list.
    pub fn catalog_revision(&self) -> u64 {
        self.catalog_revision
    }

    /// Message from the most recent failed catalog load, if any.
    pub fn catalog_error(&self) -> Option<&str> {
        self.catalog_error.as_deref()
    }

    /// Why the current draft cannot be submitted, if in `Configure`.
    pub fn readiness(&self) -> Option<Result<(), ConfigIssue>> {
        match &self.state {
            WorkflowState::Configure { draft, .. } => {
                Some(draft.validate(self.today()).map(|_| ()))
            }
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// `SelectStrategy` → `Configure` with an empty draft. Ignored elsewhere.
    pub fn select_strategy(&mut self, strategy: Strategy) -> bool {
        if !matches!(self.state, WorkflowState::SelectStrategy) {
            debug!(step = ?self.state.step(), "select_strategy ignored");
            return false;
        }
        info!(strategy = %strategy.id, "strategy selected");
        let draft = ConfigDraft::for_strategy(strategy.id.clone());
        self.state = WorkflowState::Configure { strategy, draft };
        true
    }

    /// Select by id from the current catalog snapshot.
    pub fn select_strategy_by_id(&mut self, id: &str) -> bool {
        match self.strategies.iter().find(|s| s.id == id).cloned() {
            Some(strategy) => self.select_strategy(strategy),
            None => {
                debug!(id, "unknown strategy id");
                false
            }
        }
    }

    /// Merge `patch` into the draft and return the ready predicate. Only
    /// meaningful in `Configure`; returns false elsewhere.
    pub fn update_config(&mut self, patch: ConfigPatch) -> bool {
        let today = self.today();
        match &mut self.state {
            WorkflowState::Configure { draft, .. } => {
                draft.apply(patch);
                draft.is_ready(today)
            }
            other => {
                debug!(step = ?other.step(), "update_config ignored");
                false
            }
        }
    }

    /// Validate the draft and hand it to the worker.
    pub fn submit(&mut self) -> SubmitOutcome {
        let (strategy, config) = match &self.state {
            WorkflowState::Configure { strategy, draft } => match draft.validate(self.today()) {
                Ok(config) => (strategy.clone(), config),
                Err(issue) => return SubmitOutcome::NotReady(issue),
            },
            WorkflowState::Submitting { .. } => return SubmitOutcome::InFlight,
            _ => return SubmitOutcome::WrongStep,
        };

        self.last_ticket += 1;
        let ticket = RequestTicket(self.last_ticket);
        info!(
            ?ticket,
            strategy = %config.strategy_id,
            symbol = %config.symbol,
            start = %config.start_date,
            end = %config.end_date,
            "submitting backtest"
        );

        let command = WorkerCommand::RunBacktest {
            ticket,
            config: config.clone(),
        };
        self.control.activate(ticket);
        if self.cmd_tx.send(command).is_err() {
            warn!(?ticket, "worker channel closed");
            self.control.clear();
            self.state = WorkflowState::Failed {
                strategy,
                config,
                message: WORKER_GONE.into(),
            };
            return SubmitOutcome::WorkerUnavailable;
        }
        self.state = WorkflowState::Submitting {
            strategy,
            config,
            ticket,
        };
        SubmitOutcome::Dispatched(ticket)
    }

    /// Step backward. A request already running keeps running and its answer
    /// is dropped as stale; one still queued is skipped by the worker.
    pub fn back(&mut self) {
        self.control.clear();
        let current = std::mem::replace(&mut self.state, WorkflowState::SelectStrategy);
        self.state = match current {
            WorkflowState::SelectStrategy | WorkflowState::Configure { .. } => {
                WorkflowState::SelectStrategy
            }
            WorkflowState::Submitting {
                strategy,
                config,
                ticket,
            } => {
                debug!(?ticket, "leaving Submitting; response will be ignored");
                WorkflowState::Configure {
                    draft: ConfigDraft::from(&config),
                    strategy,
                }
            }
            WorkflowState::Results {
                strategy, config, ..
            }
            | WorkflowState::Failed {
                strategy, config, ..
            } => WorkflowState::Configure {
                draft: ConfigDraft::from(&config),
                strategy,
            },
        };
    }

    /// Ask the worker to reload the strategy list.
    pub fn refresh_strategies(&mut self) -> bool {
        if self.cmd_tx.send(WorkerCommand::LoadStrategies).is_err() {
            self.catalog_error = Some(WORKER_GONE.into());
            return false;
        }
        true
    }

    // ── Worker responses ─────────────────────────────────────────────

    /// Apply every pending worker response without blocking. Returns true if
    /// anything visible changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.resp_rx.try_recv() {
                Ok(response) => changed |= self.apply(response),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    changed |= self.worker_lost();
                    break;
                }
            }
        }
        changed
    }

    /// Block for at most one worker response. Returns false on timeout.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        match self.resp_rx.recv_timeout(timeout) {
            Ok(response) => {
                self.apply(response);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                self.worker_lost();
                true
            }
        }
    }

    fn apply(&mut self, response: WorkerResponse) -> bool {
        match response {
            WorkerResponse::BacktestFinished { ticket, outcome } => self.finish(ticket, outcome),
            WorkerResponse::StrategiesLoaded(loaded) => self.replace_strategies(loaded),
        }
    }

    fn finish(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<RawBacktestResult, ClientError>,
    ) -> bool {
        let current = std::mem::replace(&mut self.state, WorkflowState::SelectStrategy);
        let (strategy, config) = match current {
            WorkflowState::Submitting {
                strategy,
                config,
                ticket: active,
            } if active == ticket => {
                self.control.clear();
                (strategy, config)
            }
            other => {
                debug!(?ticket, step = ?other.step(), "dropping stale backtest response");
                self.state = other;
                return false;
            }
        };

        let transformed = outcome
            .map_err(|e| e.user_message())
            .and_then(|raw| transform::apply(&raw).map_err(|e| e.to_string()));

        self.state = match transformed {
            Ok(mut result) => {
                result.fill_labels(&config, &strategy);
                info!(
                    ?ticket,
                    symbol = %result.symbol,
                    total_return = result.total_return,
                    sharpe = result.sharpe_ratio,
                    points = result.equity_curve.len(),
                    "backtest finished"
                );
                WorkflowState::Results {
                    strategy,
                    config,
                    result,
                }
            }
            Err(message) => {
                warn!(?ticket, %message, "backtest failed");
                WorkflowState::Failed {
                    strategy,
                    config,
                    message,
                }
            }
        };
        true
    }

    fn replace_strategies(&mut self, loaded: Result<Vec<Strategy>, CatalogError>) -> bool {
        match loaded {
            Ok(list) => {
                debug!(count = list.len(), "strategy list replaced");
                self.strategies = list;
                self.catalog_revision += 1;
                self.catalog_error = None;
            }
            Err(e) => {
                warn!(error = %e, "strategy list load failed; keeping previous list");
                self.catalog_error = Some(e.to_string());
            }
        }
        true
    }

    fn worker_lost(&mut self) -> bool {
        let current = std::mem::replace(&mut self.state, WorkflowState::SelectStrategy);
        match current {
            WorkflowState::Submitting {
                strategy, config, ..
            } => {
                warn!("worker disconnected while a request was in flight");
                self.state = WorkflowState::Failed {
                    strategy,
                    config,
                    message: WORKER_GONE.into(),
                };
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Stop the worker and wait for it to exit. A request already running
    /// finishes first; queued commands are skipped.
    pub fn shutdown(mut self) {
        self.control.stop();
        let _ = self.cmd_tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

impl Drop for WorkflowController {
    fn drop(&mut self) {
        // Detach; the worker exits after its current command.
        self.control.stop();
        let _ = self.cmd_tx.send(WorkerCommand::Shutdown);
    }
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("state", &self.state)
            .field("strategies", &self.strategies.len())
            .field("catalog_revision", &self.catalog_revision)
            .field("last_ticket", &self.last_ticket)
            .finish()
    }
}
