//! Background worker thread. Blocking network calls run here.
//!
//! Communication with the controller is via `mpsc` channels. Commands are
//! processed one at a time, in order. A shared [`WorkerControl`] lets the
//! controller withdraw queued backtests and stop the worker without waiting
//! for the queue to drain.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::catalog::{CatalogError, StrategyCatalog};
use crate::client::{BacktestClient, ClientError, RawBacktestResult};
use crate::domain::{BacktestConfiguration, Strategy};
use crate::workflow::RequestTicket;

/// Commands sent from the controller to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    RunBacktest {
        ticket: RequestTicket,
        config: BacktestConfiguration,
    },
    LoadStrategies,
    Shutdown,
}

/// Responses sent from the worker back to the controller.
#[derive(Debug)]
pub enum WorkerResponse {
    BacktestFinished {
        ticket: RequestTicket,
        outcome: Result<RawBacktestResult, ClientError>,
    },
    StrategiesLoaded(Result<Vec<Strategy>, CatalogError>),
}

/// State shared between the controller and its worker.
///
/// A queued `RunBacktest` only runs while its ticket is the active one; a
/// request already inside `BacktestClient::run` always finishes.
#[derive(Debug, Default)]
pub struct WorkerControl {
    active_ticket: AtomicU64,
    stopping: AtomicBool,
}

impl WorkerControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&self, ticket: RequestTicket) {
        self.active_ticket.store(ticket.0, Ordering::SeqCst);
    }

    /// No submission is awaited any more.
    pub fn clear(&self) {
        self.active_ticket.store(0, Ordering::SeqCst);
    }

    pub fn is_active(&self, ticket: RequestTicket) -> bool {
        ticket.0 != 0 && self.active_ticket.load(Ordering::SeqCst) == ticket.0
    }

    /// Skip everything still queued and exit after the current command.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        self.clear();
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    client: Arc<dyn BacktestClient>,
    catalog: Arc<dyn StrategyCatalog>,
    control: Arc<WorkerControl>,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("vlab-worker".into())
        .spawn(move || worker_loop(client.as_ref(), catalog.as_ref(), &control, rx, tx))
}

fn worker_loop(
    client: &dyn BacktestClient,
    catalog: &dyn StrategyCatalog,
    control: &WorkerControl,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
) {
    loop {
        if control.is_stopping() {
            break;
        }
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(cmd) => {
                if !handle_command(cmd, client, catalog, control, &tx) {
                    break;
                }
            }
        }
    }
    debug!("worker stopped");
}

/// Returns false once the controller side has hung up.
fn handle_command(
    cmd: WorkerCommand,
    client: &dyn BacktestClient,
    catalog: &dyn StrategyCatalog,
    control: &WorkerControl,
    tx: &Sender<WorkerResponse>,
) -> bool {
    let response = match cmd {
        WorkerCommand::RunBacktest { ticket, .. } if !control.is_active(ticket) => {
            debug!(?ticket, "skipping withdrawn backtest");
            return true;
        }
        WorkerCommand::RunBacktest { ticket, config } => {
            debug!(?ticket, symbol = %config.symbol, "running backtest");
            WorkerResponse::BacktestFinished {
                ticket,
                outcome: client.run(&config),
            }
        }
        WorkerCommand::LoadStrategies => {
            debug!(catalog = catalog.name(), "loading strategies");
            WorkerResponse::StrategiesLoaded(catalog.load())
        }
        WorkerCommand::Shutdown => return false,
    };
    tx.send(response).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use chrono::NaiveDate;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    struct EchoClient;

    impl BacktestClient for EchoClient {
        fn run(&self, config: &BacktestConfiguration) -> Result<RawBacktestResult, ClientError> {
            Ok(RawBacktestResult {
                symbol: Some(config.symbol.clone()),
                ..RawBacktestResult::default()
            })
        }
    }

    /// Sleeps, then counts the call.
    struct SlowClient {
        delay: Duration,
        calls: AtomicUsize,
    }

    impl BacktestClient for SlowClient {
        fn run(&self, config: &BacktestConfiguration) -> Result<RawBacktestResult, ClientError> {
            std::thread::sleep(self.delay);
            self.calls.fetch_add(1, Ordering::SeqCst);
            EchoClient.run(config)
        }
    }

    fn spawn_with(
        client: Arc<dyn BacktestClient>,
        control: Arc<WorkerControl>,
    ) -> (
        Sender<WorkerCommand>,
        Receiver<WorkerResponse>,
        JoinHandle<()>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(
            client,
            Arc::new(StaticCatalog::builtin()),
            control,
            cmd_rx,
            resp_tx,
        )
        .unwrap();
        (cmd_tx, resp_rx, handle)
    }

    fn spawn() -> (
        Sender<WorkerCommand>,
        Receiver<WorkerResponse>,
        JoinHandle<()>,
    ) {
        let control = Arc::new(WorkerControl::new());
        control.activate(RequestTicket(7));
        spawn_with(Arc::new(EchoClient), control)
    }

    fn spy_config() -> BacktestConfiguration {
        BacktestConfiguration {
            strategy_id: "sma".into(),
            symbol: "SPY".into(),
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 2, 1).unwrap(),
        }
    }

    #[test]
    fn worker_shutdown() {
        let (cmd_tx, _resp_rx, handle) = spawn();
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().expect("worker should join cleanly");
    }

    #[test]
    fn worker_exits_when_controller_hangs_up() {
        let (cmd_tx, _resp_rx, handle) = spawn();
        drop(cmd_tx);
        handle.join().unwrap();
    }

    #[test]
    fn run_echoes_ticket() {
        let (cmd_tx, resp_rx, handle) = spawn();
        cmd_tx
            .send(WorkerCommand::RunBacktest {
                ticket: RequestTicket(7),
                config: spy_config(),
            })
            .unwrap();

        match resp_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            WorkerResponse::BacktestFinished { ticket, outcome } => {
                assert_eq!(ticket, RequestTicket(7));
                assert_eq!(outcome.unwrap().symbol.as_deref(), Some("SPY"));
            }
            other => panic!("unexpected response: {other:?}"),
        }

        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn load_strategies_reports_catalog() {
        let (cmd_tx, resp_rx, handle) = spawn();
        cmd_tx.send(WorkerCommand::LoadStrategies).unwrap();
        match resp_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            WorkerResponse::StrategiesLoaded(Ok(list)) => assert_eq!(list.len(), 4),
            other => panic!("unexpected response: {other:?}"),
        }
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn withdrawn_ticket_is_skipped() {
        let control = Arc::new(WorkerControl::new());
        control.activate(RequestTicket(2));
        let (cmd_tx, resp_rx, handle) = spawn_with(Arc::new(EchoClient), control);
        for n in 1..=2 {
            cmd_tx
                .send(WorkerCommand::RunBacktest {
                    ticket: RequestTicket(n),
                    config: spy_config(),
                })
                .unwrap();
        }

        match resp_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            WorkerResponse::BacktestFinished { ticket, .. } => {
                assert_eq!(ticket, RequestTicket(2))
            }
            other => panic!("unexpected response: {other:?}"),
        }
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
        assert!(resp_rx.try_recv().is_err());
    }

    #[test]
    fn stop_skips_queued_work() {
        let client = Arc::new(SlowClient {
            delay: Duration::from_millis(300),
            calls: AtomicUsize::new(0),
        });
        let control = Arc::new(WorkerControl::new());
        control.activate(RequestTicket(1));
        let (cmd_tx, _resp_rx, handle) = spawn_with(client.clone(), control.clone());
        for _ in 0..4 {
            cmd_tx
                .send(WorkerCommand::RunBacktest {
                    ticket: RequestTicket(1),
                    config: spy_config(),
                })
                .unwrap();
        }
        // Let the first request start before stopping.
        std::thread::sleep(Duration::from_millis(50));

        let started = Instant::now();
        control.stop();
        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(900));
    }
}
