//! VolatilityLab core: everything behind the console's backtest page.
//!
//! - Domain types (strategies, configuration drafts, results)
//! - Strategy catalog (built-in table or remote fetch)
//! - Page-windowing cursor for the strategy carousel
//! - Blocking HTTP client for the remote backtest service
//! - Raw payload → chart-ready result transform
//! - Workflow state machine with a background worker thread

pub mod catalog;
pub mod client;
pub mod config;
pub mod domain;
pub mod export;
pub mod format;
pub mod pagination;
pub mod transform;
pub mod worker;
pub mod workflow;

pub use catalog::{CatalogError, StaticCatalog, StrategyCatalog};
pub use client::{BacktestClient, ClientError, HttpBacktestClient, RawBacktestResult};
pub use config::VlabConfig;
pub use domain::{
    BacktestConfiguration, BacktestResult, ConfigDraft, ConfigIssue, ConfigPatch, EquityPoint,
    Strategy,
};
pub use pagination::{Clock, ManualClock, PageWindow, PaginationCursor, SystemClock};
pub use workflow::{RequestTicket, Step, SubmitOutcome, WorkflowController, WorkflowState};

#[cfg(test)]
mod tests {
    use super::*;

    /// Everything that crosses the worker channel must be Send.
    #[allow(dead_code)]
    fn assert_send() {
        fn require_send<T: Send>() {}
        require_send::<BacktestConfiguration>();
        require_send::<RawBacktestResult>();
        require_send::<ClientError>();
        require_send::<CatalogError>();
        require_send::<Strategy>();
        require_send::<worker::WorkerCommand>();
        require_send::<worker::WorkerResponse>();
    }
}
