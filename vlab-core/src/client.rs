//! Request client for the remote backtest service.
//!
//! The client serializes a validated configuration, posts it, and hands the
//! raw payload back. It does not re-check business rules and it does not
//! interpret metrics; that is [`crate::transform`]'s job.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::domain::BacktestConfiguration;

/// Failures surfaced by the request client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network unreachable: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status} (detail: {detail:?})")]
    Status { status: u16, detail: Option<String> },

    #[error("response body could not be parsed: {0}")]
    MalformedBody(String),

    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

impl ClientError {
    /// Message shown to the user in the `Failed` step.
    ///
    /// A server-provided `detail` is used verbatim.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ClientError::Status { status, detail: None } => {
                format!("Backtest request failed (HTTP {status})")
            }
            ClientError::Transport(e) => format!("Unable to reach the backtest service: {e}"),
            ClientError::Timeout(e) => format!("The backtest service did not respond in time: {e}"),
            ClientError::MalformedBody(e) => {
                format!("The backtest service returned an unreadable response: {e}")
            }
            ClientError::Setup(e) => format!("Backtest client is misconfigured: {e}"),
        }
    }
}

/// Outbound body for `POST /backtest/run`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRequest {
    pub symbol: String,
    pub strategy_name: String,
    pub start_date: String,
    pub end_date: String,
    pub parameters: serde_json::Map<String, Value>,
}

impl From<&BacktestConfiguration> for RunRequest {
    fn from(config: &BacktestConfiguration) -> Self {
        Self {
            symbol: config.symbol.to_uppercase(),
            strategy_name: config.strategy_id.clone(),
            start_date: config.start_date.format("%Y-%m-%d").to_string(),
            end_date: config.end_date.format("%Y-%m-%d").to_string(),
            parameters: serde_json::Map::new(),
        }
    }
}

/// Success body as it comes off the wire.
///
/// Every field is optional so a partial body still parses; the transform
/// decides which absences are contract violations. Unknown fields such as
/// `signals` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBacktestResult {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub strategy_display_name: Option<String>,
    #[serde(default)]
    pub total_return: Option<f64>,
    #[serde(default)]
    pub sharpe_ratio: Option<f64>,
    #[serde(default)]
    pub max_drawdown: Option<f64>,
    #[serde(default)]
    pub equity_curve: Option<Vec<f64>>,
}

/// Abstraction over the remote backtest service.
pub trait BacktestClient: Send + Sync {
    /// Submit one configuration and wait for the raw result.
    fn run(&self, config: &BacktestConfiguration) -> Result<RawBacktestResult, ClientError>;
}

/// Map a status code and body to a raw result or a failure.
pub fn interpret_response(status: u16, body: &str) -> Result<RawBacktestResult, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::Status {
            status,
            detail: extract_detail(body),
        });
    }
    serde_json::from_str(body).map_err(|e| ClientError::MalformedBody(e.to_string()))
}

/// Pull a string `detail` out of an error body, unchanged. Blank details
/// count as absent.
fn extract_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?.as_str()?;
    if detail.trim().is_empty() {
        None
    } else {
        Some(detail.to_string())
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Blocking reqwest implementation of [`BacktestClient`].
pub struct HttpBacktestClient {
    http: reqwest::blocking::Client,
    run_url: String,
    strategies_url: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpBacktestClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(concat!("vlab/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Setup(e.to_string()))?;

        Ok(Self {
            http,
            run_url: join_url(&config.base_url, &config.run_path),
            strategies_url: join_url(&config.base_url, &config.strategies_path),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub fn run_url(&self) -> &str {
        &self.run_url
    }

    /// Fetch the raw strategy list payload. Shape normalization lives in
    /// [`crate::catalog`].
    pub fn fetch_strategies(&self) -> Result<Value, ClientError> {
        let resp = self.send_with_retry(|| self.http.get(&self.strategies_url))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(ClientError::Status {
                status,
                detail: extract_detail(&body),
            });
        }
        serde_json::from_str(&body).map_err(|e| ClientError::MalformedBody(e.to_string()))
    }

    /// Send with retry on connect/timeout failures only. HTTP status codes are
    /// returned to the caller untouched.
    fn send_with_retry<F>(&self, build: F) -> Result<reqwest::blocking::Response, ClientError>
    where
        F: Fn() -> reqwest::blocking::RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            match build().send() {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    let retryable = e.is_connect() || e.is_timeout();
                    if !retryable || attempt >= self.max_retries {
                        return Err(classify(e));
                    }
                    let delay = self
                        .retry_backoff
                        .saturating_mul(2u32.saturating_pow(attempt));
                    debug!(attempt, ?delay, error = %e, "retrying request");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}

fn classify(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout(e.to_string())
    } else {
        ClientError::Transport(e.to_string())
    }
}

impl BacktestClient for HttpBacktestClient {
    fn run(&self, config: &BacktestConfiguration) -> Result<RawBacktestResult, ClientError> {
        let body = RunRequest::from(config);
        let resp = self.send_with_retry(|| self.http.post(&self.run_url).json(&body))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let outcome = interpret_response(status, &text);
        if let Err(e) = &outcome {
            warn!(symbol = %config.symbol, error = %e, "backtest request failed");
        }
        outcome
    }
}
