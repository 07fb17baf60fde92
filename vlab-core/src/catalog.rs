//! Strategy catalog: the list the carousel pages over.
//!
//! Two sources: a built-in table and the remote service's strategies
//! endpoint. The remote endpoint has shipped several payload shapes over
//! time; all of them normalize to [`Strategy`] here.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::client::{ClientError, HttpBacktestClient};
use crate::domain::Strategy;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("strategy list request failed: {0}")]
    Fetch(#[from] ClientError),

    #[error("unrecognized strategy list payload: {0}")]
    Shape(String),
}

/// Source of selectable strategies.
pub trait StrategyCatalog: Send + Sync {
    /// Human-readable name of this catalog.
    fn name(&self) -> &str;

    /// Strategies available without I/O. Shown until [`load`](Self::load) returns.
    fn cached(&self) -> Vec<Strategy> {
        Vec::new()
    }

    /// Full list. May block on the network.
    fn load(&self) -> Result<Vec<Strategy>, CatalogError>;
}

/// Fixed in-process strategy table.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    strategies: Vec<Strategy>,
}

impl StaticCatalog {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// The strategies the backend ships with.
    pub fn builtin() -> Self {
        Self::new(vec![
            Strategy::new("simple_moving_average", "Simple Moving Average")
                .with_bullets([
                    "Trend-following strategy",
                    "Buy when short SMA crosses above long SMA",
                    "Sell when short SMA crosses below long SMA",
                    "Best for trending markets",
                ])
                .with_description(
                    "Generates buy signals when the short-term moving average crosses above \
                     the long-term moving average and sell signals when it crosses below.",
                ),
            Strategy::new("exponential_moving_average", "Exponential Moving Average").with_bullets([
                "Trend-following strategy with higher responsiveness",
                "Uses 8 and 20 day EMAs with smoothing factor of 2",
                "More weight given to recent price movements",
                "Better for catching trend changes early",
            ]),
            Strategy::new("rsi_strategy", "Relative Strength Index")
                .with_bullets([
                    "Mean-reversion strategy",
                    "Buy when RSI falls below oversold level",
                    "Sell when RSI rises above overbought level",
                    "Best for range-bound markets",
                ])
                .with_description(
                    "Buys when the RSI falls below the oversold level (typically 30) and sells \
                     when it rises above the overbought level (typically 70).",
                ),
            Strategy::new("momentum_regression", "Momentum Regression")
                .with_bullets([
                    "Advanced multi-timeframe strategy",
                    "Uses regression analysis on price movements",
                    "Adapts to market volatility",
                    "Performs well in trending markets with volatility",
                ])
                .with_description(
                    "Runs regression analysis on multiple moving averages to predict price \
                     momentum and trades on the strength and direction of that prediction.",
                ),
        ])
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    pub fn find(&self, id: &str) -> Option<&Strategy> {
        self.strategies.iter().find(|s| s.id == id)
    }
}

impl StrategyCatalog for StaticCatalog {
    fn name(&self) -> &str {
        "static"
    }

    fn cached(&self) -> Vec<Strategy> {
        self.strategies.clone()
    }

    fn load(&self) -> Result<Vec<Strategy>, CatalogError> {
        Ok(self.strategies.clone())
    }
}

/// Catalog fetched from the backtest service, enriched from a local table.
pub struct RemoteCatalog {
    client: Arc<HttpBacktestClient>,
    local: StaticCatalog,
}

impl RemoteCatalog {
    pub fn new(client: Arc<HttpBacktestClient>, local: StaticCatalog) -> Self {
        Self { client, local }
    }
}

impl StrategyCatalog for RemoteCatalog {
    fn name(&self) -> &str {
        "remote"
    }

    fn cached(&self) -> Vec<Strategy> {
        self.local.cached()
    }

    fn load(&self) -> Result<Vec<Strategy>, CatalogError> {
        let payload = self.client.fetch_strategies()?;
        let strategies = normalize(payload, &self.local)?;
        debug!(count = strategies.len(), "loaded remote strategy list");
        Ok(strategies)
    }
}

/// Every payload shape the strategies endpoint is known to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogPayload {
    /// `{"strategies": <any other shape>}`
    Wrapped { strategies: Box<CatalogPayload> },
    /// `[{"id": …, "name": …, "bulletPoints": […]}, …]`
    Objects(Vec<Strategy>),
    /// `["simple_moving_average", …]`
    Ids(Vec<String>),
    /// `{"simple_moving_average": "Simple Moving Average", …}`
    Names(BTreeMap<String, String>),
}

/// Normalize a raw strategies payload. Missing names, bullets and
/// descriptions are filled from `local` by id; duplicate and blank ids are
/// dropped.
pub fn normalize(payload: Value, local: &StaticCatalog) -> Result<Vec<Strategy>, CatalogError> {
    let parsed: CatalogPayload =
        serde_json::from_value(payload).map_err(|e| CatalogError::Shape(e.to_string()))?;
    let raw = flatten(parsed);

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for mut strategy in raw {
        strategy.id = strategy.id.trim().to_string();
        if strategy.id.is_empty() || !seen.insert(strategy.id.clone()) {
            continue;
        }
        if let Some(known) = local.find(&strategy.id) {
            if strategy.name.trim().is_empty() {
                strategy.name = known.name.clone();
            }
            if strategy.bullet_points.is_empty() {
                strategy.bullet_points = known.bullet_points.clone();
            }
            if strategy.description.is_none() {
                strategy.description = known.description.clone();
            }
        }
        if strategy.name.trim().is_empty() {
            strategy.name = humanize(&strategy.id);
        }
        out.push(strategy);
    }
    Ok(out)
}

fn flatten(payload: CatalogPayload) -> Vec<Strategy> {
    match payload {
        CatalogPayload::Wrapped { strategies } => flatten(*strategies),
        CatalogPayload::Objects(list) => list,
        CatalogPayload::Ids(ids) => ids
            .into_iter()
            .map(|id| Strategy::new(id, String::new()))
            .collect(),
        CatalogPayload::Names(map) => map
            .into_iter()
            .map(|(id, name)| Strategy::new(id, name))
            .collect(),
    }
}

/// `simple_moving_average` → `Simple Moving Average`.
fn humanize(id: &str) -> String {
    id.split(|c: char| c == '_' || c == '-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
