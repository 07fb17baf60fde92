//! Domain types shared by the controller, the client and the shells.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A selectable trading strategy. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "bulletPoints")]
    pub bullet_points: Vec<String>,
    /// Longer tooltip-style description, when one is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Strategy {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bullet_points: Vec::new(),
            description: None,
        }
    }

    pub fn with_bullets<I, S>(mut self, bullets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bullet_points = bullets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ticker normalization: trimmed and uppercased.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// A complete, validated backtest request.
///
/// Only constructed through [`ConfigDraft::validate`], so
/// `start_date <= end_date <= today` and a non-empty symbol always hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestConfiguration {
    pub strategy_id: String,
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Why a draft cannot be submitted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssue {
    MissingSymbol,
    MissingStartDate,
    MissingEndDate,
    StartAfterEnd,
    EndInFuture,
}

impl ConfigIssue {
    /// Short hint for a disabled submit affordance.
    pub fn hint(self) -> &'static str {
        match self {
            ConfigIssue::MissingSymbol => "enter a symbol",
            ConfigIssue::MissingStartDate => "enter a start date",
            ConfigIssue::MissingEndDate => "enter an end date",
            ConfigIssue::StartAfterEnd => "start date must not be after end date",
            ConfigIssue::EndInFuture => "end date must not be in the future",
        }
    }
}

/// The configuration being edited during the `Configure` step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigDraft {
    pub strategy_id: String,
    pub symbol: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ConfigDraft {
    /// Empty draft for a freshly selected strategy.
    pub fn for_strategy(strategy_id: impl Into<String>) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            ..Self::default()
        }
    }

    /// Merge a patch into the draft. Symbols are normalized on the way in.
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(symbol) = patch.symbol {
            self.symbol = normalize_symbol(&symbol);
        }
        if let Some(start) = patch.start_date {
            self.start_date = start;
        }
        if let Some(end) = patch.end_date {
            self.end_date = end;
        }
    }

    /// Check the ready predicate and build the request if it holds.
    pub fn validate(&self, today: NaiveDate) -> Result<BacktestConfiguration, ConfigIssue> {
        if self.symbol.is_empty() {
            return Err(ConfigIssue::MissingSymbol);
        }
        let start = self.start_date.ok_or(ConfigIssue::MissingStartDate)?;
        let end = self.end_date.ok_or(ConfigIssue::MissingEndDate)?;
        if start > end {
            return Err(ConfigIssue::StartAfterEnd);
        }
        if end > today {
            return Err(ConfigIssue::EndInFuture);
        }
        Ok(BacktestConfiguration {
            strategy_id: self.strategy_id.clone(),
            symbol: self.symbol.clone(),
            start_date: start,
            end_date: end,
        })
    }

    pub fn is_ready(&self, today: NaiveDate) -> bool {
        self.validate(today).is_ok()
    }
}

impl From<&BacktestConfiguration> for ConfigDraft {
    fn from(config: &BacktestConfiguration) -> Self {
        Self {
            strategy_id: config.strategy_id.clone(),
            symbol: config.symbol.clone(),
            start_date: Some(config.start_date),
            end_date: Some(config.end_date),
        }
    }
}

/// Partial update for a [`ConfigDraft`]. Unset fields are left untouched.
///
/// Dates use a nested `Option` so a field can be explicitly cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    pub symbol: Option<String>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
}

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(Some(date));
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(Some(date));
        self
    }

    pub fn clear_start_date(mut self) -> Self {
        self.start_date = Some(None);
        self
    }

    pub fn clear_end_date(mut self) -> Self {
        self.end_date = Some(None);
        self
    }
}

/// One chart point. The remote payload carries no timestamps, so the
/// x-axis is the zero-based position in the curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub index: usize,
    pub value: f64,
}

/// Display-ready outcome of a successful backtest.
///
/// Fractions are stored unscaled (0.153, not 15.3); formatting happens in
/// [`crate::format`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy_display_name: String,
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub equity_curve: Vec<EquityPoint>,
}

impl BacktestResult {
    /// Fill blank labels from the request that produced this result.
    pub fn fill_labels(&mut self, config: &BacktestConfiguration, strategy: &Strategy) {
        if self.symbol.is_empty() {
            self.symbol = config.symbol.clone();
        }
        if self.strategy_display_name.is_empty() {
            self.strategy_display_name = strategy.name.clone();
        }
    }

    pub fn final_equity(&self) -> Option<f64> {
        self.equity_curve.last().map(|p| p.value)
    }

    /// (min, max) of the curve values, for chart bounds.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        if self.equity_curve.is_empty() {
            return None;
        }
        let (min, max) = self
            .equity_curve
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.value), hi.max(p.value))
            });
        Some((min, max))
    }
}
