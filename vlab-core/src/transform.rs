//! Raw service payload → display-ready [`BacktestResult`].

use thiserror::Error;

use crate::client::RawBacktestResult;
use crate::domain::{BacktestResult, EquityPoint};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("backtest result is missing `{0}`")]
    MissingField(&'static str),

    #[error("backtest result has an empty equity curve")]
    EmptyEquityCurve,
}

/// Metrics pass through unscaled and unrounded. Curve values are paired with
/// their zero-based position. Labels default to empty when absent.
pub fn apply(raw: &RawBacktestResult) -> Result<BacktestResult, TransformError> {
    let total_return = raw
        .total_return
        .ok_or(TransformError::MissingField("total_return"))?;
    let sharpe_ratio = raw
        .sharpe_ratio
        .ok_or(TransformError::MissingField("sharpe_ratio"))?;
    let max_drawdown = raw
        .max_drawdown
        .ok_or(TransformError::MissingField("max_drawdown"))?;
    let curve = raw
        .equity_curve
        .as_ref()
        .ok_or(TransformError::MissingField("equity_curve"))?;
    if curve.is_empty() {
        return Err(TransformError::EmptyEquityCurve);
    }

    Ok(BacktestResult {
        symbol: raw.symbol.clone().unwrap_or_default(),
        strategy_display_name: raw.strategy_display_name.clone().unwrap_or_default(),
        total_return,
        sharpe_ratio,
        max_drawdown,
        equity_curve: curve
            .iter()
            .enumerate()
            .map(|(index, &value)| EquityPoint { index, value })
            .collect(),
    })
}
