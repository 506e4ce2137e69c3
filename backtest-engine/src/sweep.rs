use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use common::{
    BacktestError, PerformanceMetrics, PriceSeries, Result, StrategyParameters, StrategyType,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::run_backtest;

/// Metric a sweep ranks candidates by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationGoal {
    Sharpe,
    Return,
    Drawdown,
}

impl OptimizationGoal {
    /// Higher is better for every goal
    pub fn score(&self, metrics: &PerformanceMetrics) -> f64 {
        match self {
            OptimizationGoal::Sharpe => metrics.sharpe_ratio,
            OptimizationGoal::Return => metrics.total_return,
            OptimizationGoal::Drawdown => -metrics.max_drawdown,
        }
    }
}

impl FromStr for OptimizationGoal {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sharpe" => Ok(OptimizationGoal::Sharpe),
            "return" => Ok(OptimizationGoal::Return),
            "drawdown" => Ok(OptimizationGoal::Drawdown),
            other => Err(BacktestError::InvalidParameter(format!(
                "unknown optimization goal: {} (expected sharpe, return or drawdown)",
                other
            ))),
        }
    }
}

impl fmt::Display for OptimizationGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OptimizationGoal::Sharpe => "sharpe",
            OptimizationGoal::Return => "return",
            OptimizationGoal::Drawdown => "drawdown",
        };
        f.write_str(s)
    }
}

/// Cartesian product of candidate values layered over a base parameter set
#[derive(Debug, Clone)]
pub struct ParameterGrid {
    base: StrategyParameters,
    axes: Vec<(String, Vec<f64>)>,
}

impl ParameterGrid {
    pub fn new(base: StrategyParameters) -> Self {
        Self {
            base,
            axes: Vec::new(),
        }
    }

    pub fn axis(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.axes.push((name.into(), values));
        self
    }

    /// Grid over the windows and thresholds of the base strategy's family
    pub fn default_for(base: StrategyParameters) -> Self {
        let grid = match base.strategy_type {
            StrategyType::MaCrossover => Self::new(base)
                .axis("ma_fast", vec![5.0, 10.0, 20.0])
                .axis("ma_slow", vec![30.0, 50.0, 100.0]),
            StrategyType::RsiOversold => Self::new(base)
                .axis("rsi_period", vec![7.0, 14.0, 21.0])
                .axis("rsi_oversold", vec![20.0, 25.0, 30.0, 35.0]),
            StrategyType::BollingerBounce => Self::new(base)
                .axis("bb_period", vec![10.0, 20.0, 30.0])
                .axis("bb_std", vec![1.5, 2.0, 2.5]),
            StrategyType::MacdCrossover => Self::new(base)
                .axis("macd_fast", vec![8.0, 12.0])
                .axis("macd_slow", vec![21.0, 26.0, 34.0])
                .axis("macd_signal", vec![5.0, 9.0]),
            StrategyType::Unknown(_) => return Self::new(base),
        };
        grid.axis("stop_loss_pct", vec![3.0, 5.0, 8.0])
    }

    /// Every combination, in axis order (last axis varies fastest)
    pub fn candidates(&self) -> Result<Vec<StrategyParameters>> {
        let mut candidates = vec![self.base.clone()];

        for (name, values) in &self.axes {
            if values.is_empty() {
                continue;
            }
            let mut next = Vec::with_capacity(candidates.len() * values.len());
            for candidate in &candidates {
                for &value in values {
                    let mut params = candidate.clone();
                    params.set_value(name, value)?;
                    next.push(params);
                }
            }
            candidates = next;
        }

        Ok(candidates)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepEntry {
    pub params: StrategyParameters,
    pub metrics: PerformanceMetrics,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub ticker: String,
    pub goal: OptimizationGoal,
    pub evaluated: usize,
    pub best: SweepEntry,
    /// All candidates, best first
    pub leaderboard: Vec<SweepEntry>,
}

/// Backtest every grid candidate in parallel and rank them by `goal`.
///
/// Ties keep grid order, so the report is deterministic.
pub fn optimize(
    series: &PriceSeries,
    grid: &ParameterGrid,
    goal: OptimizationGoal,
) -> Result<SweepReport> {
    series.validate()?;
    let candidates = grid.candidates()?;

    let mut leaderboard = candidates
        .into_par_iter()
        .map(|params| {
            let result = run_backtest(series, &params)?;
            let score = goal.score(&result.metrics);
            Ok(SweepEntry {
                params,
                metrics: result.metrics,
                score,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    leaderboard.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let best = leaderboard
        .first()
        .cloned()
        .ok_or_else(|| BacktestError::InvalidParameter("parameter grid is empty".to_string()))?;

    info!(
        ticker = %series.ticker,
        %goal,
        evaluated = leaderboard.len(),
        best_score = best.score,
        "sweep completed"
    );

    Ok(SweepReport {
        ticker: series.ticker.clone(),
        goal,
        evaluated: leaderboard.len(),
        best,
        leaderboard,
    })
}
