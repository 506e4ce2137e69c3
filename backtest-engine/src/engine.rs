use common::{BacktestResult, PriceSeries, Result, StrategyParameters, Trade};
use tracing::{debug, info};

use crate::indicators::IndicatorSet;
use crate::metrics::{round2, MetricsCalculator};
use crate::portfolio::Portfolio;
use crate::signals::SignalGenerator;

/// Normalized starting equity
pub const INITIAL_CASH: f64 = 1.0;

/// Output of the day-by-day walk, before any metrics are derived
#[derive(Debug, Clone, PartialEq)]
pub struct Simulation {
    pub trades: Vec<Trade>,
    /// Daily equity, index-aligned with the price series
    pub portfolio_values: Vec<f64>,
}

/// Single-asset, long-only backtest engine
pub struct BacktestEngine {
    params: StrategyParameters,
}

impl BacktestEngine {
    pub fn new(params: StrategyParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StrategyParameters {
        &self.params
    }

    /// Run the full backtest: indicators, simulation, strategy and buy-and-hold metrics
    pub fn run(&self, series: &PriceSeries) -> Result<BacktestResult> {
        let simulation = self.simulate(series)?;

        let mut metrics =
            MetricsCalculator::calculate(&simulation.portfolio_values, &simulation.trades);
        let buy_hold_values = MetricsCalculator::buy_hold_values(&series.prices);
        let buy_hold_metrics = MetricsCalculator::calculate(&buy_hold_values, &[]);

        let outperformance = round2(metrics.total_return - buy_hold_metrics.total_return);
        metrics.vs_buy_hold = Some(outperformance);

        let final_value = simulation
            .portfolio_values
            .last()
            .copied()
            .unwrap_or(INITIAL_CASH);
        info!(
            ticker = %series.ticker,
            strategy = %self.params.strategy_type,
            trades = simulation.trades.len(),
            final_value,
            vs_buy_hold = outperformance,
            "backtest completed"
        );

        Ok(BacktestResult {
            ticker: series.ticker.clone(),
            start_date: series.start_date().map(str::to_string),
            end_date: series.end_date().map(str::to_string),
            trades: simulation.trades,
            portfolio_values: simulation.portfolio_values,
            metrics,
            buy_hold_values,
            buy_hold_metrics,
        })
    }

    /// Walk the series bar by bar, trading on the configured signals
    pub fn simulate(&self, series: &PriceSeries) -> Result<Simulation> {
        series.validate()?;
        self.params.validate()?;

        let closes = &series.prices;
        let indicators = IndicatorSet::calculate(closes, &self.params);
        let signal_generator = SignalGenerator::new(&self.params);
        let warmup = self.params.warmup_bars();

        debug!(
            ticker = %series.ticker,
            strategy = signal_generator.strategy_name(),
            bars = closes.len(),
            warmup,
            "running backtest"
        );

        let mut portfolio = Portfolio::new(INITIAL_CASH);
        let mut portfolio_values = Vec::with_capacity(closes.len());
        portfolio_values.push(INITIAL_CASH);

        for (i, &price) in closes.iter().enumerate().skip(1) {
            // Not enough history yet; no position can exist
            if i < warmup {
                portfolio_values.push(portfolio.cash());
                continue;
            }

            let date = series.date(i);

            match portfolio.current_position().copied() {
                None => {
                    if signal_generator.check_entry(&indicators, i) {
                        let trade =
                            portfolio.open_position(i, date, price, self.params.position_size)?;
                        debug!(
                            index = i,
                            date = ?trade.date,
                            price,
                            shares = trade.shares,
                            "entered position"
                        );
                    }
                }
                Some(position) => {
                    if let Some(reason) = signal_generator.check_exit(&indicators, i, &position) {
                        let trade = portfolio.close_position(date, price)?;
                        debug!(
                            index = i,
                            date = ?trade.date,
                            price,
                            value = trade.value,
                            pnl = trade.value - position.cost,
                            %reason,
                            "exited position"
                        );
                    }
                }
            }

            portfolio_values.push(portfolio.equity(price));
        }

        Ok(Simulation {
            trades: portfolio.into_trades(),
            portfolio_values,
        })
    }
}

/// Run one backtest of `params` over `series`
pub fn run_backtest(series: &PriceSeries, params: &StrategyParameters) -> Result<BacktestResult> {
    BacktestEngine::new(params.clone()).run(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use common::{BacktestError, StrategyType, TradeType};

    fn series(prices: Vec<f64>) -> PriceSeries {
        let dates = (0..prices.len())
            .map(|i| format!("2024-01-{:02}", i + 1))
            .collect();
        PriceSeries::from_closes("TEST", dates, prices)
    }

    fn generate_wave(n: usize, base_price: f64) -> Vec<f64> {
        (0..n)
            .map(|i| base_price + (i as f64 * 0.1).sin() * 5.0)
            .collect()
    }

    #[test]
    fn test_empty_series_fails() {
        let engine = BacktestEngine::new(StrategyParameters::default());
        let result = engine.run(&series(vec![]));
        assert!(matches!(result, Err(BacktestError::EmptyPriceSeries)));
    }

    #[test]
    fn test_invalid_params_fail() {
        let engine = BacktestEngine::new(StrategyParameters::default().with_ma_periods(0, 3));
        assert!(matches!(
            engine.run(&series(vec![1.0, 2.0, 3.0])),
            Err(BacktestError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_portfolio_values_aligned() {
        let prices = generate_wave(120, 50.0);
        let engine = BacktestEngine::new(StrategyParameters::default().with_ma_periods(5, 20));
        let simulation = engine.simulate(&series(prices.clone())).unwrap();

        assert_eq!(simulation.portfolio_values.len(), prices.len());
        assert_eq!(simulation.portfolio_values[0], 1.0);
        // Warm-up bars hold cash
        assert!(simulation.portfolio_values[..20].iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_single_bar_series() {
        let engine = BacktestEngine::new(StrategyParameters::default());
        let result = engine.run(&series(vec![42.0])).unwrap();

        assert_eq!(result.portfolio_values, vec![1.0]);
        assert_eq!(result.buy_hold_values, vec![1.0]);
        assert!(result.trades.is_empty());
        assert_eq!(result.metrics.total_return, 0.0);
        assert_eq!(result.metrics.vs_buy_hold, Some(0.0));
    }

    #[test]
    fn test_entry_then_take_profit() {
        let params = StrategyParameters::default()
            .with_ma_periods(2, 3)
            .with_take_profit(10.0);
        let engine = BacktestEngine::new(params);
        // Cross at idx 4 (entry 11), 12.5 > 12.1 at idx 6 takes profit
        let prices = vec![10.0, 10.0, 10.0, 10.0, 11.0, 12.0, 12.5, 12.5];
        let result = engine.run(&series(prices)).unwrap();

        assert_eq!(result.trades.len(), 2);
        assert_eq!(result.trades[0].trade_type, TradeType::Entry);
        assert_eq!(result.trades[0].date.as_deref(), Some("2024-01-05"));
        assert_eq!(result.trades[0].price, 11.0);
        assert_eq!(result.trades[1].trade_type, TradeType::Exit);
        assert_eq!(result.trades[1].date.as_deref(), Some("2024-01-07"));
        assert_eq!(result.trades[1].price, 12.5);

        let final_value = result.final_value();
        assert_relative_eq!(final_value, 12.5 / 11.0, epsilon = 1e-12);
        assert_eq!(result.metrics.num_trades, 1);
        assert_eq!(result.metrics.win_rate, 100.0);
    }

    #[test]
    fn test_open_position_is_marked_to_market() {
        let params = StrategyParameters::default()
            .with_ma_periods(2, 3)
            .with_take_profit(1000.0);
        let engine = BacktestEngine::new(params);
        let prices = vec![10.0, 10.0, 10.0, 10.0, 11.0, 12.0, 13.0];
        let result = engine.run(&series(prices)).unwrap();

        assert_eq!(result.trades.len(), 1);
        assert_relative_eq!(result.portfolio_values[6], 13.0 / 11.0, epsilon = 1e-12);
        // Open entry with no exit is not a win
        assert_eq!(result.metrics.win_rate, 0.0);
        assert_eq!(result.metrics.num_trades, 1);
    }

    #[test]
    fn test_position_size_scales_exposure() {
        let params = StrategyParameters::default()
            .with_ma_periods(2, 3)
            .with_take_profit(1000.0)
            .with_position_size(0.5);
        let engine = BacktestEngine::new(params);
        let prices = vec![10.0, 10.0, 10.0, 10.0, 11.0, 12.0, 13.2];
        let result = engine.run(&series(prices)).unwrap();

        assert_relative_eq!(result.trades[0].value, 0.5);
        assert_relative_eq!(result.final_value(), 0.5 + 0.5 * 13.2 / 11.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_strategy_holds_cash() {
        let params = StrategyParameters::default()
            .with_strategy(StrategyType::Unknown("moon_phase".to_string()))
            .with_ma_periods(2, 3);
        let engine = BacktestEngine::new(params);
        let result = engine.run(&series(generate_wave(100, 50.0))).unwrap();

        assert!(result.trades.is_empty());
        assert!(result.portfolio_values.iter().all(|v| *v == 1.0));
        assert_eq!(result.metrics.total_return, 0.0);
    }

    #[test]
    fn test_backtest_without_dates() {
        let params = StrategyParameters::default().with_ma_periods(2, 3);
        let engine = BacktestEngine::new(params);
        let series = PriceSeries::from_closes(
            "NODATES",
            vec![],
            vec![10.0, 10.0, 10.0, 10.0, 11.0, 12.0],
        );
        let result = engine.run(&series).unwrap();

        assert!(result.start_date.is_none());
        assert!(result.end_date.is_none());
        assert_eq!(result.trades.len(), 1);
        assert!(result.trades[0].date.is_none());
    }

    #[test]
    fn test_vs_buy_hold() {
        let params = StrategyParameters::default().with_ma_periods(2, 3);
        let engine = BacktestEngine::new(params);
        let result = engine.run(&series(generate_wave(200, 50.0))).unwrap();

        let expected =
            round2(result.metrics.total_return - result.buy_hold_metrics.total_return);
        assert_eq!(result.metrics.vs_buy_hold, Some(expected));
        assert!(result.buy_hold_metrics.vs_buy_hold.is_none());
        assert_eq!(result.buy_hold_metrics.num_trades, 0);
    }
}
