use common::{PerformanceMetrics, Trade};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Floor on the return standard deviation used by the Sharpe ratio
const MIN_RETURN_STD: f64 = 1e-10;

/// Calculate performance metrics from a portfolio-value series and trade log
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Calculate all performance metrics.
    ///
    /// Series shorter than two samples produce all-zero metrics.
    pub fn calculate(portfolio_values: &[f64], trades: &[Trade]) -> PerformanceMetrics {
        if portfolio_values.len() < 2 {
            return PerformanceMetrics::default();
        }

        let initial = portfolio_values[0];
        let final_value = portfolio_values[portfolio_values.len() - 1];

        let daily_returns = Self::calculate_daily_returns(portfolio_values);
        let (win_rate, num_trades) = Self::calculate_trade_stats(trades);

        PerformanceMetrics {
            total_return: round2(Self::calculate_total_return(initial, final_value)),
            cagr: round2(Self::calculate_cagr(initial, final_value, portfolio_values.len())),
            sharpe_ratio: round2(Self::calculate_sharpe_ratio(&daily_returns)),
            max_drawdown: round2(Self::calculate_max_drawdown(portfolio_values)),
            win_rate: round2(win_rate),
            num_trades,
            vs_buy_hold: None,
        }
    }

    /// Value series of holding one share bought on day 0, normalized to start at 1.0
    pub fn buy_hold_values(prices: &[f64]) -> Vec<f64> {
        let Some(&first) = prices.first() else {
            return vec![1.0];
        };
        prices.iter().map(|p| p / first).collect()
    }

    fn calculate_total_return(initial: f64, final_value: f64) -> f64 {
        if initial == 0.0 {
            return 0.0;
        }
        (final_value / initial - 1.0) * 100.0
    }

    /// `(final / initial)^(252 / n) - 1` as a percentage, n = number of samples
    fn calculate_cagr(initial: f64, final_value: f64, samples: usize) -> f64 {
        let years = samples as f64 / TRADING_DAYS_PER_YEAR;
        if years <= 0.0 || initial <= 0.0 || final_value <= 0.0 {
            return 0.0;
        }
        ((final_value / initial).powf(1.0 / years) - 1.0) * 100.0
    }

    /// Day-over-day simple returns
    fn calculate_daily_returns(portfolio_values: &[f64]) -> Vec<f64> {
        portfolio_values
            .windows(2)
            .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
            .collect()
    }

    /// Annualized Sharpe ratio with a zero risk-free rate and population std
    fn calculate_sharpe_ratio(daily_returns: &[f64]) -> f64 {
        if daily_returns.is_empty() {
            return 0.0;
        }

        let n = daily_returns.len() as f64;
        let mean = daily_returns.iter().sum::<f64>() / n;
        let variance = daily_returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt().max(MIN_RETURN_STD);

        mean / std * TRADING_DAYS_PER_YEAR.sqrt()
    }

    /// Largest peak-to-trough decline, as a percentage of the running peak
    fn calculate_max_drawdown(portfolio_values: &[f64]) -> f64 {
        let mut peak = portfolio_values[0];
        let mut max_drawdown: f64 = 0.0;

        for &value in portfolio_values {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                max_drawdown = max_drawdown.max((peak - value) / peak);
            }
        }

        max_drawdown * 100.0
    }

    /// Win rate over entry/exit pairs taken in order, and the number of entries
    fn calculate_trade_stats(trades: &[Trade]) -> (f64, u32) {
        let entries: Vec<&Trade> = trades.iter().filter(|t| t.is_entry()).collect();
        let exits = trades.iter().filter(|t| t.is_exit());

        if entries.is_empty() {
            return (0.0, 0);
        }

        let winning = entries
            .iter()
            .zip(exits)
            .filter(|(entry, exit)| exit.price > entry.price)
            .count();

        (
            winning as f64 / entries.len() as f64 * 100.0,
            entries.len() as u32,
        )
    }
}

/// Round to 2 decimal places, folding negative zero into zero
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn round_trip(entry: f64, exit: f64) -> Vec<Trade> {
        vec![
            Trade::entry(None, entry, 1.0 / entry, 1.0),
            Trade::exit(None, exit, 1.0 / entry, exit / entry),
        ]
    }

    #[test]
    fn test_flat_series() {
        let metrics = MetricsCalculator::calculate(&[1.0, 1.0], &[]);

        assert_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.cagr, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.num_trades, 0);
        assert!(metrics.vs_buy_hold.is_none());
    }

    #[test]
    fn test_short_series_is_zeroed() {
        assert_eq!(
            MetricsCalculator::calculate(&[1.0], &[]),
            PerformanceMetrics::default()
        );
        assert_eq!(
            MetricsCalculator::calculate(&[], &[]),
            PerformanceMetrics::default()
        );
    }

    #[test]
    fn test_total_return() {
        let metrics = MetricsCalculator::calculate(&[1.0, 1.01, 1.02, 1.03, 1.04], &[]);
        assert_eq!(metrics.total_return, 4.0);
    }

    #[test]
    fn test_cagr_over_one_year() {
        // 252 samples is exactly one year: CAGR equals total return
        let mut values = vec![1.0; 252];
        values[251] = 1.1;
        let metrics = MetricsCalculator::calculate(&values, &[]);

        assert_eq!(metrics.total_return, 10.0);
        assert_eq!(metrics.cagr, 10.0);
    }

    #[test]
    fn test_cagr_short_window_compounds() {
        // 126 samples = half a year: 1.1^2 - 1 = 21%
        let mut values = vec![1.0; 126];
        values[125] = 1.1;
        let metrics = MetricsCalculator::calculate(&values, &[]);

        assert_eq!(metrics.cagr, 21.0);
    }

    #[test]
    fn test_max_drawdown() {
        let values = [1.0, 1.1, 0.9, 0.95, 1.05];
        let dd = MetricsCalculator::calculate_max_drawdown(&values);

        // Peak 1.1, trough 0.9 = 18.18%
        assert_relative_eq!(dd, 0.2 / 1.1 * 100.0, epsilon = 1e-9);
        assert_eq!(MetricsCalculator::calculate(&values, &[]).max_drawdown, 18.18);
    }

    #[test]
    fn test_sharpe_ratio_matches_definition() {
        let values = [1.0, 1.02, 1.01, 1.04];
        let returns = MetricsCalculator::calculate_daily_returns(&values);
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let std = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();

        assert_relative_eq!(
            MetricsCalculator::calculate_sharpe_ratio(&returns),
            mean / std * 252f64.sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_sharpe_ratio_negative_for_losses() {
        let metrics = MetricsCalculator::calculate(&[1.0, 0.99, 0.97, 0.96, 0.93], &[]);
        assert!(metrics.sharpe_ratio < 0.0);
    }

    #[test]
    fn test_win_rate_pairs_in_order() {
        let mut trades = round_trip(10.0, 11.0);
        trades.extend(round_trip(20.0, 19.0));
        trades.extend(round_trip(5.0, 6.0));
        // Open entry without exit still counts toward the denominator
        trades.push(Trade::entry(None, 7.0, 1.0 / 7.0, 1.0));

        let (win_rate, num_trades) = MetricsCalculator::calculate_trade_stats(&trades);
        assert_eq!(num_trades, 4);
        assert_relative_eq!(win_rate, 50.0);
    }

    #[test]
    fn test_buy_hold_values() {
        let values = MetricsCalculator::buy_hold_values(&[50.0, 55.0, 45.0]);
        assert_eq!(values, vec![1.0, 1.1, 0.9]);
    }

    #[test]
    fn test_buy_hold_empty() {
        assert_eq!(MetricsCalculator::buy_hold_values(&[]), vec![1.0]);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-0.001), 0.0);
        assert!(round2(-0.001).is_sign_positive());
    }
}
