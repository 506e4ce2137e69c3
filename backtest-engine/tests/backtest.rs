use approx::assert_relative_eq;
use backtest_engine::{
    generate_pattern_series, run_backtest, BacktestEngine, BacktestError, PriceSeries,
    StrategyParameters, StrategyType, TradeType,
};

fn daily_series(prices: &[f64]) -> PriceSeries {
    let dates = (0..prices.len())
        .map(|i| format!("2023-03-{:02}", i + 1))
        .collect();
    PriceSeries::from_closes("TEST", dates, prices.to_vec())
}

#[test]
fn constant_prices_never_trade() {
    let series = daily_series(&[64.0; 100]);

    for strategy in StrategyType::ALL {
        let params = StrategyParameters::default()
            .with_strategy(strategy.clone())
            .with_ma_periods(5, 20);
        let result = run_backtest(&series, &params).unwrap();

        assert!(result.trades.is_empty(), "{} traded", strategy);
        assert_eq!(result.metrics.total_return, 0.0);
        assert_eq!(result.metrics.max_drawdown, 0.0);
        assert_eq!(result.metrics.num_trades, 0);
        assert!(result.portfolio_values.iter().all(|v| *v == 1.0));
    }
}

#[test]
fn fast_average_leading_from_start_never_enters() {
    // The fast average already leads at the first comparable bar
    let prices: Vec<f64> = (10..=20).map(f64::from).collect();
    let params = StrategyParameters::default().with_ma_periods(2, 3);
    let result = run_backtest(&daily_series(&prices), &params).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.metrics.total_return, 0.0);
    assert_eq!(result.buy_hold_metrics.total_return, 100.0);
    assert_eq!(result.metrics.vs_buy_hold, Some(-100.0));
}

#[test]
fn flat_then_rising_enters_once() {
    let prices = [10.0, 10.0, 10.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0];
    let params = StrategyParameters::default()
        .with_ma_periods(2, 3)
        .with_take_profit(1000.0);
    let result = run_backtest(&daily_series(&prices), &params).unwrap();

    assert_eq!(result.trades.len(), 1);
    let entry = &result.trades[0];
    assert_eq!(entry.trade_type, TradeType::Entry);
    assert_eq!(entry.date.as_deref(), Some("2023-03-05"));
    assert_eq!(entry.price, 11.0);
    assert_relative_eq!(entry.shares, 1.0 / 11.0);

    assert_eq!(result.portfolio_values.len(), prices.len());
    assert_relative_eq!(result.final_value(), 16.0 / 11.0, epsilon = 1e-12);
    assert_eq!(result.metrics.num_trades, 1);
}

#[test]
fn stop_loss_exits_on_first_breach() {
    let prices = [10.0, 10.0, 10.0, 10.0, 11.0, 11.2, 10.4, 10.4];
    let params = StrategyParameters::default()
        .with_ma_periods(2, 3)
        .with_stop_loss(5.0);
    let result = run_backtest(&daily_series(&prices), &params).unwrap();

    assert_eq!(result.trades.len(), 2);
    let exit = &result.trades[1];
    assert_eq!(exit.trade_type, TradeType::Exit);
    assert_eq!(exit.date.as_deref(), Some("2023-03-07"));
    assert_eq!(exit.price, 10.4);
    assert_relative_eq!(result.final_value(), 10.4 / 11.0, epsilon = 1e-12);
    assert_eq!(result.metrics.win_rate, 0.0);
}

#[test]
fn reentry_after_gap_down_stays_solvent() {
    // Gap-down stop at index 5, re-entry at index 8, second stop at index 9
    let prices = [10.0, 10.0, 10.0, 10.0, 11.0, 5.0, 5.0, 5.0, 6.0, 1.0, 1.0];
    let params = StrategyParameters::default().with_ma_periods(2, 3);
    let result = run_backtest(&daily_series(&prices), &params).unwrap();

    let kinds: Vec<TradeType> = result.trades.iter().map(|t| t.trade_type).collect();
    assert_eq!(
        kinds,
        vec![TradeType::Entry, TradeType::Exit, TradeType::Entry, TradeType::Exit]
    );
    assert_eq!(result.trades[1].date.as_deref(), Some("2023-03-06"));
    assert_eq!(result.trades[2].date.as_deref(), Some("2023-03-09"));

    // Second entry only spends the cash left after the first loss
    assert_relative_eq!(result.trades[2].value, 5.0 / 11.0, epsilon = 1e-12);
    assert_relative_eq!(result.final_value(), 5.0 / 66.0, epsilon = 1e-12);

    assert!(result.portfolio_values.iter().all(|v| *v > 0.0));
    assert!((0.0..=100.0).contains(&result.metrics.max_drawdown));
    assert_eq!(result.metrics.max_drawdown, 92.42);
}

#[test]
fn max_hold_closes_stale_position() {
    let prices = [10.0, 10.0, 10.0, 10.0, 11.0, 11.1, 11.2, 11.3, 11.4, 11.5, 11.6];
    let params = StrategyParameters::default()
        .with_ma_periods(2, 3)
        .with_max_hold_days(3);
    let result = run_backtest(&daily_series(&prices), &params).unwrap();

    assert_eq!(result.trades.len(), 2);
    // Entered at index 4, held more than 3 bars at index 8
    assert_eq!(result.trades[1].date.as_deref(), Some("2023-03-09"));
    assert_eq!(result.metrics.win_rate, 100.0);
}

#[test]
fn rsi_oversold_buys_the_rebound() {
    let selloff: Vec<usize> = (60..70).collect();
    let rally: Vec<usize> = (70..76).collect();
    let series = generate_pattern_series("PATTERN", 160, 100.0, &selloff, &rally);
    let params = StrategyParameters::default().with_strategy(StrategyType::RsiOversold);

    let result = BacktestEngine::new(params).run(&series).unwrap();

    let entry = result
        .trades
        .iter()
        .find(|t| t.is_entry())
        .expect("rsi strategy should enter after the sell-off");
    let entry_idx = series
        .dates
        .iter()
        .position(|d| Some(d.as_str()) == entry.date.as_deref())
        .unwrap();
    assert!((70..=76).contains(&entry_idx), "entered at {}", entry_idx);
}

#[test]
fn result_serializes_with_wire_names() {
    let prices = [10.0, 10.0, 10.0, 10.0, 11.0, 12.0];
    let params = StrategyParameters::default().with_ma_periods(2, 3);
    let result = run_backtest(&daily_series(&prices), &params).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    for key in [
        "ticker",
        "start_date",
        "end_date",
        "trades",
        "portfolio_values",
        "metrics",
        "buy_hold_values",
        "buy_hold_metrics",
    ] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    for key in [
        "total_return",
        "cagr",
        "sharpe_ratio",
        "max_drawdown",
        "win_rate",
        "num_trades",
        "vs_buy_hold",
    ] {
        assert!(json["metrics"].get(key).is_some(), "missing metrics.{}", key);
    }
    assert!(json["buy_hold_metrics"].get("vs_buy_hold").is_none());

    let trade = &json["trades"][0];
    assert_eq!(trade["type"], "entry");
    assert_eq!(trade["date"], "2023-03-05");
    assert_eq!(json["start_date"], "2023-03-01");
    assert_eq!(json["end_date"], "2023-03-06");
}

#[test]
fn params_from_json_drive_the_run() {
    let params = StrategyParameters::from_json_str(
        r#"{"strategy_type": "ma_crossover", "ma_fast": 2, "ma_slow": 3, "take_profit_pct": 500}"#,
    )
    .unwrap();
    let prices = [10.0, 10.0, 10.0, 10.0, 11.0, 12.0];
    let result = run_backtest(&daily_series(&prices), &params).unwrap();

    assert_eq!(result.trades.len(), 1);
    assert_eq!(params.rsi_period, 14);
}

#[test]
fn unknown_strategy_holds_cash() {
    let params = StrategyParameters::from_json_str(r#"{"strategy_type": "lunar_cycle"}"#).unwrap();
    let series = generate_pattern_series("PATTERN", 120, 100.0, &[60, 61, 62], &[63, 64]);
    let result = run_backtest(&series, &params).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.metrics.total_return, 0.0);
    assert!(result.buy_hold_metrics.total_return > 0.0);
}

#[test]
fn empty_series_is_rejected() {
    let result = run_backtest(&PriceSeries::default(), &StrategyParameters::default());
    assert!(matches!(result, Err(BacktestError::EmptyPriceSeries)));
}

#[test]
fn bad_price_is_rejected() {
    let result = run_backtest(
        &daily_series(&[10.0, f64::NAN, 11.0]),
        &StrategyParameters::default(),
    );
    assert!(matches!(
        result,
        Err(BacktestError::InvalidPrice { index: 1, .. })
    ));
}

#[test]
fn reruns_are_identical() {
    let series = generate_pattern_series("PATTERN", 200, 100.0, &[80, 81, 82, 83], &[84, 85]);
    for strategy in StrategyType::ALL {
        let params = StrategyParameters::default().with_strategy(strategy);
        let a = run_backtest(&series, &params).unwrap();
        let b = run_backtest(&series, &params).unwrap();
        assert_eq!(a, b);
    }
}
