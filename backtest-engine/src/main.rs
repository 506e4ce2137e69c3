use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use backtest_engine::{
    load_file, optimize, BacktestEngine, BacktestResult, MarketDataSource, OptimizationGoal,
    ParameterGrid, PerformanceMetrics, PriceSeries, StrategyParameters, StrategyType, SweepReport,
    SyntheticDataSource,
};

#[derive(Parser, Debug)]
#[command(name = "backtest-engine")]
#[command(version = "0.1.0")]
#[command(about = "Rule-based strategy backtester for daily price series", long_about = None)]
struct Args {
    /// Data file path (CSV/JSON). If not provided, uses synthetic data.
    #[arg(short = 'f', long)]
    data_file: Option<PathBuf>,

    /// Number of trading days of synthetic data
    #[arg(short, long, default_value = "1260")]
    days: usize,

    /// Initial price for synthetic data
    #[arg(long, default_value = "100.0")]
    initial_price: f64,

    /// Seed for synthetic data
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Ticker label (defaults to the data file name, or SYNTH)
    #[arg(short, long)]
    ticker: Option<String>,

    /// Strategy parameters as a JSON file
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Strategy family (ma_crossover, rsi_oversold, bollinger_bounce, macd_crossover)
    #[arg(short, long)]
    strategy: Option<StrategyType>,

    #[arg(long)]
    ma_fast: Option<usize>,

    #[arg(long)]
    ma_slow: Option<usize>,

    #[arg(long)]
    rsi_period: Option<usize>,

    #[arg(long)]
    rsi_oversold: Option<f64>,

    #[arg(long)]
    rsi_overbought: Option<f64>,

    #[arg(long)]
    bb_period: Option<usize>,

    #[arg(long)]
    bb_std: Option<f64>,

    #[arg(long)]
    macd_fast: Option<usize>,

    #[arg(long)]
    macd_slow: Option<usize>,

    #[arg(long)]
    macd_signal: Option<usize>,

    /// Stop loss percentage (5 = 5%)
    #[arg(long)]
    stop_loss: Option<f64>,

    /// Take profit percentage (10 = 10%)
    #[arg(long)]
    take_profit: Option<f64>,

    #[arg(long)]
    max_hold_days: Option<usize>,

    /// Cash units committed per entry (starting equity is 1.0), capped at available cash
    #[arg(long)]
    position_size: Option<f64>,

    /// Sweep a parameter grid and rank by goal (sharpe, return, drawdown)
    #[arg(long)]
    optimize: Option<OptimizationGoal>,

    /// Output format (json, text)
    #[arg(short, long, default_value = "json")]
    output: String,

    /// Pretty print JSON output
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn strategy_parameters(&self) -> Result<StrategyParameters> {
        let mut params = match &self.params {
            Some(path) => StrategyParameters::from_json_file(path)
                .with_context(|| format!("failed to read parameters from {:?}", path))?,
            None => StrategyParameters::default(),
        };

        if let Some(strategy) = &self.strategy {
            params.strategy_type = strategy.clone();
        }

        let periods = [
            ("ma_fast", self.ma_fast),
            ("ma_slow", self.ma_slow),
            ("rsi_period", self.rsi_period),
            ("bb_period", self.bb_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("max_hold_days", self.max_hold_days),
        ];
        for (name, value) in periods {
            if let Some(value) = value {
                params.set_value(name, value as f64)?;
            }
        }

        let levels = [
            ("rsi_oversold", self.rsi_oversold),
            ("rsi_overbought", self.rsi_overbought),
            ("bb_std", self.bb_std),
            ("stop_loss_pct", self.stop_loss),
            ("take_profit_pct", self.take_profit),
            ("position_size", self.position_size),
        ];
        for (name, value) in levels {
            if let Some(value) = value {
                params.set_value(name, value)?;
            }
        }

        params.validate()?;
        Ok(params)
    }

    fn price_series(&self) -> Result<PriceSeries> {
        let mut series = if let Some(path) = &self.data_file {
            info!(path = ?path, "loading price data");
            load_file(path).with_context(|| format!("failed to load {:?}", path))?
        } else {
            info!(
                days = self.days,
                initial_price = self.initial_price,
                seed = self.seed,
                "generating synthetic price data"
            );
            let source = SyntheticDataSource {
                days: self.days,
                initial_price: self.initial_price,
                seed: self.seed,
            };
            source.fetch(self.ticker.as_deref().unwrap_or("SYNTH"))?
        };

        if let Some(ticker) = &self.ticker {
            series.ticker = ticker.clone();
        }
        Ok(series)
    }

    fn print_json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{}", json);
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let params = args.strategy_parameters()?;
    let series = args.price_series()?;

    info!(
        ticker = %series.ticker,
        bars = series.len(),
        strategy = %params.strategy_type,
        "running backtest"
    );

    let text = match args.output.as_str() {
        "json" => false,
        "text" => true,
        other => {
            warn!(format = other, "unknown output format, using text");
            true
        }
    };

    if let Some(goal) = args.optimize {
        let grid = ParameterGrid::default_for(params);
        let report = optimize(&series, &grid, goal)?;
        if text {
            print_sweep_report(&report);
        } else {
            args.print_json(&report)?;
        }
        return Ok(());
    }

    let engine = BacktestEngine::new(params);
    let result = engine.run(&series)?;

    if text {
        print_text_report(&result, engine.params());
    } else {
        args.print_json(&result)?;
    }

    Ok(())
}

fn metrics_row(label: &str, strategy: f64, buy_hold: f64, suffix: &str) {
    println!(
        "  {:<16} {:>12.2}{:<1} {:>12.2}{:<1}",
        label, strategy, suffix, buy_hold, suffix
    );
}

fn print_text_report(result: &BacktestResult, params: &StrategyParameters) {
    let strategy: &PerformanceMetrics = &result.metrics;
    let buy_hold: &PerformanceMetrics = &result.buy_hold_metrics;

    println!();
    println!("================================================================");
    println!(
        "  BACKTEST REPORT - {} ({})",
        result.ticker, params.strategy_type
    );
    println!("================================================================");
    println!();
    println!(
        "  Period: {} to {}",
        result.start_date.as_deref().unwrap_or("n/a"),
        result.end_date.as_deref().unwrap_or("n/a")
    );
    println!("  Duration: {} trading days", result.portfolio_values.len());
    println!();
    println!("----------------------------------------------------------------");
    println!("  {:<16} {:>13} {:>13}", "", "STRATEGY", "BUY & HOLD");
    println!("----------------------------------------------------------------");
    metrics_row(
        "Final Value",
        result.final_value(),
        result.buy_hold_final_value(),
        "x",
    );
    metrics_row(
        "Total Return",
        strategy.total_return,
        buy_hold.total_return,
        "%",
    );
    metrics_row("CAGR", strategy.cagr, buy_hold.cagr, "%");
    metrics_row(
        "Sharpe Ratio",
        strategy.sharpe_ratio,
        buy_hold.sharpe_ratio,
        " ",
    );
    metrics_row(
        "Max Drawdown",
        strategy.max_drawdown,
        buy_hold.max_drawdown,
        "%",
    );
    println!();
    println!("  Trades:           {:>12}", strategy.num_trades);
    println!("  Win Rate:         {:>12.2}%", strategy.win_rate);
    println!(
        "  vs Buy & Hold:    {:>+12.2}%",
        strategy.vs_buy_hold.unwrap_or_default()
    );
    println!();
    println!("================================================================");

    if !result.trades.is_empty() {
        println!();
        println!("  RECENT TRADES (last 10)");
        println!("----------------------------------------------------------------");
        let skip = result.trades.len().saturating_sub(10);
        for trade in result.trades.iter().skip(skip) {
            println!(
                "  {:<5} {:<12} @ {:>10.2} | shares {:>10.4} | value {:>8.4}",
                if trade.is_entry() { "BUY" } else { "SELL" },
                trade.date.as_deref().unwrap_or("-"),
                trade.price,
                trade.shares,
                trade.value
            );
        }
        println!();
    }
}

fn print_sweep_report(report: &SweepReport) {
    println!();
    println!("================================================================");
    println!(
        "  PARAMETER SWEEP - {} (goal: {}, {} candidates)",
        report.ticker, report.goal, report.evaluated
    );
    println!("================================================================");
    println!(
        "  {:>4} {:>10} {:>10} {:>8} {:>8} {:>7}",
        "rank", "score", "return%", "sharpe", "maxdd%", "trades"
    );
    for (rank, entry) in report.leaderboard.iter().take(10).enumerate() {
        println!(
            "  {:>4} {:>10.2} {:>10.2} {:>8.2} {:>8.2} {:>7}",
            rank + 1,
            entry.score,
            entry.metrics.total_return,
            entry.metrics.sharpe_ratio,
            entry.metrics.max_drawdown,
            entry.metrics.num_trades
        );
    }
    println!();
    println!("  Best parameters:");
    match serde_json::to_string_pretty(&report.best.params) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!(error = %e, "failed to render best parameters"),
    }
    println!();
}
