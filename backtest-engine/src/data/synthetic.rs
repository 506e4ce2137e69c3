use chrono::{Datelike, Duration, NaiveDate, Weekday};
use common::{Bar, PriceSeries};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// First trading day of every generated series
fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 2).unwrap_or_default()
}

/// Weekday dates starting at `start_date`
fn trading_days(days: usize) -> Vec<String> {
    let mut dates = Vec::with_capacity(days);
    let mut date = start_date();
    while dates.len() < days {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(date.format("%Y-%m-%d").to_string());
        }
        date += Duration::days(1);
    }
    dates
}

/// Generate a reproducible random-walk price series
pub fn generate_synthetic_series(
    ticker: &str,
    days: usize,
    initial_price: f64,
    seed: u64,
) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(days);

    let mut price = initial_price;
    let daily_volatility = 0.015;
    let drift = 0.0003;

    for date in trading_days(days) {
        let random_return: f64 = rng.gen_range(-1.0..1.0);
        let daily_return = drift + daily_volatility * random_return;
        let new_price = price * (1.0 + daily_return);

        // Generate OHLC
        let intraday_range = price * rng.gen_range(0.005..0.02);
        let open = price + rng.gen_range(-intraday_range / 2.0..intraday_range / 2.0);
        let close = new_price;
        let high = open.max(close) + rng.gen_range(0.0..intraday_range / 2.0);
        let low = open.min(close) - rng.gen_range(0.0..intraday_range / 2.0);

        // Generate volume (higher on volatile days)
        let base_volume = 5_000_000.0;
        let volume_multiplier = 1.0 + daily_return.abs() * 10.0;
        let volume = (base_volume * volume_multiplier * rng.gen_range(0.8..1.2)).round();

        bars.push(Bar::new(date, open, high, low, close, volume));
        price = new_price;
    }

    PriceSeries::from_bars(ticker, &bars)
}

/// Generate a series with scripted sell-offs and rallies, drifting slightly upward otherwise
pub fn generate_pattern_series(
    ticker: &str,
    days: usize,
    initial_price: f64,
    selloff_days: &[usize],
    rally_days: &[usize],
) -> PriceSeries {
    let mut bars = Vec::with_capacity(days);
    let mut price = initial_price;

    for (i, date) in trading_days(days).into_iter().enumerate() {
        let daily_return = if selloff_days.contains(&i) {
            -0.03
        } else if rally_days.contains(&i) {
            0.03
        } else {
            0.001
        };

        let new_price = price * (1.0 + daily_return);
        let range = price * 0.01;

        bars.push(Bar::new(
            date,
            price,
            price.max(new_price) + range,
            price.min(new_price) - range,
            new_price,
            5_000_000.0,
        ));

        price = new_price;
    }

    PriceSeries::from_bars(ticker, &bars)
}
