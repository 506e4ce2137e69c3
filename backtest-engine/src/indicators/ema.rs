/// Calculate Exponential Moving Average seeded with an SMA
///
/// The first value sits at index `period - 1` and equals the mean of the first
/// `period` prices; afterwards `ema = price * k + prev * (1 - k)` with `k = 2 / (period + 1)`.
pub fn calculate_ema(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = prices.len();
    let mut ema = vec![None; n];
    if n < period || period == 0 {
        return ema;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // Use SMA as initial seed
    let mut prev: f64 = prices[..period].iter().sum::<f64>() / period as f64;
    ema[period - 1] = Some(prev);

    for i in period..n {
        prev = prices[i] * multiplier + prev * (1.0 - multiplier);
        ema[i] = Some(prev);
    }

    ema
}

/// EMA over a series with an undefined prefix.
///
/// Seeding starts at the first defined value, so the output's first defined
/// index is `first_valid + period - 1`. A gap after the first defined value
/// ends the computation.
pub fn calculate_ema_from_first_valid(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut ema = vec![None; values.len()];

    let Some(first_valid) = values.iter().position(Option::is_some) else {
        return ema;
    };

    let dense: Vec<f64> = values[first_valid..].iter().map_while(|v| *v).collect();
    for (offset, value) in calculate_ema(&dense, period).into_iter().enumerate() {
        ema[first_valid + offset] = value;
    }

    ema
}
