/// Calculate RSI using Wilder's Smoothing
///
/// Average gain/loss are seeded with the simple mean of the first `period`
/// price changes, then smoothed as `avg = (avg * (period - 1) + new) / period`.
/// RSI is 100 whenever the average loss is exactly zero.
///
/// # Returns
/// Vector of RSI values, `None` for the first `period` indices
pub fn calculate_rsi(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = prices.len();
    let mut rsi = vec![None; n];
    if period == 0 || n < period + 1 {
        return rsi;
    }

    let p = period as f64;

    // Calculate initial averages
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let (gain, loss) = split_change(prices[i] - prices[i - 1]);
        avg_gain += gain;
        avg_loss += loss;
    }
    avg_gain /= p;
    avg_loss /= p;

    rsi[period] = Some(rsi_value(avg_gain, avg_loss));

    // Wilder's Smoothing for subsequent values
    for i in (period + 1)..n {
        let (gain, loss) = split_change(prices[i] - prices[i - 1]);
        avg_gain = (avg_gain * (p - 1.0) + gain) / p;
        avg_loss = (avg_loss * (p - 1.0) + loss) / p;
        rsi[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    rsi
}

fn split_change(delta: f64) -> (f64, f64) {
    if delta > 0.0 {
        (delta, 0.0)
    } else {
        (0.0, -delta)
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}
