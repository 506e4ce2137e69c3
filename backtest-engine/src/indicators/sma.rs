/// Calculate Simple Moving Average
///
/// # Arguments
/// * `prices` - Slice of prices
/// * `period` - SMA period
///
/// # Returns
/// Vector of Option<f64>, None for indices before `period - 1`
pub fn calculate_sma(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = prices.len();
    let mut sma = vec![None; n];

    if n < period || period == 0 {
        return sma;
    }

    // Sum each window independently
    for i in (period - 1)..n {
        let window = &prices[i + 1 - period..=i];
        sma[i] = Some(window.iter().sum::<f64>() / period as f64);
    }

    sma
}
