/// Bollinger Bands result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Calculate Bollinger Bands
///
/// Bands at index `i` are built from the `period` closes preceding `i`, so the
/// first defined index is `period`. The half-width uses the population
/// standard deviation (divide by `period`).
///
/// # Arguments
/// * `prices` - Slice of closing prices
/// * `period` - Period for moving average (typically 20)
/// * `std_dev` - Number of standard deviations (typically 2.0)
pub fn calculate_bollinger_bands(prices: &[f64], period: usize, std_dev: f64) -> BollingerBands {
    let n = prices.len();
    let mut bb = BollingerBands {
        upper: vec![None; n],
        middle: vec![None; n],
        lower: vec![None; n],
    };

    if n <= period || period == 0 {
        return bb;
    }

    for i in period..n {
        let window = &prices[i - period..i];

        let mean: f64 = window.iter().sum::<f64>() / period as f64;
        let variance: f64 = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let half_width = std_dev * variance.sqrt();

        bb.middle[i] = Some(mean);
        bb.upper[i] = Some(mean + half_width);
        bb.lower[i] = Some(mean - half_width);
    }

    bb
}
