pub mod ma;
pub mod rsi;

use crate::model::PriceSeries;

/// A technical analysis indicator computed over a daily close series.
///
/// Output is aligned with the input: one slot per observation, `None` while
/// the indicator's lookback is not yet satisfied.
pub trait Indicator: Send + Sync {
    /// Short label used in reports (e.g. "sma_10", "rsi_14").
    fn name(&self) -> String;

    /// Minimum number of observations needed for the first defined value.
    fn required_points(&self) -> usize;

    fn calculate_closes(&self, closes: &[f64]) -> Vec<Option<f64>>;

    fn calculate(&self, series: &PriceSeries) -> Vec<Option<f64>> {
        self.calculate_closes(&series.closes())
    }

    /// Value at the most recent observation, if defined.
    fn latest(&self, series: &PriceSeries) -> Option<f64> {
        self.calculate(series).last().copied().flatten()
    }
}
