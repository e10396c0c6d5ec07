pub mod chart_api;
pub mod file;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::ProviderError;
use crate::model::{PriceHistory, PricePoint};

/// Source of daily close history for a ticker.
///
/// Uses `BoxFuture` instead of `async fn` in trait to keep the trait
/// object-safe (`dyn PriceHistoryProvider`).
pub trait PriceHistoryProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch daily closes covering the last `lookback_days` calendar days.
    ///
    /// An unknown symbol or an empty range must be reported as
    /// [`ProviderError::NoData`], never as a transport failure.
    fn fetch_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> BoxFuture<'_, Result<PriceHistory, Report<ProviderError>>>;
}

/// Sort by date and keep the last row of any repeated date.
pub fn normalize_points(mut points: Vec<PricePoint>) -> Vec<PricePoint> {
    // Stable sort keeps provider order among equal dates.
    points.sort_by_key(|p| p.date);
    let mut out: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
        match out.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => out.push(point),
        }
    }
    out
}
