use std::fmt;

use chrono::NaiveDate;
use error_stack::{Report, bail};
use serde::{Deserialize, Serialize};

use crate::error::SeriesError;

/// One daily observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Price history as delivered by a provider, before validation.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    pub points: Vec<PricePoint>,
    /// ISO 4217 code reported by the provider, if any.
    pub currency: Option<String>,
}

/// Validated daily close series.
///
/// Dates are strictly increasing and every close is finite and positive. The
/// series always holds at least one observation.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, Report<SeriesError>> {
        if points.is_empty() {
            bail!(SeriesError::Empty);
        }

        if let Some(point) = points
            .iter()
            .find(|p| !p.close.is_finite() || p.close <= 0.0)
        {
            bail!(SeriesError::InvalidClose {
                date: point.date.to_string(),
                close: point.close,
            });
        }

        if let Some(pair) = points.windows(2).find(|w| w[1].date <= w[0].date) {
            bail!(SeriesError::OutOfOrder {
                date: pair[1].date.to_string(),
                previous: pair[0].date.to_string(),
            });
        }

        Ok(Self { points })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Most recent observation.
    pub fn last(&self) -> PricePoint {
        // Non-empty by construction.
        self.points[self.points.len() - 1]
    }

    /// Contiguous suffix of at most `n` observations, oldest first.
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }
}

/// Trade signal emitted by the recommendation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Why the policy chose its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Oversold,
    Overbought,
    PredictedHigher,
    PredictedLower,
    WithinBand,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oversold => write!(f, "RSI indicates oversold"),
            Self::Overbought => write!(f, "RSI indicates overbought"),
            Self::PredictedHigher => write!(f, "predicted price is higher"),
            Self::PredictedLower => write!(f, "predicted price is lower"),
            Self::WithinBand => write!(f, "predicted move is within the hold band"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub action: Action,
    pub reason: Reason,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    fn series(closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint::new(day(i as i64), c))
            .collect();
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn empty_series_rejected() {
        let err = PriceSeries::new(Vec::new()).unwrap_err();
        assert!(matches!(err.current_context(), SeriesError::Empty));
    }

    #[test]
    fn non_positive_close_rejected() {
        let err = PriceSeries::new(vec![PricePoint::new(day(0), 0.0)]).unwrap_err();
        assert!(matches!(
            err.current_context(),
            SeriesError::InvalidClose { .. }
        ));
    }

    #[test]
    fn nan_close_rejected() {
        let err = PriceSeries::new(vec![PricePoint::new(day(0), f64::NAN)]).unwrap_err();
        assert!(matches!(
            err.current_context(),
            SeriesError::InvalidClose { .. }
        ));
    }

    #[test]
    fn duplicate_date_rejected() {
        let points = vec![PricePoint::new(day(0), 10.0), PricePoint::new(day(0), 11.0)];
        let err = PriceSeries::new(points).unwrap_err();
        assert!(matches!(
            err.current_context(),
            SeriesError::OutOfOrder { .. }
        ));
    }

    #[test]
    fn descending_dates_rejected() {
        let points = vec![PricePoint::new(day(1), 10.0), PricePoint::new(day(0), 11.0)];
        assert!(PriceSeries::new(points).is_err());
    }

    #[test]
    fn accessors_preserve_order() {
        let s = series(&[1.0, 2.0, 3.0]);
        assert_eq!(s.len(), 3);
        assert_eq!(s.closes(), vec![1.0, 2.0, 3.0]);
        assert_eq!(s.dates(), vec![day(0), day(1), day(2)]);
        assert_eq!(s.last(), PricePoint::new(day(2), 3.0));
    }

    #[test]
    fn tail_returns_suffix() {
        let s = series(&[1.0, 2.0, 3.0, 4.0]);
        let tail = s.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].close, 3.0);
        assert_eq!(tail[1].close, 4.0);
    }

    #[test]
    fn tail_longer_than_series_returns_everything() {
        let s = series(&[1.0, 2.0]);
        assert_eq!(s.tail(100).len(), 2);
        assert!(s.tail(0).is_empty());
    }

    #[test]
    fn action_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Action::Buy).unwrap(), "\"BUY\"");
        assert_eq!(Action::Hold.to_string(), "HOLD");
    }

    #[test]
    fn reason_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Reason::PredictedHigher).unwrap(),
            "\"predicted_higher\""
        );
    }
}
