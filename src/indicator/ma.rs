use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;

/// Simple Moving Average.
#[derive(Debug, Clone, Copy)]
pub struct Sma {
    window: usize,
}

impl Sma {
    pub fn new(window: usize) -> Result<Self, Report<IndicatorError>> {
        if window == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "window must be > 0".into(),
            });
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Indicator for Sma {
    fn name(&self) -> String {
        format!("sma_{}", self.window)
    }

    fn required_points(&self) -> usize {
        self.window
    }

    fn calculate_closes(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let mut values = vec![None; closes.len()];
        for (i, w) in closes.windows(self.window).enumerate() {
            values[i + self.window - 1] = Some(w.iter().sum::<f64>() / self.window as f64);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PricePoint, PriceSeries};
    use chrono::NaiveDate;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint::new(start + chrono::Duration::days(i as i64), c))
            .collect();
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn sma_window_zero_invalid() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_undefined_when_series_shorter_than_window() {
        let sma = Sma::new(5).unwrap();
        let values = sma.calculate(&series_from_closes(&[1.0; 4]));
        assert_eq!(values.len(), 4);
        assert!(values.iter().all(Option::is_none));
        assert_eq!(sma.latest(&series_from_closes(&[1.0; 4])), None);
    }

    #[test]
    fn sma_leading_slots_undefined() {
        let sma = Sma::new(3).unwrap();
        let values = sma.calculate(&series_from_closes(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(values[0], None);
        assert_eq!(values[1], None);
        // (1+2+3)/3 = 2.0, (2+3+4)/3 = 3.0
        assert!((values[2].unwrap() - 2.0).abs() < 1e-9);
        assert!((values[3].unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn sma_flat_prices() {
        let sma = Sma::new(3).unwrap();
        let values = sma.calculate(&series_from_closes(&[10.0; 5]));
        for v in values.iter().flatten() {
            assert!((v - 10.0).abs() < 1e-9);
        }
        assert_eq!(values.iter().flatten().count(), 3);
    }

    #[test]
    fn sma_latest_is_mean_of_trailing_window() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);
        let sma10 = Sma::new(10).unwrap().latest(&series).unwrap();
        assert_eq!(sma10, 154.5);
        let sma50 = Sma::new(50).unwrap().latest(&series).unwrap();
        assert_eq!(sma50, 134.5);
    }

    #[test]
    fn sma_window_equal_to_length_defines_only_last_slot() {
        let sma = Sma::new(3).unwrap();
        let values = sma.calculate(&series_from_closes(&[2.0, 4.0, 6.0]));
        assert_eq!(values, vec![None, None, Some(4.0)]);
    }

    #[test]
    fn sma_name_includes_window() {
        assert_eq!(Sma::new(10).unwrap().name(), "sma_10");
    }
}
