use crate::model::PriceSeries;

/// Ordinary least-squares trend of close against the zero-based day index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    pub slope: f64,
    pub intercept: f64,
    /// Close estimated one index past the last observation.
    pub predicted_next: f64,
    /// Set when the time index has zero variance (a single observation) and
    /// the last close is carried forward.
    pub degenerate: bool,
}

/// Fit `close = slope * t + intercept` over every observation and evaluate it at `t = n`.
pub fn linear_trend(series: &PriceSeries) -> Forecast {
    let closes = series.closes();
    let n = closes.len() as f64;

    let t_mean = (n - 1.0) / 2.0;
    let y_mean = closes.iter().sum::<f64>() / n;

    let (sxy, sxx) = closes
        .iter()
        .enumerate()
        .fold((0.0_f64, 0.0_f64), |(sxy, sxx), (t, &y)| {
            let dt = t as f64 - t_mean;
            (sxy + dt * (y - y_mean), sxx + dt * dt)
        });

    if sxx == 0.0 {
        let last = series.last().close;
        return Forecast {
            slope: 0.0,
            intercept: last,
            predicted_next: last,
            degenerate: true,
        };
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * t_mean;

    Forecast {
        slope,
        intercept,
        predicted_next: slope * n + intercept,
        degenerate: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PricePoint;
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
    fn perfect_line_is_recovered_exactly() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + 2.0 * i as f64).collect();
        let forecast = linear_trend(&series_from_closes(&closes));
        assert_eq!(forecast.slope, 2.0);
        assert_eq!(forecast.intercept, 100.0);
        assert_eq!(forecast.predicted_next, 140.0);
        assert!(!forecast.degenerate);
    }

    #[test]
    fn rising_sixty_day_series_predicts_next_step() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let forecast = linear_trend(&series_from_closes(&closes));
        assert_eq!(forecast.predicted_next, 160.0);
    }

    #[test]
    fn single_observation_carries_last_close() {
        let forecast = linear_trend(&series_from_closes(&[50.0]));
        assert!(forecast.degenerate);
        assert_eq!(forecast.predicted_next, 50.0);
        assert_eq!(forecast.slope, 0.0);
    }

    #[test]
    fn two_points_extrapolate_the_segment() {
        let forecast = linear_trend(&series_from_closes(&[10.0, 12.0]));
        assert!((forecast.predicted_next - 14.0).abs() < 1e-9);
    }

    #[test]
    fn flat_series_predicts_same_price() {
        let forecast = linear_trend(&series_from_closes(&[42.0; 30]));
        assert!((forecast.slope).abs() < 1e-12);
        assert!((forecast.predicted_next - 42.0).abs() < 1e-9);
    }

    #[test]
    fn regression_is_on_time_index_not_price() {
        // A falling series must forecast below its last close.
        let closes: Vec<f64> = (0..10).map(|i| 200.0 - 3.0 * i as f64).collect();
        let forecast = linear_trend(&series_from_closes(&closes));
        assert!((forecast.predicted_next - 170.0).abs() < 1e-9);
    }

    #[test]
    fn forecast_is_bit_for_bit_deterministic() {
        let closes = [101.3, 99.7, 104.2, 103.9, 108.15, 107.0, 110.42];
        let a = linear_trend(&series_from_closes(&closes));
        let b = linear_trend(&series_from_closes(&closes));
        assert_eq!(a.predicted_next.to_bits(), b.predicted_next.to_bits());
        assert_eq!(a.slope.to_bits(), b.slope.to_bits());
    }
}
