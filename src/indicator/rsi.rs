use error_stack::{Report, bail};
use serde::Serialize;

use crate::error::IndicatorError;
use crate::indicator::Indicator;
use crate::model::PriceSeries;

/// Neutral RSI used when the trailing window shows no price movement at all.
pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI (Relative Strength Index) over simple rolling means of gains and losses.
///
/// Unlike Wilder's exponential smoothing, each point only depends on the
/// trailing `period` deltas.
#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    period: usize,
}

/// Latest RSI as consumed by the recommendation policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RsiReading {
    Value(f64),
    /// Average gain and average loss are both zero.
    NoMovement,
    /// Fewer than `period + 1` observations.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiStatus {
    Ready,
    NoMovement,
    InsufficientHistory,
}

impl RsiReading {
    /// RSI value with no-movement mapped to neutral.
    pub fn effective(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::NoMovement => Some(NEUTRAL_RSI),
            Self::Unavailable => None,
        }
    }

    pub fn status(self) -> RsiStatus {
        match self {
            Self::Value(_) => RsiStatus::Ready,
            Self::NoMovement => RsiStatus::NoMovement,
            Self::Unavailable => RsiStatus::InsufficientHistory,
        }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        if period == 0 {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        }
        Ok(Self { period })
    }

    /// Rolling average gain and loss per observation, `None` until `period`
    /// deltas exist.
    fn averages(&self, closes: &[f64]) -> Vec<Option<(f64, f64)>> {
        let mut out = vec![None; closes.len()];
        if closes.len() < self.required_points() {
            return out;
        }

        let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let period = self.period as f64;

        // deltas[j] is the move into closes[j + 1]
        for (j, window) in deltas.windows(self.period).enumerate() {
            let avg_gain = window.iter().map(|&d| d.max(0.0)).sum::<f64>() / period;
            let avg_loss = window.iter().map(|&d| (-d).max(0.0)).sum::<f64>() / period;
            out[j + self.period] = Some((avg_gain, avg_loss));
        }
        out
    }

    /// Classify the most recent RSI point.
    pub fn reading(&self, series: &PriceSeries) -> RsiReading {
        match self.averages(&series.closes()).last().copied().flatten() {
            None => RsiReading::Unavailable,
            Some((gain, loss)) => match rsi_value(gain, loss) {
                Some(v) => RsiReading::Value(v),
                None => RsiReading::NoMovement,
            },
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> String {
        format!("rsi_{}", self.period)
    }

    fn required_points(&self) -> usize {
        self.period + 1
    }

    fn calculate_closes(&self, closes: &[f64]) -> Vec<Option<f64>> {
        self.averages(closes)
            .into_iter()
            .map(|avg| avg.and_then(|(gain, loss)| rsi_value(gain, loss)))
            .collect()
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return None;
        }
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
}
