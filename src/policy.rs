use crate::indicator::rsi::RsiReading;
use crate::model::{Action, Reason, Signal};

/// Maps current price, predicted price and RSI to a trade signal.
///
/// A run uses exactly one variant; the two are never blended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Policy {
    /// BUY above `current * (1 + band)`, SELL below `current * (1 - band)`,
    /// otherwise HOLD. RSI is not consulted.
    Threshold { band: f64 },
    /// RSI extremes decide first, then a strict price comparison. Never HOLD.
    RsiPriority { oversold: f64, overbought: f64 },
}

impl Policy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Threshold { .. } => "threshold",
            Self::RsiPriority { .. } => "rsi_priority",
        }
    }

    pub fn recommend(&self, current: f64, predicted: f64, rsi: RsiReading) -> Signal {
        match *self {
            Self::Threshold { band } => threshold(current, predicted, band),
            Self::RsiPriority {
                oversold,
                overbought,
            } => rsi_priority(current, predicted, rsi.effective(), oversold, overbought),
        }
    }
}

fn threshold(current: f64, predicted: f64, band: f64) -> Signal {
    if predicted >= current * (1.0 + band) && predicted != current {
        Signal {
            action: Action::Buy,
            reason: Reason::PredictedHigher,
        }
    } else if predicted <= current * (1.0 - band) && predicted != current {
        Signal {
            action: Action::Sell,
            reason: Reason::PredictedLower,
        }
    } else {
        Signal {
            action: Action::Hold,
            reason: Reason::WithinBand,
        }
    }
}

fn rsi_priority(
    current: f64,
    predicted: f64,
    rsi: Option<f64>,
    oversold: f64,
    overbought: f64,
) -> Signal {
    match rsi {
        Some(v) if v < oversold => Signal {
            action: Action::Buy,
            reason: Reason::Oversold,
        },
        Some(v) if v > overbought => Signal {
            action: Action::Sell,
            reason: Reason::Overbought,
        },
        _ if predicted > current => Signal {
            action: Action::Buy,
            reason: Reason::PredictedHigher,
        },
        _ => Signal {
            action: Action::Sell,
            reason: Reason::PredictedLower,
        },
    }
}
