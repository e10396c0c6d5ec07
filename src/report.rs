use chrono::NaiveDate;
use serde::Serialize;

use crate::forecast::Forecast;
use crate::indicator::rsi::{RsiReading, RsiStatus};
use crate::model::{Action, PriceSeries, Reason};
use crate::policy::Policy;

/// Latest value of one moving average; `value` is `None` while the window is not full.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverage {
    pub window: usize,
    pub value: Option<f64>,
}

/// Recent closes for charting, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartWindow {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Analysis summary for a single ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub currency: &'static str,
    pub as_of: NaiveDate,
    pub observations: usize,
    pub current_price: f64,
    pub predicted_price: f64,
    pub sma: Vec<MovingAverage>,
    pub rsi: Option<f64>,
    pub rsi_status: RsiStatus,
    pub recommendation: Action,
    pub reason: Reason,
    pub policy: &'static str,
    pub chart: ChartWindow,
}

impl AnalysisReport {
    /// Latest SMA for `window`, if that window was requested and is defined.
    pub fn sma(&self, window: usize) -> Option<f64> {
        self.sma
            .iter()
            .find(|m| m.window == window)
            .and_then(|m| m.value)
    }
}

/// Assembles an [`AnalysisReport`] from the computed pieces of one analysis run.
pub struct ReportBuilder<'a> {
    ticker: String,
    series: &'a PriceSeries,
    currency_code: Option<String>,
    chart_window: usize,
    sma: Vec<MovingAverage>,
    rsi: RsiReading,
    predicted: f64,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(ticker: &str, series: &'a PriceSeries) -> Self {
        let last = series.last().close;
        Self {
            ticker: normalize_ticker(ticker),
            series,
            currency_code: None,
            chart_window: 100,
            sma: Vec::new(),
            rsi: RsiReading::Unavailable,
            predicted: last,
        }
    }

    pub fn currency_code(mut self, code: Option<String>) -> Self {
        self.currency_code = code;
        self
    }

    pub fn chart_window(mut self, points: usize) -> Self {
        self.chart_window = points;
        self
    }

    pub fn sma(mut self, window: usize, value: Option<f64>) -> Self {
        self.sma.push(MovingAverage { window, value });
        self
    }

    pub fn rsi(mut self, reading: RsiReading) -> Self {
        self.rsi = reading;
        self
    }

    pub fn forecast(mut self, forecast: &Forecast) -> Self {
        self.predicted = forecast.predicted_next;
        self
    }

    /// Round every figure and derive the recommendation from the rounded prices.
    pub fn build(self, policy: &Policy) -> AnalysisReport {
        let last = self.series.last();
        let current_price = round2(last.close);
        let predicted_price = round2(self.predicted);
        let signal = policy.recommend(current_price, predicted_price, self.rsi);

        let window = self.series.tail(self.chart_window);
        let chart = ChartWindow {
            labels: window
                .iter()
                .map(|p| p.date.format("%Y-%m-%d").to_string())
                .collect(),
            values: window.iter().map(|p| round2(p.close)).collect(),
        };

        AnalysisReport {
            currency: currency_marker(&self.ticker, self.currency_code.as_deref()),
            ticker: self.ticker,
            as_of: last.date,
            observations: self.series.len(),
            current_price,
            predicted_price,
            sma: self
                .sma
                .into_iter()
                .map(|m| MovingAverage {
                    window: m.window,
                    value: m.value.map(round2),
                })
                .collect(),
            rsi: self.rsi.effective().map(round2),
            rsi_status: self.rsi.status(),
            recommendation: signal.action,
            reason: signal.reason,
            policy: policy.name(),
            chart,
        }
    }
}

/// Round to cents, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

const SUFFIX_MARKERS: &[(&str, &str)] = &[
    (".NS", "₹"),
    (".BO", "₹"),
    (".L", "£"),
    (".TO", "C$"),
    (".KS", "₩"),
    (".KQ", "₩"),
    (".T", "¥"),
];

const CODE_MARKERS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("INR", "₹"),
    ("GBP", "£"),
    ("GBp", "£"),
    ("CAD", "C$"),
    ("KRW", "₩"),
    ("JPY", "¥"),
    ("EUR", "€"),
];

const DEFAULT_MARKER: &str = "$";

/// Display marker for a ticker's currency.
///
/// A known ISO code from the provider wins; otherwise the exchange suffix of
/// the ticker decides, falling back to `$`.
pub fn currency_marker(ticker: &str, code: Option<&str>) -> &'static str {
    if let Some(marker) = code.and_then(|c| {
        CODE_MARKERS
            .iter()
            .find(|(known, _)| *known == c)
            .map(|(_, marker)| *marker)
    }) {
        return marker;
    }

    let ticker = normalize_ticker(ticker);
    SUFFIX_MARKERS
        .iter()
        .find(|(suffix, _)| ticker.ends_with(*suffix))
        .map(|(_, marker)| *marker)
        .unwrap_or(DEFAULT_MARKER)
}
