use error_stack::{Report, ResultExt};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::{IndicatorError, PipelineError, ProviderError, SeriesError};
use crate::forecast::linear_trend;
use crate::indicator::Indicator;
use crate::indicator::ma::Sma;
use crate::indicator::rsi::Rsi;
use crate::model::{PriceHistory, PriceSeries};
use crate::policy::Policy;
use crate::provider::PriceHistoryProvider;
use crate::report::{AnalysisReport, ReportBuilder, normalize_ticker};

/// Validated indicator and policy parameters for one analysis.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub moving_averages: Vec<Sma>,
    pub rsi: Rsi,
    pub chart_window: usize,
    pub policy: Policy,
}

impl AnalysisSettings {
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, Report<IndicatorError>> {
        let moving_averages = config
            .sma_windows
            .iter()
            .map(|&w| Sma::new(w))
            .collect::<Result<Vec<_>, _>>()?;

        let policy = match config.policy.as_str() {
            "rsi_priority" => Policy::RsiPriority {
                oversold: config.oversold,
                overbought: config.overbought,
            },
            "threshold" => Policy::Threshold {
                band: config.threshold_pct,
            },
            other => {
                return Err(Report::new(IndicatorError::InvalidParameter {
                    name: format!("unknown policy \"{other}\""),
                }));
            }
        };

        Ok(Self {
            moving_averages,
            rsi: Rsi::new(config.rsi_period)?,
            chart_window: config.chart_window,
            policy,
        })
    }
}

/// Run the full analysis over an already fetched history.
///
/// Synchronous and free of shared state; an empty history yields
/// [`PipelineError::EmptySeries`] and no partial report.
pub fn analyze(
    symbol: &str,
    history: PriceHistory,
    settings: &AnalysisSettings,
) -> Result<AnalysisReport, Report<PipelineError>> {
    let ticker = normalize_ticker(symbol);
    if ticker.is_empty() {
        return Err(Report::new(PipelineError::InvalidSymbol));
    }

    let series = PriceSeries::new(history.points).map_err(|e| {
        let context = match e.current_context() {
            SeriesError::Empty => PipelineError::EmptySeries {
                symbol: ticker.clone(),
            },
            _ => PipelineError::UpstreamData {
                symbol: ticker.clone(),
                retryable: false,
            },
        };
        e.change_context(context)
    })?;

    let mut builder = ReportBuilder::new(&ticker, &series)
        .currency_code(history.currency)
        .chart_window(settings.chart_window);

    for sma in &settings.moving_averages {
        let value = sma.latest(&series);
        if value.is_none() {
            debug!(
                symbol = %ticker,
                indicator = %sma.name(),
                required = sma.required_points(),
                available = series.len(),
                "insufficient history for indicator"
            );
        }
        builder = builder.sma(sma.window(), value);
    }

    let rsi = settings.rsi.reading(&series);
    debug!(symbol = %ticker, indicator = %settings.rsi.name(), reading = ?rsi, "rsi computed");

    let forecast = linear_trend(&series);
    if forecast.degenerate {
        debug!(symbol = %ticker, "single observation, carrying last close forward");
    } else {
        debug!(
            symbol = %ticker,
            slope = forecast.slope,
            intercept = forecast.intercept,
            "trend fitted"
        );
    }

    let report = builder.rsi(rsi).forecast(&forecast).build(&settings.policy);

    info!(
        symbol = %report.ticker,
        observations = report.observations,
        current = report.current_price,
        predicted = report.predicted_price,
        recommendation = %report.recommendation,
        policy = report.policy,
        "analysis complete"
    );

    Ok(report)
}

/// Fetch `lookback_days` of history from `provider` and analyze it.
pub async fn fetch_and_analyze(
    provider: &dyn PriceHistoryProvider,
    symbol: &str,
    lookback_days: u32,
    settings: &AnalysisSettings,
) -> Result<AnalysisReport, Report<PipelineError>> {
    let ticker = normalize_ticker(symbol);
    if ticker.is_empty() {
        return Err(Report::new(PipelineError::InvalidSymbol));
    }

    info!(provider = provider.name(), symbol = %ticker, lookback_days, "fetching price history");

    let history = provider
        .fetch_history(&ticker, lookback_days)
        .await
        .map_err(|e| {
            let context = match e.current_context() {
                ProviderError::NoData { .. } => PipelineError::EmptySeries {
                    symbol: ticker.clone(),
                },
                other => PipelineError::UpstreamData {
                    symbol: ticker.clone(),
                    retryable: other.is_transient(),
                },
            };
            e.change_context(context)
        })?;

    analyze(&ticker, history, settings).attach_with(|| format!("provider: {}", provider.name()))
}
