use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::model::{PriceHistory, PricePoint};
use crate::provider::{PriceHistoryProvider, normalize_points};

const PROVIDER_NAME: &str = "chart-api";
const CHART_PATH: &str = "/v8/finance/chart";
const NOT_FOUND_CODE: &str = "Not Found";

/// Daily bars from a Yahoo-compatible `v8/finance/chart` endpoint.
pub struct ChartApiProvider {
    client: reqwest::Client,
    chart_url: Url,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl ChartApiProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, Report<ProviderError>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .change_context(provider_error(ProviderErrorKind::Request))
            .attach("failed to build HTTP client")?;

        let base = config.base_url.trim_end_matches('/');
        let chart_url = Url::parse(&format!("{base}{CHART_PATH}"))
            .change_context(provider_error(ProviderErrorKind::Rejected))
            .attach_with(|| format!("base url: {}", config.base_url))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(nonzero!(1u32));
        let quota = Quota::per_second(per_second);

        Ok(Self {
            client,
            chart_url,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }
}

impl PriceHistoryProvider for ChartApiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn fetch_history(
        &self,
        symbol: &str,
        lookback_days: u32,
    ) -> BoxFuture<'_, Result<PriceHistory, Report<ProviderError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move {
            // Wait for rate limiter before making the request
            self.rate_limiter.until_ready().await;

            let url = symbol_url(&self.chart_url, &symbol)?;
            let end = Utc::now();
            let start = lookback_start(end, lookback_days)?;
            let params = [
                ("period1", start.timestamp().to_string()),
                ("period2", end.timestamp().to_string()),
                ("interval", "1d".to_owned()),
                ("events", "history".to_owned()),
            ];

            debug!(%url, lookback_days, "requesting chart data");

            let response = self
                .client
                .get(url)
                .query(&params)
                .send()
                .await
                .change_context(provider_error(ProviderErrorKind::Request))
                .attach_with(|| format!("symbol: {symbol}"))?;

            let status = response.status();
            if !status.is_success() {
                if status == StatusCode::TOO_MANY_REQUESTS {
                    warn!(symbol = %symbol, "chart api rate limited");
                }
                return Err(Report::new(status_error(status, &symbol))
                    .attach(format!("HTTP status: {status}")));
            }

            let body: ChartResponse = response
                .json()
                .await
                .change_context(provider_error(ProviderErrorKind::ResponseParse))
                .attach_with(|| format!("symbol: {symbol}"))?;

            let history = body.into_history(&symbol)?;

            info!(
                symbol = %symbol,
                fetched = history.points.len(),
                currency = history.currency.as_deref().unwrap_or("unknown"),
                "chart history fetch complete"
            );

            Ok(history)
        })
    }
}

/// Appends `symbol` as one escaped path segment.
fn symbol_url(chart_url: &Url, symbol: &str) -> Result<Url, Report<ProviderError>> {
    let mut url = chart_url.clone();
    url.path_segments_mut()
        .map_err(|()| {
            Report::new(provider_error(ProviderErrorKind::Rejected))
                .attach(format!("base url cannot take a path: {chart_url}"))
        })?
        .push(symbol);
    Ok(url)
}

fn lookback_start(
    end: DateTime<Utc>,
    lookback_days: u32,
) -> Result<DateTime<Utc>, Report<ProviderError>> {
    end.checked_sub_signed(chrono::Duration::days(i64::from(lookback_days)))
        .ok_or_else(|| {
            Report::new(ProviderError::InvalidLookback {
                provider: PROVIDER_NAME.into(),
                days: lookback_days,
            })
        })
}

/// Only throttling and server-side failures are worth repeating.
fn status_error(status: StatusCode, symbol: &str) -> ProviderError {
    if status == StatusCode::NOT_FOUND {
        no_data(symbol)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        provider_error(ProviderErrorKind::RateLimited)
    } else if status.is_server_error() {
        provider_error(ProviderErrorKind::Request)
    } else {
        provider_error(ProviderErrorKind::Rejected)
    }
}

enum ProviderErrorKind {
    Request,
    RateLimited,
    Rejected,
    ResponseParse,
}

fn provider_error(kind: ProviderErrorKind) -> ProviderError {
    let provider = PROVIDER_NAME.into();
    match kind {
        ProviderErrorKind::Request => ProviderError::Request { provider },
        ProviderErrorKind::RateLimited => ProviderError::RateLimited { provider },
        ProviderErrorKind::Rejected => ProviderError::Rejected { provider },
        ProviderErrorKind::ResponseParse => ProviderError::ResponseParse { provider },
    }
}

fn no_data(symbol: &str) -> ProviderError {
    ProviderError::NoData {
        provider: PROVIDER_NAME.into(),
        symbol: symbol.to_owned(),
    }
}

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    /// Seconds east of UTC for the listing exchange.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    close: Option<Vec<Option<f64>>>,
}

impl ChartResponse {
    fn into_history(self, symbol: &str) -> Result<PriceHistory, Report<ProviderError>> {
        if let Some(error) = self.chart.error {
            let context = if error.code == NOT_FOUND_CODE {
                no_data(symbol)
            } else {
                provider_error(ProviderErrorKind::Rejected)
            };
            return Err(Report::new(context)
                .attach(format!("{}: {}", error.code, error.description)));
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Err(Report::new(no_data(symbol)).attach("response carried no result"));
        };

        let timestamps = result.timestamp.unwrap_or_default();
        if timestamps.is_empty() {
            return Err(Report::new(no_data(symbol)).attach("response carried no timestamps"));
        }

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .and_then(|q| q.close)
            .ok_or_else(|| {
                Report::new(provider_error(ProviderErrorKind::ResponseParse))
                    .attach("response carried no close series")
            })?;

        if closes.len() != timestamps.len() {
            return Err(Report::new(provider_error(ProviderErrorKind::ResponseParse))
                .attach(format!(
                    "{} timestamps but {} closes",
                    timestamps.len(),
                    closes.len()
                )));
        }

        let offset = result.meta.gmtoffset;
        let mut points = Vec::with_capacity(timestamps.len());
        for (ts, close) in timestamps.into_iter().zip(closes) {
            // Sessions without a close (halts, partial rows) are skipped.
            let Some(close) = close else { continue };
            let date = ts
                .checked_add(offset)
                .and_then(|local| DateTime::from_timestamp(local, 0))
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    Report::new(provider_error(ProviderErrorKind::ResponseParse))
                        .attach(format!("timestamp out of range: {ts}"))
                })?;
            points.push(PricePoint::new(date, close));
        }

        if points.is_empty() {
            return Err(Report::new(no_data(symbol)).attach("every row lacked a close"));
        }

        Ok(PriceHistory {
            points: normalize_points(points),
            currency: result.meta.currency,
        })
    }
}
