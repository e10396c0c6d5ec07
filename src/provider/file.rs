use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::info;

use crate::error::ProviderError;
use crate::model::{PriceHistory, PricePoint};
use crate::provider::{PriceHistoryProvider, normalize_points};

const PROVIDER_NAME: &str = "file";

/// Reads a JSON array of `{ "date": "YYYY-MM-DD", "close": f64 }` rows.
///
/// The lookback is measured back from the newest row in the file rather
/// than from today, so saved snapshots stay reproducible.
pub struct FileProvider {
    path: PathBuf,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileRow {
    date: NaiveDate,
    close: Option<f64>,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            currency: None,
        }
    }

    /// ISO currency code to report alongside the file's closes.
    pub fn with_currency(mut self, code: impl Into<String>) -> Self {
        self.currency = Some(code.into());
        self
    }
}

impl PriceHistoryProvider for FileProvider {
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
            let content = tokio::fs::read_to_string(&self.path)
                .await
                .change_context(ProviderError::ReadSource {
                    provider: PROVIDER_NAME.into(),
                })
                .attach_with(|| format!("path: {}", self.path.display()))?;

            let rows: Vec<FileRow> =
                serde_json::from_str(&content).change_context(ProviderError::ResponseParse {
                    provider: PROVIDER_NAME.into(),
                })?;

            let points = select_lookback(rows, lookback_days)?;
            if points.is_empty() {
                return Err(Report::new(ProviderError::NoData {
                    provider: PROVIDER_NAME.into(),
                    symbol,
                })
                .attach(format!("path: {}", self.path.display())));
            }

            info!(
                symbol = %symbol,
                path = %self.path.display(),
                fetched = points.len(),
                "file history loaded"
            );

            Ok(PriceHistory {
                points,
                currency: self.currency.clone(),
            })
        })
    }
}

fn select_lookback(
    rows: Vec<FileRow>,
    lookback_days: u32,
) -> Result<Vec<PricePoint>, Report<ProviderError>> {
    let points = normalize_points(
        rows.into_iter()
            .filter_map(|r| r.close.map(|c| PricePoint::new(r.date, c)))
            .collect(),
    );

    let newest = points
        .last()
        .map(|p| p.date)
        .unwrap_or_else(|| Utc::now().date_naive());
    let cutoff = newest
        .checked_sub_signed(chrono::Duration::days(i64::from(lookback_days)))
        .ok_or_else(|| {
            Report::new(ProviderError::InvalidLookback {
                provider: PROVIDER_NAME.into(),
                days: lookback_days,
            })
            .attach(format!("newest row: {newest}"))
        })?;

    Ok(points.into_iter().filter(|p| p.date > cutoff).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "stock-insight-{}-{}.json",
            std::process::id(),
            name
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn reads_rows_in_date_order() {
        let path = temp_file(
            "order",
            r#"[
                {"date": "2024-01-03", "close": 12.0},
                {"date": "2024-01-02", "close": 11.0},
                {"date": "2024-01-04", "close": null}
            ]"#,
        );
        let provider = FileProvider::new(&path).with_currency("USD");
        let history = provider.fetch_history("TEST", 30).await.unwrap();
        let closes: Vec<f64> = history.points.iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![11.0, 12.0]);
        assert_eq!(history.currency.as_deref(), Some("USD"));
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn empty_file_is_no_data() {
        let path = temp_file("empty", "[]");
        let err = FileProvider::new(&path)
            .fetch_history("TEST", 30)
            .await
            .unwrap_err();
        assert!(matches!(err.current_context(), ProviderError::NoData { .. }));
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn malformed_file_is_parse_error() {
        let path = temp_file("malformed", "{ not json");
        let err = FileProvider::new(&path)
            .fetch_history("TEST", 30)
            .await
            .unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProviderError::ResponseParse { .. }
        ));
        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn missing_file_is_permanent_read_error() {
        let err = FileProvider::new("/nonexistent/prices.json")
            .fetch_history("TEST", 30)
            .await
            .unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProviderError::ReadSource { .. }
        ));
        assert!(!err.current_context().is_transient());
    }

    #[test]
    fn lookback_beyond_calendar_is_error() {
        let rows = vec![FileRow {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            close: Some(1.0),
        }];
        let err = select_lookback(rows, 200_000_000).unwrap_err();
        assert!(matches!(
            err.current_context(),
            ProviderError::InvalidLookback {
                days: 200_000_000,
                ..
            }
        ));
    }

    #[test]
    fn lookback_counts_back_from_newest_row() {
        let rows = vec![
            FileRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                close: Some(1.0),
            },
            FileRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
                close: Some(2.0),
            },
            FileRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                close: Some(3.0),
            },
        ];
        let points = select_lookback(rows, 7).unwrap();
        let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![2.0, 3.0]);
    }
}
