pub mod terminal;

use std::io::Write;

use error_stack::{Report, ResultExt};

use crate::error::OutputError;
use crate::report::AnalysisReport;

/// Sink for finished analysis reports.
pub trait ReportSink: Send + Sync {
    fn emit(&self, report: &AnalysisReport) -> Result<(), Report<OutputError>>;
}

/// Writes each report to stdout as pretty-printed JSON.
pub struct JsonSink;

impl ReportSink for JsonSink {
    fn emit(&self, report: &AnalysisReport) -> Result<(), Report<OutputError>> {
        let body = render_json(report)?;
        write_stdout(&body)
    }
}

pub fn render_json(report: &AnalysisReport) -> Result<String, Report<OutputError>> {
    serde_json::to_string_pretty(report)
        .change_context(OutputError::Render)
        .attach_with(|| format!("ticker: {}", report.ticker))
}

fn write_stdout(body: &str) -> Result<(), Report<OutputError>> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{body}").change_context(OutputError::Write)?;
    stdout.flush().change_context(OutputError::Write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PricePoint, PriceSeries};
    use crate::policy::Policy;
    use crate::report::ReportBuilder;
    use chrono::NaiveDate;

    #[test]
    fn json_round_trips_through_serde_value() {
        let series = PriceSeries::new(vec![PricePoint::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            50.0,
        )])
        .unwrap();
        let report = ReportBuilder::new("tcs.ns", &series)
            .sma(10, None)
            .build(&Policy::Threshold { band: 0.005 });
        let body = render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["ticker"], "TCS.NS");
        assert_eq!(value["currency"], "₹");
        assert_eq!(value["recommendation"], "HOLD");
        assert_eq!(value["predicted_price"], 50.0);
        assert!(value["rsi"].is_null());
    }
}
