use error_stack::Report;

use crate::error::OutputError;
use crate::output::{ReportSink, write_stdout};
use crate::report::AnalysisReport;

/// Human-readable summary on stdout, plus a structured log line.
pub struct TerminalSink;

impl ReportSink for TerminalSink {
    fn emit(&self, report: &AnalysisReport) -> Result<(), Report<OutputError>> {
        tracing::info!(
            symbol = %report.ticker,
            recommendation = %report.recommendation,
            reason = %report.reason,
            current_price = report.current_price,
            predicted_price = report.predicted_price,
            rsi = ?report.rsi,
            "report ready"
        );
        write_stdout(&render_text(report))
    }
}

const UNAVAILABLE: &str = "n/a";

pub fn render_text(report: &AnalysisReport) -> String {
    let c = report.currency;
    let mut lines = vec![
        format!(
            "{} (as of {}, {} sessions)",
            report.ticker, report.as_of, report.observations
        ),
        format!("  current price    {c}{:.2}", report.current_price),
        format!("  predicted price  {c}{:.2}", report.predicted_price),
    ];
    lines.extend(report.sma.iter().map(|ma| {
        let value = ma
            .value
            .map(|v| format!("{c}{v:.2}"))
            .unwrap_or_else(|| UNAVAILABLE.to_owned());
        format!("  SMA({:<3})         {value}", ma.window)
    }));
    let rsi = report
        .rsi
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| UNAVAILABLE.to_owned());
    lines.push(format!("  RSI              {rsi}"));
    lines.push(format!(
        "  recommendation   {} ({}) [{} policy]",
        report.recommendation, report.reason, report.policy
    ));
    lines.join("\n")
}
