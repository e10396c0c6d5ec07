use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stock_insight::config::{self, AppConfig, GeneralConfig};
use stock_insight::output::terminal::TerminalSink;
use stock_insight::output::{JsonSink, ReportSink};
use stock_insight::pipeline::{AnalysisSettings, fetch_and_analyze};
use stock_insight::provider::PriceHistoryProvider;
use stock_insight::provider::chart_api::ChartApiProvider;
use stock_insight::provider::file::FileProvider;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("provider error")]
    Provider,
    #[display("analysis failed")]
    Analysis,
    #[display("output error")]
    Output,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "stock-insight",
    about = "Technical-analysis summary and next-session forecast for a single ticker"
)]
struct Cli {
    /// Ticker symbol, e.g. AAPL, TCS.NS, VOD.L
    symbol: String,

    /// Path to the TOML configuration file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read closes from a JSON file instead of the chart API
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// ISO currency code for closes read with --file
    #[arg(long, requires = "file")]
    currency: Option<String>,

    /// Report format written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => config::load(path).change_context(AppError::Config)?,
        None => AppConfig::default(),
    };

    init_tracing(&config.general);

    let settings =
        AnalysisSettings::from_config(&config.analysis).change_context(AppError::Config)?;

    let provider = build_provider(&cli, &config)?;
    let sink: Box<dyn ReportSink> = match cli.format {
        OutputFormat::Text => Box::new(TerminalSink),
        OutputFormat::Json => Box::new(JsonSink),
    };

    let report = fetch_and_analyze(
        provider.as_ref(),
        &cli.symbol,
        config.provider.lookback_days,
        &settings,
    )
    .await
    .change_context(AppError::Analysis)?;

    sink.emit(&report).change_context(AppError::Output)?;

    info!(symbol = %report.ticker, "done");
    Ok(())
}

fn init_tracing(general: &GeneralConfig) {
    let filter = EnvFilter::new(&general.log_level);
    // Logs go to stderr so stdout carries only the report.
    match general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn build_provider(
    cli: &Cli,
    config: &AppConfig,
) -> Result<Box<dyn PriceHistoryProvider>, Report<AppError>> {
    match &cli.file {
        Some(path) => {
            let mut provider = FileProvider::new(path);
            if let Some(code) = &cli.currency {
                provider = provider.with_currency(code);
            }
            Ok(Box::new(provider))
        }
        None => {
            let provider =
                ChartApiProvider::new(&config.provider).change_context(AppError::Provider)?;
            Ok(Box::new(provider))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_parses_file_mode() {
        let cli = Cli::try_parse_from([
            "stock-insight",
            "tcs.ns",
            "--file",
            "prices.json",
            "--currency",
            "INR",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.symbol, "tcs.ns");
        assert_eq!(cli.file, Some(PathBuf::from("prices.json")));
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn currency_without_file_rejected() {
        let result = Cli::try_parse_from(["stock-insight", "AAPL", "--currency", "USD"]);
        assert!(result.is_err());
    }

    #[test]
    fn symbol_is_required() {
        assert!(Cli::try_parse_from(["stock-insight"]).is_err());
    }
}
