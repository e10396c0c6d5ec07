use std::path::Path;

use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::error::ConfigError;

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "text".into()
}

fn default_base_url() -> String {
    "https://query1.finance.yahoo.com".into()
}

fn default_lookback_days() -> u32 {
    730
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_requests_per_second() -> u32 {
    2
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) stock-insight/0.1".into()
}

fn default_sma_windows() -> Vec<usize> {
    vec![10, 50]
}

fn default_rsi_period() -> usize {
    14
}

fn default_chart_window() -> usize {
    100
}

fn default_policy() -> String {
    "threshold".into()
}

fn default_threshold_pct() -> f64 {
    0.005
}

fn default_oversold() -> f64 {
    30.0
}

fn default_overbought() -> f64 {
    70.0
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepted values: `"text"` | `"json"`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Calendar days of history requested per analysis.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            lookback_days: default_lookback_days(),
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_sma_windows")]
    pub sma_windows: Vec<usize>,
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,
    /// Number of most recent closes returned for charting.
    #[serde(default = "default_chart_window")]
    pub chart_window: usize,
    /// Accepted values: `"threshold"` | `"rsi_priority"`
    #[serde(default = "default_policy")]
    pub policy: String,
    /// Hold band for the threshold policy, as a fraction of the current price.
    #[serde(default = "default_threshold_pct")]
    pub threshold_pct: f64,
    #[serde(default = "default_oversold")]
    pub oversold: f64,
    #[serde(default = "default_overbought")]
    pub overbought: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sma_windows: default_sma_windows(),
            rsi_period: default_rsi_period(),
            chart_window: default_chart_window(),
            policy: default_policy(),
            threshold_pct: default_threshold_pct(),
            oversold: default_oversold(),
            overbought: default_overbought(),
        }
    }
}

/// Load and validate an `AppConfig` from a TOML file at `path`.
pub fn load(path: &Path) -> Result<AppConfig, Report<ConfigError>> {
    let content = std::fs::read_to_string(path)
        .change_context(ConfigError::ReadFile)
        .attach_with(|| format!("path: {}", path.display()))?;

    parse(&content)
}

/// Parse and validate an `AppConfig` from TOML text.
pub fn parse(content: &str) -> Result<AppConfig, Report<ConfigError>> {
    let config: AppConfig = toml::from_str(content).change_context(ConfigError::Parse {
        reason: "invalid TOML syntax or schema mismatch".into(),
    })?;

    validate(&config)?;

    Ok(config)
}

const VALID_LOG_FORMATS: &[&str] = &["text", "json"];
const VALID_POLICIES: &[&str] = &["threshold", "rsi_priority"];

fn validate(config: &AppConfig) -> Result<(), Report<ConfigError>> {
    validate_general(&config.general)?;
    validate_provider(&config.provider)?;
    validate_windows(&config.analysis)?;
    validate_policy(&config.analysis)?;
    Ok(())
}

fn invalid(field: String) -> Report<ConfigError> {
    Report::new(ConfigError::Validation { field })
}

fn validate_general(general: &GeneralConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_LOG_FORMATS.contains(&general.log_format.as_str()) {
        return Err(invalid(format!(
            "general.log_format \"{}\" is not valid",
            general.log_format
        )));
    }
    Ok(())
}

/// One hundred years of daily history.
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

fn validate_provider(provider: &ProviderConfig) -> Result<(), Report<ConfigError>> {
    if provider.lookback_days == 0 || provider.lookback_days > MAX_LOOKBACK_DAYS {
        return Err(invalid(format!(
            "provider.lookback_days must be in 1..={MAX_LOOKBACK_DAYS}"
        )));
    }
    if provider.requests_per_second == 0 {
        return Err(invalid("provider.requests_per_second must be > 0".into()));
    }
    if provider.timeout_secs == 0 {
        return Err(invalid("provider.timeout_secs must be > 0".into()));
    }
    if !provider.base_url.starts_with("http://") && !provider.base_url.starts_with("https://") {
        return Err(invalid(format!(
            "provider.base_url \"{}\" must be an http(s) URL",
            provider.base_url
        )));
    }
    Ok(())
}

fn validate_windows(analysis: &AnalysisConfig) -> Result<(), Report<ConfigError>> {
    if analysis.sma_windows.is_empty() {
        return Err(invalid("analysis.sma_windows must not be empty".into()));
    }
    if analysis.sma_windows.contains(&0) {
        return Err(invalid("analysis.sma_windows entries must be > 0".into()));
    }
    let mut seen = std::collections::HashSet::new();
    for window in &analysis.sma_windows {
        if !seen.insert(*window) {
            return Err(invalid(format!(
                "analysis.sma_windows: duplicate window {window}"
            )));
        }
    }
    if analysis.rsi_period == 0 {
        return Err(invalid("analysis.rsi_period must be > 0".into()));
    }
    if analysis.chart_window == 0 {
        return Err(invalid("analysis.chart_window must be > 0".into()));
    }
    Ok(())
}

fn validate_policy(analysis: &AnalysisConfig) -> Result<(), Report<ConfigError>> {
    if !VALID_POLICIES.contains(&analysis.policy.as_str()) {
        return Err(invalid(format!(
            "analysis.policy \"{}\" is not valid",
            analysis.policy
        )));
    }
    if !(0.0..1.0).contains(&analysis.threshold_pct) {
        return Err(invalid(format!(
            "analysis.threshold_pct {} must be in [0, 1)",
            analysis.threshold_pct
        )));
    }
    let bounds = 0.0..=100.0;
    if !bounds.contains(&analysis.oversold)
        || !bounds.contains(&analysis.overbought)
        || analysis.oversold >= analysis.overbought
    {
        return Err(invalid(format!(
            "analysis.oversold ({}) and analysis.overbought ({}) must satisfy 0 <= oversold < overbought <= 100",
            analysis.oversold, analysis.overbought
        )));
    }
    Ok(())
}
