use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display("failed to read config file")]
    ReadFile,
    #[display("failed to parse config: {reason}")]
    Parse { reason: String },
    #[display("invalid config: {field}")]
    Validation { field: String },
}

#[derive(Debug, Display, Error)]
pub enum ProviderError {
    /// The symbol is unknown or the requested range holds no closes.
    #[display("{provider} returned no price data for {symbol}")]
    NoData { provider: String, symbol: String },
    /// Transport failure or a server-side (5xx) error.
    #[display("request to {provider} failed")]
    Request { provider: String },
    #[display("rate limit exceeded for {provider}")]
    RateLimited { provider: String },
    /// Client-side (4xx) rejection; repeating the request will not help.
    #[display("{provider} rejected the request")]
    Rejected { provider: String },
    #[display("failed to read price source for {provider}")]
    ReadSource { provider: String },
    #[display("lookback of {days} days is out of range for {provider}")]
    InvalidLookback { provider: String, days: u32 },
    #[display("failed to parse response from {provider}")]
    ResponseParse { provider: String },
}

impl ProviderError {
    /// Whether the same fetch could succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Request { .. } | Self::RateLimited { .. })
    }
}

#[derive(Debug, Display, Error)]
pub enum SeriesError {
    #[display("price series is empty")]
    Empty,
    #[display("invalid close {close} on {date}")]
    InvalidClose { date: String, close: f64 },
    #[display("date {date} does not follow {previous}")]
    OutOfOrder { date: String, previous: String },
}

#[derive(Debug, Display, Error)]
pub enum IndicatorError {
    #[display("invalid parameter: {name}")]
    InvalidParameter { name: String },
}

#[derive(Debug, Display, Error)]
pub enum PipelineError {
    #[display("no observations available for {symbol}")]
    EmptySeries { symbol: String },
    #[display("upstream price data for {symbol} is unusable")]
    UpstreamData { symbol: String, retryable: bool },
    #[display("symbol must not be blank")]
    InvalidSymbol,
}

impl PipelineError {
    /// Whether asking the provider again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamData { retryable: true, .. })
    }
}

#[derive(Debug, Display, Error)]
pub enum OutputError {
    #[display("failed to render report")]
    Render,
    #[display("failed to write report")]
    Write,
}
