//! Single-ticker technical analysis: moving averages, RSI, a linear-trend
//! forecast and a trade recommendation computed from daily closes.
//!
//! The analysis core ([`pipeline::analyze`] and everything it calls) is
//! synchronous and holds no shared state, so it can be called from any
//! number of threads. Only [`provider`] performs I/O.

pub mod config;
pub mod error;
pub mod forecast;
pub mod indicator;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod policy;
pub mod provider;
pub mod report;
