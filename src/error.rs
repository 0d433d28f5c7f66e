// ===============================
// src/error.rs
// ===============================
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Fatal, pre-flight: raised before any network call or file write.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidVar {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("watchlist file {path}: {source}")]
    WatchlistIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("watchlist file {path}: {source}")]
    WatchlistParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("watchlist is empty")]
    EmptyWatchlist,

    #[error("fund {code}: threshold {threshold} outside 0..=100")]
    ThresholdOutOfRange { code: String, threshold: Decimal },

    #[error("fund {0} listed more than once")]
    DuplicateFund(String),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has no `data` array")]
    MissingData,

    #[error("bad date {0:?} (expected DD-MM-YYYY)")]
    BadDate(String),

    #[error("bad nav {0:?}")]
    BadNav(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum EvalError {
    #[error("insufficient data: no NAV points on or after {cutoff}")]
    InsufficientData { cutoff: NaiveDate },

    /// Latest NAV above the window high. `evaluate` always has the latest
    /// point inside the window, so this only guards against a changed rule.
    #[error("inconsistent series: latest nav {latest} above 52w high {high}")]
    InconsistentSeries { latest: Decimal, high: Decimal },
}

#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: bad alerted value {value:?}")]
    BadFlag { row: usize, value: String },
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("telegram rejected message: {0}")]
    Rejected(String),
}

/// Per-fund failure (fetch or evaluation).
#[derive(Error, Debug)]
pub enum FundError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("nav source: {0}")]
    Source(#[from] FetchError),

    #[error("fund {code}: {source}")]
    Fund {
        code: String,
        #[source]
        source: FundError,
    },

    #[error("state: {0}")]
    State(#[from] StateError),

    #[error("notify: {0}")]
    Notify(#[from] NotifyError),
}
