// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : mf_drawdown_alert — mutual fund 52-week drawdown watcher in Rust
Module  : config.rs
Version : 0.5.0
Author  : Kukuh Tripamungkas Wicaksono (Kukuh TW)
Email   : kukuhtw@gmail.com
WhatsApp: https://wa.me/628129893706
LinkedIn: https://id.linkedin.com/in/kukuhtw
License : MIT (see LICENSE)

Summary : Fetches NAV history for a watchlist of mutual funds (mfapi.in),
          computes drawdown from the 52-week high, sends one Telegram
          summary per run and keeps per-fund alert state in a CSV file.

(c) 2025 Kukuh TW. All rights reserved where applicable.
=============================================================================
*/
use std::env;
use std::time::Duration;

use ahash::AHashSet as HashSet;
use dotenvy::dotenv;
use rust_decimal::Decimal;
use url::Url;

use crate::domain::FundConfig;
use crate::error::ConfigError;

pub const DEFAULT_MFAPI_BASE_URL: &str = "https://api.mfapi.in";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
pub const DEFAULT_STATE_FILE: &str = "state.csv";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

/// Tujuan notifikasi
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotifyMode {
    Telegram,
    Log, // dry run: pesan hanya ditulis ke log
}

impl NotifyMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "telegram" | "tg" => Some(NotifyMode::Telegram),
            "log" | "dry_run" | "dryrun" => Some(NotifyMode::Log),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyMode::Telegram => "telegram",
            NotifyMode::Log => "log",
        }
    }
}

#[derive(Clone, Debug)]
pub struct TelegramCfg {
    pub api_url: String,
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub funds: Vec<FundConfig>,

    // sources / sinks
    pub mfapi_base_url: String,
    pub notify_mode: NotifyMode,
    pub telegram: Option<TelegramCfg>,
    pub http_timeout: Duration,

    // files
    pub state_file: String,

    // behaviour
    pub fail_fast: bool,
}

/// Watchlist bawaan (dipakai jika WATCHLIST_FILE tidak di-set).
pub fn default_watchlist() -> Vec<FundConfig> {
    [
        ("150797", "WhiteOak Capital Large Cap Fund", 6),
        ("151796", "360 ONE FLEXICAP FUND", 9),
        ("148990", "ICICI Prudential Flexicap Fund", 9),
        ("153859", "JioBlackRock Flexi Cap Fund", 9),
        ("119775", "Kotak Midcap Fund", 9),
        ("150915", "Mahindra Manulife Small Cap Fund", 12),
        ("152600", "HDFC Manufacturing fund", 12),
        ("152237", "Motilal Oswal Small Cap Fund", 12),
        ("149870", "HDFC Nifty 100 Equal Weight Index Fund", 9),
        ("151895", "Bajaj Finserv Flexi Cap Fund", 9),
    ]
    .into_iter()
    .map(|(code, name, threshold)| FundConfig {
        code: code.to_string(),
        name: name.to_string(),
        threshold: Decimal::from(threshold),
    })
    .collect()
}

pub fn load() -> Result<Config, ConfigError> {
    // Pastikan .env dibaca (agar BOT_TOKEN, CHAT_ID, dll ter-load)
    let _ = dotenv();
    load_from(|key| env::var(key).ok())
}

/// Build the config from an arbitrary key lookup (process env in `load`).
pub fn load_from<F>(get: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // blank counts as unset
    let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    // ===== Mode =====
    let notify_mode = match var("NOTIFY_MODE") {
        None => NotifyMode::Telegram,
        Some(v) => NotifyMode::parse(&v).ok_or_else(|| ConfigError::InvalidVar {
            key: "NOTIFY_MODE",
            value: v.clone(),
            reason: "expected telegram|log".to_string(),
        })?,
    };

    // ===== Secrets =====
    let telegram_api_url = base_url(var("TELEGRAM_API_URL"), "TELEGRAM_API_URL", DEFAULT_TELEGRAM_API_URL)?;
    let telegram = match notify_mode {
        NotifyMode::Telegram => Some(TelegramCfg {
            api_url: telegram_api_url,
            bot_token: var("BOT_TOKEN").ok_or(ConfigError::MissingVar("BOT_TOKEN"))?,
            chat_id: var("CHAT_ID").ok_or(ConfigError::MissingVar("CHAT_ID"))?,
        }),
        NotifyMode::Log => None,
    };

    // ===== Source =====
    let mfapi_base_url = base_url(var("MFAPI_BASE_URL"), "MFAPI_BASE_URL", DEFAULT_MFAPI_BASE_URL)?;
    let http_timeout_secs: u64 = match var("HTTP_TIMEOUT_SECS") {
        None => DEFAULT_HTTP_TIMEOUT_SECS,
        Some(v) => match v.parse::<u64>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(ConfigError::InvalidVar {
                    key: "HTTP_TIMEOUT_SECS",
                    value: v,
                    reason: "expected a positive integer".to_string(),
                })
            }
        },
    };

    let fail_fast = match var("FAIL_FAST") {
        None => false,
        Some(v) => parse_bool(&v).ok_or_else(|| ConfigError::InvalidVar {
            key: "FAIL_FAST",
            value: v.clone(),
            reason: "expected true|false".to_string(),
        })?,
    };

    let state_file = var("STATE_FILE").unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());

    // ===== Watchlist =====
    let funds = match var("WATCHLIST_FILE") {
        Some(path) => read_watchlist(&path)?,
        None => default_watchlist(),
    };
    validate_watchlist(&funds)?;

    Ok(Config {
        funds,
        mfapi_base_url,
        notify_mode,
        telegram,
        http_timeout: Duration::from_secs(http_timeout_secs),
        state_file,
        fail_fast,
    })
}

fn base_url(value: Option<String>, key: &'static str, default: &str) -> Result<String, ConfigError> {
    let raw = value.unwrap_or_else(|| default.to_string());
    match Url::parse(&raw) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {
            Ok(raw.trim_end_matches('/').to_string())
        }
        Ok(u) => Err(ConfigError::InvalidVar {
            key,
            value: raw.clone(),
            reason: format!("unsupported scheme {}", u.scheme()),
        }),
        Err(e) => Err(ConfigError::InvalidVar { key, value: raw, reason: e.to_string() }),
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Watchlist file: JSON array of `{ "code", "name", "threshold" }`.
pub fn read_watchlist(path: &str) -> Result<Vec<FundConfig>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::WatchlistIo {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::WatchlistParse {
        path: path.to_string(),
        source,
    })
}

pub fn validate_watchlist(funds: &[FundConfig]) -> Result<(), ConfigError> {
    if funds.is_empty() {
        return Err(ConfigError::EmptyWatchlist);
    }
    let mut seen = HashSet::new();
    for f in funds {
        if f.threshold < Decimal::ZERO || f.threshold > Decimal::ONE_HUNDRED {
            return Err(ConfigError::ThresholdOutOfRange {
                code: f.code.clone(),
                threshold: f.threshold,
            });
        }
        if !seen.insert(f.code.as_str()) {
            return Err(ConfigError::DuplicateFund(f.code.clone()));
        }
    }
    Ok(())
}
