// ===============================
// src/domain.rs
// ===============================
use ahash::AHashMap as HashMap;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One entry of the watchlist. `threshold` is a drawdown percentage (0..=100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundConfig { pub code: String, pub name: String, pub threshold: Decimal }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavPoint { pub date: NaiveDate, pub nav: Decimal }

#[derive(Debug, Clone, PartialEq)]
pub struct FundStatus {
    pub code: String,
    pub name: String,
    pub latest_date: NaiveDate,
    pub latest_nav: Decimal,
    pub high_52w: Decimal,
    pub drawdown_abs: Decimal,
    pub drawdown_pct: Decimal,
    pub threshold: Decimal,
    pub triggered: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FundOutcome {
    Evaluated(FundStatus),
    Unavailable { code: String, name: String, reason: String },
}

/// code -> alerted (triggered as of the last run)
pub type StateMap = HashMap<String, bool>;
