// ===============================
// src/drawdown.rs
// ===============================
//
// Drawdown dari 52-week high:
//   latest   = NAV pada tanggal terbaru (series di-sort dulu, urutan sumber tidak dipercaya)
//   high_52w = max NAV dengan date >= today - 365 hari (inklusif)
//   abs      = high_52w - latest
//   pct      = abs / high_52w * 100
//   trigger  = pct >= threshold (inklusif)
//

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::{FundConfig, FundStatus, NavPoint};
use crate::error::EvalError;

pub const LOOKBACK_DAYS: i64 = 365;

pub fn cutoff(today: NaiveDate) -> NaiveDate {
    today - Duration::days(LOOKBACK_DAYS)
}

pub fn evaluate(
    fund: &FundConfig,
    series: &[NavPoint],
    today: NaiveDate,
) -> Result<FundStatus, EvalError> {
    let cutoff = cutoff(today);

    // Stable sort: on a duplicate date the first point in source order wins.
    let mut sorted: Vec<NavPoint> = series.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let latest = sorted.first().ok_or(EvalError::InsufficientData { cutoff })?;

    let high_52w = sorted
        .iter()
        .take_while(|p| p.date >= cutoff)
        .map(|p| p.nav)
        .max()
        .ok_or(EvalError::InsufficientData { cutoff })?;

    // pct dibagi high_52w, jadi harus positif
    if high_52w <= Decimal::ZERO {
        return Err(EvalError::InsufficientData { cutoff });
    }

    // latest is the newest point and the window is non-empty, so latest is
    // inside it and high_52w >= latest.nav. Kept so a negative drawdown can
    // never reach the report if the window rule changes.
    let drawdown_abs = high_52w - latest.nav;
    if drawdown_abs < Decimal::ZERO {
        return Err(EvalError::InconsistentSeries { latest: latest.nav, high: high_52w });
    }
    let drawdown_pct = drawdown_abs / high_52w * Decimal::ONE_HUNDRED;

    Ok(FundStatus {
        code: fund.code.clone(),
        name: fund.name.clone(),
        latest_date: latest.date,
        latest_nav: latest.nav,
        high_52w,
        drawdown_abs,
        drawdown_pct,
        threshold: fund.threshold,
        triggered: drawdown_pct >= fund.threshold,
    })
}
