// ===============================
// src/report.rs
// ===============================
use std::fmt::Write as _;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{FundOutcome, FundStatus};

pub const TRIGGERED_HEADER: &str = "🚨 Triggered";
pub const NOT_TRIGGERED_HEADER: &str = "ℹ️ Not Triggered";
pub const UNAVAILABLE_HEADER: &str = "⚠️ Unavailable";

/// Telegram `sendMessage` text limit.
pub const MAX_MESSAGE_CHARS: usize = 4096;
pub const MAX_REASON_CHARS: usize = 200;

/// First `max_chars` characters of `s`, with `…` appended when cut.
pub fn clip(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &s[..end]),
        None => s.to_string(),
    }
}

// `{:.2}` on Decimal truncates, so round half away from zero first
fn two_dp(x: Decimal) -> Decimal {
    x.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn fund_block(f: &FundStatus) -> String {
    format!(
        "• {}\n  NAV: ₹{:.2} | 52W High: ₹{:.2}\n  ↓ ₹{:.2} ({:.2}%) | Threshold: {}%\n",
        f.name,
        two_dp(f.latest_nav),
        two_dp(f.high_52w),
        two_dp(f.drawdown_abs),
        two_dp(f.drawdown_pct),
        f.threshold.normalize()
    )
}

/// One summary message per run. Empty sections are left out; the result
/// never exceeds `MAX_MESSAGE_CHARS`.
pub fn compose(today: NaiveDate, outcomes: &[FundOutcome]) -> String {
    let mut triggered = Vec::new();
    let mut normal = Vec::new();
    let mut unavailable = Vec::new();
    for o in outcomes {
        match o {
            FundOutcome::Evaluated(s) if s.triggered => triggered.push(s),
            FundOutcome::Evaluated(s) => normal.push(s),
            FundOutcome::Unavailable { code, name, reason } => unavailable.push((code, name, reason)),
        }
    }

    let mut lines = vec![format!("📊 Mutual Fund NAV Status ({})\n", today.format("%d %b %Y"))];

    if !triggered.is_empty() {
        lines.push(TRIGGERED_HEADER.to_string());
        lines.extend(triggered.into_iter().map(fund_block));
    }
    if !normal.is_empty() {
        lines.push(NOT_TRIGGERED_HEADER.to_string());
        lines.extend(normal.into_iter().map(fund_block));
    }
    if !unavailable.is_empty() {
        lines.push(UNAVAILABLE_HEADER.to_string());
        for (code, name, reason) in unavailable {
            let mut s = String::new();
            let _ = writeln!(s, "• {} ({})\n  {}", name, code, clip(reason, MAX_REASON_CHARS));
            lines.push(s);
        }
    }

    let msg = lines.join("\n");
    if msg.chars().count() > MAX_MESSAGE_CHARS {
        clip(&msg, MAX_MESSAGE_CHARS - 1)
    } else {
        msg
    }
}
