// ===============================
// src/main.rs
// ===============================
/*
 cd /home/kukuhtw/rust/mf_drawdown_alert

 # dry run (tanpa Telegram), log lebih detail
 NOTIFY_MODE=log RUST_LOG=debug cargo run

 # cron harian jam 18:30 (setelah NAV dipublikasikan)
 30 18 * * 1-5  cd /opt/mf_drawdown_alert && ./mf_drawdown_alert >> run.log 2>&1
*/
/*
=============================================================================
Project : mf_drawdown_alert — mutual fund 52-week drawdown watcher in Rust
Module  : main.rs
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
mod domain;
mod error;
mod config;
mod feed;        // NAV history (mfapi.in)
mod drawdown;
mod state;       // CSV alert state
mod report;
mod notifier;    // Telegram / log
mod runner;
#[cfg(test)]
mod test_http;

use std::process::ExitCode;

use chrono::Local;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::NotifyMode;
use crate::error::RunError;
use crate::feed::MfApiFeed;
use crate::notifier::{LogNotifier, TelegramNotifier};
use crate::runner::{RunSummary, Runner};
use crate::state::StateStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // ---- Logging ----
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run().await {
        Ok(summary) => {
            if summary.triggered > 0 {
                info!(triggered = summary.triggered, "drawdown alerts raised");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<RunSummary, RunError> {
    // ---- Load config (fatal sebelum ada network / file write) ----
    let cfg = config::load()?;

    let store = StateStore::new(&cfg.state_file);

    info!(
        funds = cfg.funds.len(),
        notify_mode = %cfg.notify_mode.as_str(),
        mfapi = %cfg.mfapi_base_url,
        state_file = %store.path().display(),
        timeout_secs = cfg.http_timeout.as_secs(),
        fail_fast = cfg.fail_fast,
        "startup config"
    );

    let source = MfApiFeed::new(&cfg.mfapi_base_url, cfg.http_timeout)?;
    let today = Local::now().date_naive();

    match (&cfg.notify_mode, cfg.telegram.clone()) {
        (NotifyMode::Telegram, Some(tg)) => {
            let notifier = TelegramNotifier::new(tg, cfg.http_timeout)?;
            Runner::new(&cfg.funds, &source, &notifier, &store)
                .fail_fast(cfg.fail_fast)
                .run_once(today)
                .await
        }
        _ => {
            let notifier = LogNotifier;
            Runner::new(&cfg.funds, &source, &notifier, &store)
                .fail_fast(cfg.fail_fast)
                .run_once(today)
                .await
        }
    }
}
