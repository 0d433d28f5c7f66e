// ===============================
// src/runner.rs
// ===============================
//
// Satu siklus check-and-notify:
//   load state -> (fetch -> evaluate) per fund, urut sesuai watchlist
//   -> compose pesan -> save state -> send
//
// State disimpan sebelum kirim pesan: kalau Telegram down, hasil evaluasi
// run ini tetap tersimpan (proses tetap exit non-zero).
//

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::{FundConfig, FundOutcome, FundStatus};
use crate::drawdown;
use crate::error::{FundError, RunError};
use crate::feed::NavSource;
use crate::notifier::Notifier;
use crate::report;
use crate::state::StateStore;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub triggered: usize,
    pub not_triggered: usize,
    pub unavailable: usize,
    pub message: String,
}

pub struct Runner<'a, S: NavSource, N: Notifier> {
    funds: &'a [FundConfig],
    source: &'a S,
    notifier: &'a N,
    store: &'a StateStore,
    fail_fast: bool,
}

impl<'a, S: NavSource, N: Notifier> Runner<'a, S, N> {
    pub fn new(funds: &'a [FundConfig], source: &'a S, notifier: &'a N, store: &'a StateStore) -> Self {
        Self { funds, source, notifier, store, fail_fast: false }
    }

    /// Abort the whole run on the first fund failure instead of reporting it as unavailable.
    pub fn fail_fast(mut self, on: bool) -> Self {
        self.fail_fast = on;
        self
    }

    async fn check_fund(&self, fund: &FundConfig, today: NaiveDate) -> Result<FundStatus, FundError> {
        let series = self.source.fetch_history(&fund.code).await?;
        Ok(drawdown::evaluate(fund, &series, today)?)
    }

    pub async fn run_once(&self, today: NaiveDate) -> Result<RunSummary, RunError> {
        let prior = self.store.load()?;

        let mut outcomes: Vec<FundOutcome> = Vec::with_capacity(self.funds.len());
        let mut next_state: Vec<(String, bool)> = Vec::with_capacity(self.funds.len());

        for fund in self.funds {
            match self.check_fund(fund, today).await {
                Ok(st) => {
                    info!(
                        code = %st.code,
                        nav_date = %st.latest_date,
                        latest = %st.latest_nav,
                        high_52w = %st.high_52w,
                        drawdown_pct = %st.drawdown_pct.round_dp(2),
                        threshold = %st.threshold,
                        triggered = st.triggered,
                        "fund evaluated"
                    );
                    next_state.push((fund.code.clone(), st.triggered));
                    outcomes.push(FundOutcome::Evaluated(st));
                }
                Err(e) if self.fail_fast => {
                    return Err(RunError::Fund { code: fund.code.clone(), source: e });
                }
                Err(e) => {
                    // No decision this run: keep whatever the last run said.
                    let kept = prior.get(&fund.code).copied().unwrap_or(false);
                    warn!(code = %fund.code, error = %e, kept_alerted = kept, "fund unavailable");
                    next_state.push((fund.code.clone(), kept));
                    outcomes.push(FundOutcome::Unavailable {
                        code: fund.code.clone(),
                        name: fund.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let dropped = prior
            .keys()
            .filter(|code| !self.funds.iter().any(|f| &f.code == *code))
            .count();
        if dropped > 0 {
            info!(dropped, "state entries for funds no longer on the watchlist removed");
        }

        let message = report::compose(today, &outcomes);
        let summary = summarize(&outcomes, message);

        self.store.save(&next_state)?;
        self.notifier.send(&summary.message).await?;

        info!(
            triggered = summary.triggered,
            not_triggered = summary.not_triggered,
            unavailable = summary.unavailable,
            "run complete"
        );
        Ok(summary)
    }
}

fn summarize(outcomes: &[FundOutcome], message: String) -> RunSummary {
    let mut s = RunSummary { triggered: 0, not_triggered: 0, unavailable: 0, message };
    for o in outcomes {
        match o {
            FundOutcome::Evaluated(st) if st.triggered => s.triggered += 1,
            FundOutcome::Evaluated(_) => s.not_triggered += 1,
            FundOutcome::Unavailable { .. } => s.unavailable += 1,
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use ahash::AHashMap as HashMap;
    use async_trait::async_trait;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::domain::NavPoint;
    use crate::error::{FetchError, NotifyError};
    use crate::report::{NOT_TRIGGERED_HEADER, TRIGGERED_HEADER, UNAVAILABLE_HEADER};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    /// In-memory NAV source; codes without a series fail with MissingData.
    #[derive(Default)]
    struct FakeSource {
        series: HashMap<String, Vec<NavPoint>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with(mut self, code: &str, points: &[(i64, Decimal)]) -> Self {
            let pts = points
                .iter()
                .map(|(days_ago, nav)| NavPoint { date: today() - Duration::days(*days_ago), nav: *nav })
                .collect();
            self.series.insert(code.to_string(), pts);
            self
        }
    }

    #[async_trait]
    impl NavSource for FakeSource {
        async fn fetch_history(&self, code: &str) -> Result<Vec<NavPoint>, FetchError> {
            self.calls.lock().unwrap().push(code.to_string());
            self.series.get(code).cloned().ok_or(FetchError::MissingData)
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn send(&self, message: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected("chat not found".to_string()));
            }
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn fund(code: &str, name: &str, threshold: Decimal) -> FundConfig {
        FundConfig { code: code.into(), name: name.into(), threshold }
    }

    fn temp_store(test_name: &str) -> (PathBuf, StateStore) {
        let dir = std::env::temp_dir().join(format!("mf_alert_runner_{}_{}", test_name, uuid::Uuid::new_v4()));
        let store = StateStore::new(dir.join("state.csv"));
        (dir, store)
    }

    fn dip_series() -> [(i64, Decimal); 2] {
        [(0, dec!(90)), (200, dec!(100))]
    }

    #[tokio::test]
    async fn single_fund_scenarios() {
        for (threshold, expect) in [(dec!(8), true), (dec!(11), false), (dec!(10), true)] {
            let (dir, store) = temp_store("scenario");
            let funds = vec![fund("150797", "WhiteOak", threshold)];
            let source = FakeSource::default().with("150797", &dip_series());
            let notifier = FakeNotifier::default();

            let summary = Runner::new(&funds, &source, &notifier, &store)
                .run_once(today())
                .await
                .unwrap();

            assert_eq!(summary.triggered, usize::from(expect), "threshold {threshold}");
            assert_eq!(summary.not_triggered, usize::from(!expect));
            assert_eq!(store.load().unwrap().get("150797"), Some(&expect));
            assert!(summary.message.contains("(10.00%)"));

            std::fs::remove_dir_all(&dir).unwrap();
        }
    }

    #[tokio::test]
    async fn two_funds_split_into_sections() {
        let (dir, store) = temp_store("sections");
        let funds = vec![fund("1", "Alpha Fund", dec!(8)), fund("2", "Beta Fund", dec!(15))];
        let source = FakeSource::default()
            .with("1", &dip_series())
            .with("2", &dip_series());
        let notifier = FakeNotifier::default();

        Runner::new(&funds, &source, &notifier, &store).run_once(today()).await.unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let msg = &sent[0];
        let t = msg.find(TRIGGERED_HEADER).unwrap();
        let n = msg.find(NOT_TRIGGERED_HEADER).unwrap();
        assert!(t < n);
        assert!(msg[t..n].contains("Alpha Fund") && !msg[t..n].contains("Beta Fund"));
        assert!(msg[n..].contains("Beta Fund") && !msg[n..].contains("Alpha Fund"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn state_is_overwritten_every_run() {
        let (dir, store) = temp_store("overwrite");
        // prior run: 1 was alerted, 2 was not, 9 is no longer watched
        store
            .save(&[("1".to_string(), true), ("2".to_string(), false), ("9".to_string(), true)])
            .unwrap();

        let funds = vec![fund("1", "Alpha", dec!(50)), fund("2", "Beta", dec!(5))];
        let source = FakeSource::default().with("1", &dip_series()).with("2", &dip_series());
        let notifier = FakeNotifier::default();

        Runner::new(&funds, &source, &notifier, &store).run_once(today()).await.unwrap();

        let state = store.load().unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state.get("1"), Some(&false));
        assert_eq!(state.get("2"), Some(&true));

        // same data again: still triggered, no suppression of repeats
        Runner::new(&funds, &source, &notifier, &store).run_once(today()).await.unwrap();
        assert_eq!(store.load().unwrap().get("2"), Some(&true));
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn funds_are_fetched_in_watchlist_order() {
        let (dir, store) = temp_store("order");
        let funds = vec![fund("c", "C", dec!(5)), fund("a", "A", dec!(5)), fund("b", "B", dec!(5))];
        let source = FakeSource::default()
            .with("a", &dip_series())
            .with("b", &dip_series())
            .with("c", &dip_series());
        let notifier = FakeNotifier::default();

        Runner::new(&funds, &source, &notifier, &store).run_once(today()).await.unwrap();

        assert_eq!(*source.calls.lock().unwrap(), vec!["c", "a", "b"]);
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "code,alerted\nc,true\na,true\nb,true\n");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn failing_fund_is_reported_unavailable() {
        let (dir, store) = temp_store("isolate");
        store.save(&[("bad".to_string(), true)]).unwrap();

        let funds = vec![
            fund("good", "Good Fund", dec!(8)),
            fund("bad", "Broken Feed Fund", dec!(8)),
            fund("stale", "Stale Fund", dec!(8)),
        ];
        let source = FakeSource::default()
            .with("good", &dip_series())
            .with("stale", &[(400, dec!(10))]);
        let notifier = FakeNotifier::default();

        let summary = Runner::new(&funds, &source, &notifier, &store).run_once(today()).await.unwrap();

        assert_eq!(summary.triggered, 1);
        assert_eq!(summary.unavailable, 2);
        let un = &summary.message[summary.message.find(UNAVAILABLE_HEADER).unwrap()..];
        assert!(un.contains("Broken Feed Fund"));
        assert!(un.contains("Stale Fund"));
        assert!(un.contains("insufficient data"));

        let state = store.load().unwrap();
        assert_eq!(state.len(), 3);
        assert_eq!(state.get("good"), Some(&true));
        assert_eq!(state.get("bad"), Some(&true)); // kept from prior run
        assert_eq!(state.get("stale"), Some(&false));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn fail_fast_aborts_without_side_effects() {
        let (dir, store) = temp_store("failfast");
        store.save(&[("good".to_string(), false)]).unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();

        let funds = vec![fund("good", "Good", dec!(8)), fund("bad", "Bad", dec!(8))];
        let source = FakeSource::default().with("good", &dip_series());
        let notifier = FakeNotifier::default();

        let err = Runner::new(&funds, &source, &notifier, &store)
            .fail_fast(true)
            .run_once(today())
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Fund { ref code, .. } if code == "bad"));
        assert!(notifier.sent.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn notify_failure_still_persists_state() {
        let (dir, store) = temp_store("notifyfail");
        let funds = vec![fund("1", "Alpha", dec!(8))];
        let source = FakeSource::default().with("1", &dip_series());
        let notifier = FakeNotifier { fail: true, ..Default::default() };

        let err = Runner::new(&funds, &source, &notifier, &store)
            .run_once(today())
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Notify(NotifyError::Rejected(_))));
        assert_eq!(store.load().unwrap().get("1"), Some(&true));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
