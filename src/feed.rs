// ===============================
// src/feed.rs
// ===============================
//
// NAV history adapters:
// - NavSource     : trait dipakai runner (mudah diganti fake di test)
// - MfApiFeed     : mfapi.in REST, GET {base}/mf/{code}
//
// Payload contoh:
// {"meta":{"scheme_name":"..."},"data":[{"date":"17-10-2026","nav":"23.41200"}, ...],"status":"SUCCESS"}
//
// Notes:
// - `data` is most-recent-first, but callers must not rely on that.
// - NAV is parsed into Decimal straight from the text, never through f64.
//

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::NavPoint;
use crate::error::FetchError;
use crate::report::{clip, MAX_REASON_CHARS};

pub const DATE_FORMAT: &str = "%d-%m-%Y";

#[async_trait]
pub trait NavSource: Send + Sync {
    /// Full available NAV history for one fund.
    async fn fetch_history(&self, code: &str) -> Result<Vec<NavPoint>, FetchError>;
}

// ---- mfapi.in models ----
#[derive(Debug, Deserialize)]
struct MfApiResponse {
    #[serde(default)]
    meta: Option<MfApiMeta>,
    #[serde(default)]
    data: Option<Vec<MfApiNav>>,
}

#[derive(Debug, Deserialize)]
struct MfApiMeta {
    #[serde(default)]
    scheme_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MfApiNav {
    date: String,
    nav: RawNumber,
}

/// The source sends NAV as a string, but a bare JSON number is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Number(serde_json::Number),
}

impl RawNumber {
    fn to_decimal(&self) -> Result<Decimal, FetchError> {
        let s = match self {
            RawNumber::Text(s) => s.trim().to_string(),
            RawNumber::Number(n) => n.to_string(),
        };
        Decimal::from_str(&s)
            .or_else(|_| Decimal::from_scientific(&s))
            .map_err(|_| FetchError::BadNav(s))
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, FetchError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| FetchError::BadDate(s.to_string()))
}

/// Decode a raw mfapi.in body into NAV points (source order preserved).
pub fn parse_history(code: &str, body: &str) -> Result<Vec<NavPoint>, FetchError> {
    let rsp: MfApiResponse = serde_json::from_str(body)?;

    if let Some(name) = rsp.meta.as_ref().and_then(|m| m.scheme_name.as_deref()) {
        debug!(%code, scheme = %name, "scheme meta");
    }

    let data = rsp.data.ok_or(FetchError::MissingData)?;
    let mut out = Vec::with_capacity(data.len());
    for row in data {
        let date = parse_date(&row.date)?;
        let nav = row.nav.to_decimal()?;
        if nav <= Decimal::ZERO {
            // kadang sumber mengirim placeholder 0
            warn!(%code, %date, %nav, "non-positive nav dropped");
            continue;
        }
        out.push(NavPoint { date, nav });
    }
    Ok(out)
}

pub struct MfApiFeed {
    http: reqwest::Client,
    base_url: String,
}

impl MfApiFeed {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn history_url(&self, code: &str) -> String {
        format!("{}/mf/{}", self.base_url, code)
    }
}

#[async_trait]
impl NavSource for MfApiFeed {
    async fn fetch_history(&self, code: &str) -> Result<Vec<NavPoint>, FetchError> {
        let url = self.history_url(code);
        debug!(%url, "fetching nav history");

        let rsp = self.http.get(&url).send().await?;
        let status = rsp.status();
        let body = rsp.text().await?;
        if !status.is_success() {
            // error pages (Cloudflare HTML) end up in the summary, keep them short
            return Err(FetchError::Status { status: status.as_u16(), body: clip(&body, MAX_REASON_CHARS) });
        }

        let points = parse_history(code, &body)?;
        debug!(%code, points = points.len(), "nav history received");
        Ok(points)
    }
}
