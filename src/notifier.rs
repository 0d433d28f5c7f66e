// ===============================
// src/notifier.rs
// ===============================
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::TelegramCfg;
use crate::error::NotifyError;
use crate::report::{clip, MAX_REASON_CHARS};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TelegramReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API `sendMessage`. No retry: a failure goes back to the runner.
pub struct TelegramNotifier {
    http: reqwest::Client,
    cfg: TelegramCfg,
}

impl TelegramNotifier {
    pub fn new(cfg: TelegramCfg, timeout: Duration) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, cfg })
    }

    // token ada di path URL -> jangan pernah di-log
    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.cfg.api_url, self.cfg.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let body = SendMessage { chat_id: &self.cfg.chat_id, text: message };

        let rsp = self
            .http
            .post(self.send_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = rsp.status();
        let text = rsp.text().await.map_err(|e| NotifyError::Http(e.without_url()))?;
        if !status.is_success() {
            let body = clip(&text, MAX_REASON_CHARS);
            error!(%status, %body, "telegram send failed");
            return Err(NotifyError::Status { status: status.as_u16(), body });
        }

        // 2xx tanpa `ok: true` tidak dianggap terkirim
        match serde_json::from_str::<TelegramReply>(&text) {
            Ok(reply) if reply.ok => {
                info!(chat_id = %self.cfg.chat_id, chars = message.chars().count(), "telegram message sent");
                Ok(())
            }
            Ok(reply) => {
                let reason = reply.description.unwrap_or_else(|| "ok=false".to_string());
                error!(%reason, "telegram rejected message");
                Err(NotifyError::Rejected(reason))
            }
            Err(e) => {
                let body = clip(&text, MAX_REASON_CHARS);
                warn!(%status, %body, "telegram reply is not json");
                Err(NotifyError::Rejected(format!("unreadable reply ({e}): {body}")))
            }
        }
    }
}

/// Dry run: message only goes to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        info!("dry run, message not sent:\n{}", message);
        Ok(())
    }
}
