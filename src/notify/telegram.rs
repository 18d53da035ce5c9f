//! Telegram Bot API messenger
//!
//! Text goes through `sendMessage`, artifacts through `sendDocument`
//! multipart uploads. A non-2xx response is a delivery failure carrying the
//! response body.

use std::path::Path;

use async_trait::async_trait;
use serde_json::json;

use super::errors::{NotifyError, NotifyResult};
use super::Messenger;

const API_BASE: &str = "https://api.telegram.org";

/// Messenger backed by a Telegram bot.
pub struct TelegramMessenger {
    http: reqwest::Client,
    token: String,
}

impl TelegramMessenger {
    pub fn new(token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            token,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{API_BASE}/bot{}/{method}", self.token)
    }

    async fn check(&self, response: reqwest::Response) -> NotifyResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Delivery(format!("HTTP {status}: {body}")))
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: i64, text: &str) -> NotifyResult<()> {
        let response = self
            .http
            .post(self.endpoint("sendMessage"))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        self.check(response).await
    }

    async fn send_file(&self, chat_id: i64, path: &Path, caption: &str) -> NotifyResult<()> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| NotifyError::FileUnreadable {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());

        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part(
                "document",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let response = self
            .http
            .post(self.endpoint("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        self.check(response).await
    }
}
