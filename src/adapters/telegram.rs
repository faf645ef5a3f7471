//! Telegram Bot API notifications
//!
//! Sends alert notifications to a configured chat. Credentials come from
//! the environment; without them the pipeline falls back to log-only
//! notifications.

use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Telegram notification client
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    token: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    /// Create a notifier from TELEGRAM_BOT_TOKEN / TELEGRAM_CHAT_ID
    pub fn from_env() -> Option<Arc<Self>> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        let chat_id = std::env::var("TELEGRAM_CHAT_ID").ok()?;
        if token.trim().is_empty() || chat_id.trim().is_empty() {
            return None;
        }
        info!("Telegram notifications enabled");
        Some(Arc::new(Self::new(token, chat_id)))
    }

    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            client: Client::new(),
            token,
            chat_id,
        }
    }

    /// Send a text message to the configured chat
    pub async fn send_message(&self, text: &str) -> Result<(), String> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
        };

        match self.client.post(&url).json(&payload).send().await {
            Ok(resp) => {
                if resp.status().is_success() {
                    debug!("Telegram notification sent successfully");
                    Ok(())
                } else {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    error!("Telegram notification failed: {} - {}", status, body);
                    Err(format!("HTTP {}: {}", status, body))
                }
            }
            Err(e) => {
                error!("Telegram request failed: {}", e);
                Err(e.to_string())
            }
        }
    }
}
