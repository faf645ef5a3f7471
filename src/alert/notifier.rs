//! Notification delivery seam
//!
//! The checker talks to a `Notifier` trait object so delivery channels can
//! be swapped (Telegram in production, a recorder in tests, logs when no
//! credentials are configured).

use crate::adapters::TelegramNotifier;
use crate::domain::Notification;
use crate::error::{AtlasError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Fallback channel: notifications land in the log stream only
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> Result<()> {
        info!(
            rule = %notification.rule_id,
            kind = ?notification.kind,
            severity = %notification.severity,
            "ALERT: {}",
            notification.render()
        );
        Ok(())
    }
}

#[async_trait]
impl Notifier for Arc<TelegramNotifier> {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, notification: &Notification) -> Result<()> {
        self.send_message(&notification.render())
            .await
            .map_err(AtlasError::Notification)
    }
}
