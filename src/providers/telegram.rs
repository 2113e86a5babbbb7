use crate::core::config::TelegramSettings;
use crate::core::notify::Notifier;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, instrument};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Posts each report as a separate Telegram message.
pub struct TelegramNotifier {
    client: reqwest::Client,
    settings: TelegramSettings,
}

impl TelegramNotifier {
    pub fn new(client: reqwest::Client, settings: TelegramSettings) -> Self {
        Self { client, settings }
    }

    async fn send(&self, text: &str) -> Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.bot_token
        );
        let payload = SendMessage {
            chat_id: &self.settings.chat_id,
            text,
        };

        self.client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .context("Telegram sendMessage failed")?;
        debug!(chars = text.len(), "Sent Telegram message");
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    #[instrument(skip_all, fields(chat_id = %self.settings.chat_id))]
    async fn notify(&self, daily: &str, monthly: Option<&str>) -> Result<()> {
        self.send(daily).await?;
        if let Some(monthly) = monthly {
            self.send(monthly).await?;
        }
        info!("Delivered reports to Telegram");
        Ok(())
    }
}
