use async_trait::async_trait;
use serde::Deserialize;

use crate::config::TelegramConfig;
use crate::error::NotifyError;

const TELEGRAM_API: &str = "https://api.telegram.org";

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce newly found projects by name.
    async fn notify(&self, names: &[String]) -> Result<(), NotifyError>;
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    config: TelegramConfig,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(client: reqwest::Client, config: TelegramConfig) -> Self {
        Self::with_api_base(client, config, TELEGRAM_API)
    }

    pub fn with_api_base(
        client: reqwest::Client,
        config: TelegramConfig,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.config.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, names: &[String]) -> Result<(), NotifyError> {
        let text = format_message(names);
        let res = self
            .client
            .get(self.endpoint())
            .query(&[
                ("chat_id", self.config.chat_id.as_str()),
                ("text", text.as_str()),
                ("parse_mode", "HTML"),
            ])
            .send()
            .await
            // reqwest errors carry the URL, which embeds the bot token
            .map_err(|e| NotifyError::Transport(e.without_url()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }

        let reply: TelegramResponse = res
            .json()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url()))?;
        if !reply.ok {
            let reason = reply.description.unwrap_or_else(|| "unknown".to_string());
            return Err(NotifyError::Rejected(reason));
        }

        Ok(())
    }
}

/// Render the alert body for Telegram's HTML parse mode.
pub fn format_message(names: &[String]) -> String {
    let mut text = String::from("🚨 <b>New Projects Found!</b>\n\n");
    for name in names {
        text.push_str("• ");
        text.push_str(&escape_html(name));
        text.push('\n');
    }
    text
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
