use crate::channels::traits::{
    ChoiceButtons, EventSource, MessageHandle, NotificationSink, RawUpdate,
};
use crate::config::TelegramConfig;
use crate::error::{BotError, Result};
use crate::voting::ChatId;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

/// Timeout for ordinary (non long-poll) API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Slack added on top of the long-poll wait before the HTTP request gives up.
const LONG_POLL_SLACK: Duration = Duration::from_secs(10);

/// Telegram Bot API adapter, used both as notification sink and update source.
#[derive(Clone)]
pub struct TelegramClient {
    bot_token: String,
    api_base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
    chat: SentChat,
}

#[derive(Deserialize)]
struct SentChat {
    id: ChatId,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at another API root (used against mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base_url, self.bot_token)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
        timeout: Duration,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(&params)
            .send()
            .await?;

        let envelope: ApiResponse<T> = response.json().await?;
        if !envelope.ok {
            return Err(BotError::Telegram {
                method: method.to_owned(),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_owned()),
            });
        }
        envelope.result.ok_or_else(|| BotError::Telegram {
            method: method.to_owned(),
            description: "response carried no result".to_owned(),
        })
    }

    /// `getUpdates` with the given offset and long-poll wait.
    pub async fn get_updates(&self, offset: i64, wait_secs: u32) -> Result<Vec<RawUpdate>> {
        let raw: Vec<serde_json::Value> = self
            .call(
                "getUpdates",
                json!({
                    "offset": offset,
                    "timeout": wait_secs,
                }),
                Duration::from_secs(u64::from(wait_secs)) + LONG_POLL_SLACK,
            )
            .await?;

        let mut updates = Vec::with_capacity(raw.len());
        for body in raw {
            match body.get("update_id").and_then(serde_json::Value::as_i64) {
                Some(update_id) => updates.push(RawUpdate { update_id, body }),
                None => tracing::warn!("dropping update without numeric update_id"),
            }
        }
        Ok(updates)
    }
}

fn reply_markup(buttons: &ChoiceButtons) -> serde_json::Value {
    let row: Vec<serde_json::Value> = buttons
        .buttons
        .iter()
        .map(|b| json!({"text": b.label, "callback_data": b.payload}))
        .collect();
    json!({ "inline_keyboard": [row] })
}

fn with_markup(
    mut params: serde_json::Value,
    buttons: Option<&ChoiceButtons>,
) -> serde_json::Value {
    if let (Some(buttons), Some(map)) = (buttons, params.as_object_mut()) {
        map.insert("reply_markup".to_owned(), reply_markup(buttons));
    }
    params
}

#[async_trait]
impl NotificationSink for TelegramClient {
    async fn send_notification(
        &self,
        chat: ChatId,
        text: &str,
        buttons: Option<&ChoiceButtons>,
    ) -> anyhow::Result<MessageHandle> {
        let params = with_markup(
            json!({
                "chat_id": chat,
                "text": text,
                "parse_mode": "Markdown",
            }),
            buttons,
        );
        let sent: SentMessage = self.call("sendMessage", params, REQUEST_TIMEOUT).await?;
        Ok(MessageHandle {
            chat_id: sent.chat.id,
            message_id: sent.message_id,
        })
    }

    async fn edit_notification(
        &self,
        chat: ChatId,
        message_id: i64,
        text: &str,
        buttons: Option<&ChoiceButtons>,
    ) -> anyhow::Result<()> {
        let params = with_markup(
            json!({
                "chat_id": chat,
                "message_id": message_id,
                "text": text,
                "parse_mode": "Markdown",
            }),
            buttons,
        );
        // Result is the edited message, or `true` for inline messages.
        let _: serde_json::Value = self.call("editMessageText", params, REQUEST_TIMEOUT).await?;
        Ok(())
    }

    async fn acknowledge_interaction(
        &self,
        interaction_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> anyhow::Result<()> {
        let mut params = json!({ "callback_query_id": interaction_id });
        if let (Some(text), Some(map)) = (text, params.as_object_mut()) {
            map.insert("text".to_owned(), json!(text));
            map.insert("show_alert".to_owned(), json!(show_alert));
        }
        let _: bool = self
            .call("answerCallbackQuery", params, REQUEST_TIMEOUT)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventSource for TelegramClient {
    async fn fetch_events(&self, cursor: i64, wait_secs: u32) -> anyhow::Result<Vec<RawUpdate>> {
        Ok(self.get_updates(cursor, wait_secs).await?)
    }
}
