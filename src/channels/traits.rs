use crate::voting::{ChatId, Choice};
use async_trait::async_trait;

/// One inline button under a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceButton {
    pub label: String,
    pub payload: String,
}

/// A single row of buttons attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceButtons {
    pub buttons: Vec<ChoiceButton>,
}

impl ChoiceButtons {
    /// The Yes/No pair attached to the daily poll.
    pub fn vote() -> Self {
        Self {
            buttons: vec![
                ChoiceButton {
                    label: "🍽 Yes".to_owned(),
                    payload: Choice::Yes.payload().to_owned(),
                },
                ChoiceButton {
                    label: "🚫 No".to_owned(),
                    payload: Choice::No.payload().to_owned(),
                },
            ],
        }
    }
}

/// Reference to a notification that was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHandle {
    pub chat_id: ChatId,
    pub message_id: i64,
}

/// Inbound update as fetched, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUpdate {
    pub update_id: i64,
    pub body: serde_json::Value,
}

/// Outbound notification transport.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Post a new message to `chat`.
    async fn send_notification(
        &self,
        chat: ChatId,
        text: &str,
        buttons: Option<&ChoiceButtons>,
    ) -> anyhow::Result<MessageHandle>;

    /// Replace the text (and buttons) of an existing message.
    async fn edit_notification(
        &self,
        chat: ChatId,
        message_id: i64,
        text: &str,
        buttons: Option<&ChoiceButtons>,
    ) -> anyhow::Result<()>;

    /// Answer a button press, optionally with visible text.
    async fn acknowledge_interaction(
        &self,
        interaction_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> anyhow::Result<()>;
}

/// Inbound update transport.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch updates with id `>= cursor`, waiting up to `wait_secs` for one to arrive.
    async fn fetch_events(&self, cursor: i64, wait_secs: u32) -> anyhow::Result<Vec<RawUpdate>>;
}
