//! Inbound update loop.
//!
//! [`EventDispatcher`] long-polls the [`EventSource`], validates each update
//! into an [`InboundEvent`], and routes it to the command handler or the vote
//! toggle handler. The cursor is advanced before an update is handled, so a
//! failing handler never causes the same update to be fetched again.

use crate::channels::{
    ChatMessage, ChoiceButtons, EventSource, InboundEvent, NotificationSink, RawUpdate, VoteToggle,
};
use crate::scheduler::DailyWindow;
use crate::voting::{ChatId, VoteGateway};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Upper bound on the pause between failed fetches.
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// Text commands understood in any chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    ChatId,
    Summary,
}

impl Command {
    /// Parse the leading command word, accepting a `@botname` suffix.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word);
        match name {
            "/start" => Some(Self::Start),
            "/chatid" => Some(Self::ChatId),
            "/summary" => Some(Self::Summary),
            _ => None,
        }
    }
}

pub struct EventDispatcher {
    source: Arc<dyn EventSource>,
    sink: Arc<dyn NotificationSink>,
    gateway: Arc<VoteGateway>,
    window: DailyWindow,
    wait_secs: u32,
    cursor: i64,
}

impl EventDispatcher {
    pub fn new(
        source: Arc<dyn EventSource>,
        sink: Arc<dyn NotificationSink>,
        gateway: Arc<VoteGateway>,
        window: DailyWindow,
        wait_secs: u32,
    ) -> Self {
        Self {
            source,
            sink,
            gateway,
            window,
            wait_secs,
            cursor: 0,
        }
    }

    /// Next update id to fetch.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Fetch one batch and handle it. Returns the number of updates fetched.
    ///
    /// # Errors
    ///
    /// Returns the source's error when the fetch itself fails.
    pub async fn poll_once(&mut self) -> anyhow::Result<usize> {
        let updates = self.source.fetch_events(self.cursor, self.wait_secs).await?;
        let count = updates.len();
        self.process_batch(updates).await;
        Ok(count)
    }

    /// Handle `updates` in order.
    pub async fn process_batch(&mut self, updates: Vec<RawUpdate>) {
        for update in updates {
            self.cursor = self.cursor.max(update.update_id.saturating_add(1));

            match InboundEvent::parse(&update.body) {
                Ok(Some(InboundEvent::Message(message))) => self.handle_message(message).await,
                Ok(Some(InboundEvent::Toggle(toggle))) => self.handle_toggle(toggle).await,
                Ok(None) => debug!(update_id = update.update_id, "ignoring update"),
                Err(e) => warn!(update_id = update.update_id, "skipping malformed update: {e}"),
            }
        }
    }

    async fn handle_message(&self, message: ChatMessage) {
        let Some(command) = Command::parse(&message.text) else {
            return;
        };
        debug!(chat = message.chat_id, sender = %message.sender, ?command, "command");

        let text = match command {
            Command::Start => self.help_text(),
            Command::ChatId => format!("`{}`", message.chat_id),
            Command::Summary => self.gateway.summary(message.chat_id),
        };
        self.send(message.chat_id, &text).await;
    }

    async fn handle_toggle(&self, toggle: VoteToggle) {
        match self
            .gateway
            .toggle(toggle.chat_id, &toggle.sender, toggle.choice)
        {
            Ok(toggled) => {
                debug!(
                    chat = toggle.chat_id,
                    voter = %toggle.sender,
                    choice = %toggle.choice,
                    changed = toggled.changed,
                    "vote recorded"
                );
                // Telegram refuses an edit that leaves the text as it was.
                if toggled.changed {
                    if let Err(e) = self
                        .sink
                        .edit_notification(
                            toggle.chat_id,
                            toggle.message_id,
                            &toggled.tally,
                            Some(&ChoiceButtons::vote()),
                        )
                        .await
                    {
                        warn!("failed to update tally message: {e:#}");
                    }
                }
                self.acknowledge(&toggle.interaction_id, None).await;
            }
            Err(rejected) => {
                debug!(voter = %toggle.sender, "vote outside window");
                self.acknowledge(&toggle.interaction_id, Some(rejected.user_message()))
                    .await;
            }
        }
    }

    async fn acknowledge(&self, interaction_id: &str, alert: Option<&str>) {
        if let Err(e) = self
            .sink
            .acknowledge_interaction(interaction_id, alert, alert.is_some())
            .await
        {
            warn!("failed to acknowledge button press: {e:#}");
        }
    }

    async fn send(&self, chat: ChatId, text: &str) {
        if let Err(e) = self.sink.send_notification(chat, text, None).await {
            warn!(chat, "failed to send reply: {e:#}");
        }
    }

    fn help_text(&self) -> String {
        format!(
            "Hi! I’m the lunch bot.\n\
             I ask lunch questions Mon–Fri between {} and {}.\n\
             /summary – show today's votes\n\
             /chatid – show chat ID",
            self.window.open_time().format("%H:%M"),
            self.window.close_time().format("%H:%M"),
        )
    }

    /// Start the polling loop.
    ///
    /// Fetch errors are logged and retried. The first retry is immediate,
    /// later ones back off exponentially up to [`MAX_RETRY_BACKOFF`].
    pub fn run(mut self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut failures: u32 = 0;
            loop {
                let result = tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = self.poll_once() => result,
                };

                match result {
                    Ok(_) => failures = 0,
                    Err(e) => {
                        failures = failures.saturating_add(1);
                        warn!(failures, "polling error: {e:#}");
                        let pause = retry_backoff(failures);
                        if !pause.is_zero() {
                            tokio::select! {
                                _ = cancel.cancelled() => break,
                                _ = tokio::time::sleep(pause) => {}
                            }
                        }
                    }
                }
            }
            debug!(cursor = self.cursor, "event dispatcher stopped");
        })
    }
}

/// Pause before the next fetch after `failures` consecutive failures.
fn retry_backoff(failures: u32) -> Duration {
    if failures <= 1 {
        return Duration::ZERO;
    }
    let exponent = (failures - 2).min(5);
    Duration::from_secs(1u64 << exponent).min(MAX_RETRY_BACKOFF)
}
