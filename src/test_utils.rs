//! Shared test doubles for the transport traits and the clock.

use crate::channels::{ChoiceButtons, EventSource, MessageHandle, NotificationSink, RawUpdate};
use crate::scheduler::calendar::Clock;
use crate::voting::ChatId;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

/// One call observed by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Send {
        chat: ChatId,
        text: String,
        buttons: Option<ChoiceButtons>,
    },
    Edit {
        chat: ChatId,
        message_id: i64,
        text: String,
        buttons: Option<ChoiceButtons>,
    },
    Ack {
        interaction_id: String,
        text: Option<String>,
        show_alert: bool,
    },
}

/// Sink that records every call, optionally failing them all.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    next_message_id: AtomicI64,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records calls and then reports each one as failed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Texts of `Send` calls, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SinkCall) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        if self.fail {
            anyhow::bail!("sink unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send_notification(
        &self,
        chat: ChatId,
        text: &str,
        buttons: Option<&ChoiceButtons>,
    ) -> anyhow::Result<MessageHandle> {
        self.record(SinkCall::Send {
            chat,
            text: text.to_owned(),
            buttons: buttons.cloned(),
        })?;
        Ok(MessageHandle {
            chat_id: chat,
            message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst) + 1,
        })
    }

    async fn edit_notification(
        &self,
        chat: ChatId,
        message_id: i64,
        text: &str,
        buttons: Option<&ChoiceButtons>,
    ) -> anyhow::Result<()> {
        self.record(SinkCall::Edit {
            chat,
            message_id,
            text: text.to_owned(),
            buttons: buttons.cloned(),
        })
    }

    async fn acknowledge_interaction(
        &self,
        interaction_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> anyhow::Result<()> {
        self.record(SinkCall::Ack {
            interaction_id: interaction_id.to_owned(),
            text: text.map(str::to_owned),
            show_alert,
        })
    }
}

/// Source that replays scripted batches, then reports errors once exhausted.
#[derive(Default)]
pub struct ScriptedSource {
    batches: Mutex<VecDeque<anyhow::Result<Vec<RawUpdate>>>>,
    cursors: Mutex<Vec<i64>>,
}

impl ScriptedSource {
    pub fn new(batches: Vec<anyhow::Result<Vec<RawUpdate>>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            cursors: Mutex::new(Vec::new()),
        }
    }

    /// Cursors passed to each fetch, in order.
    pub fn cursors(&self) -> Vec<i64> {
        self.cursors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn fetch_events(&self, cursor: i64, _wait_secs: u32) -> anyhow::Result<Vec<RawUpdate>> {
        self.cursors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(cursor);
        let next = self
            .batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(batch) => batch,
            None => {
                // Yield so a paused-time test can make progress.
                tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                anyhow::bail!("script exhausted")
            }
        }
    }
}

/// Clock that starts at `anchor` and follows tokio's (possibly paused) time.
pub struct TokioClock {
    anchor: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl TokioClock {
    pub fn starting_at(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.started.elapsed()).unwrap_or_default();
        self.anchor + elapsed
    }
}

/// Build a raw update from a JSON body, copying its `update_id`.
pub fn raw_update(update_id: i64, mut body: serde_json::Value) -> RawUpdate {
    if let Some(map) = body.as_object_mut() {
        map.insert("update_id".to_owned(), serde_json::json!(update_id));
    }
    RawUpdate { update_id, body }
}
