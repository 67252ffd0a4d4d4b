//! Daily window loop.
//!
//! Spawns a tokio task that sleeps until the next open instant, opens the
//! poll, sleeps until the close instant, publishes the final tally, and
//! starts over for the following day. The task has no terminal state other
//! than cancellation.

use crate::channels::{ChoiceButtons, NotificationSink};
use crate::scheduler::calendar::{Clock, DailyWindow, SystemClock, delay_until, is_business_day};
use crate::voting::{ChatId, VoteGateway};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Text of the daily poll message.
pub const POLL_PROMPT: &str =
    "🍽 *Lunch check*\n\nWho is going to lunch today?\nTap a button below:";

/// Prefix of the message published at close.
pub const CLOSED_PREFIX: &str = "⏰ Voting is now closed.\n\n";

/// Result of an open attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    /// Saturday or Sunday in the window's offset.
    Weekend,
    AlreadyOpenedToday,
}

/// Drives the gate open and closed on the daily schedule.
pub struct WindowScheduler {
    window: DailyWindow,
    target_chat: ChatId,
    gateway: Arc<VoteGateway>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl WindowScheduler {
    pub fn new(
        window: DailyWindow,
        target_chat: ChatId,
        gateway: Arc<VoteGateway>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            window,
            target_chat,
            gateway,
            sink,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Open the poll for `now`'s local date unless it is a weekend or the
    /// poll was already opened that day.
    pub async fn try_open(&self, now: DateTime<Utc>) -> OpenOutcome {
        let today = self.window.local_date(now);
        if !is_business_day(today) {
            info!(%today, "weekend, no lunch poll today");
            return OpenOutcome::Weekend;
        }
        if !self.gateway.open_for_day(today, self.target_chat) {
            debug!(%today, "poll already opened today");
            return OpenOutcome::AlreadyOpenedToday;
        }

        info!(%today, chat = self.target_chat, "starting lunch poll");
        if let Err(e) = self
            .sink
            .send_notification(self.target_chat, POLL_PROMPT, Some(&ChoiceButtons::vote()))
            .await
        {
            warn!("failed to send lunch poll: {e:#}");
        }
        OpenOutcome::Opened
    }

    /// Close the poll and publish the final tally. Returns the tally, or
    /// `None` if voting was not open.
    pub async fn close(&self) -> Option<String> {
        let tally = self.gateway.close(self.target_chat)?;
        info!(chat = self.target_chat, "voting closed");

        let text = format!("{CLOSED_PREFIX}{tally}");
        if let Err(e) = self.sink.send_notification(self.target_chat, &text, None).await {
            warn!("failed to send final tally: {e:#}");
        }
        Some(tally)
    }

    /// Start the scheduler background loop.
    pub fn run(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let next_open = self.window.next_open_after(self.clock.now());
                info!(%next_open, "next poll scheduled");
                let wait = delay_until(self.clock.now(), next_open);
                if !sleep_or_cancel(wait, &cancel).await {
                    break;
                }
                self.try_open(self.clock.now()).await;

                let wait = self.window.close_delay(self.clock.now());
                if !sleep_or_cancel(wait, &cancel).await {
                    break;
                }
                self.close().await;
            }
            debug!("window scheduler stopped");
        })
    }
}

/// Sleep for `wait`. Returns `false` if `cancel` fired first.
async fn sleep_or_cancel(wait: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(wait) => true,
    }
}
