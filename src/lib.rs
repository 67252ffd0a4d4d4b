//! Lunchbot: a weekday lunch poll for a Telegram group.
//!
//! Each business day the bot posts a poll with "yes" and "no" buttons into a
//! target chat, records who is going while the voting window is open, and
//! posts the final tally when the window closes.
//!
//! # Architecture
//!
//! Two long-running tasks share one [`voting::VoteGateway`]:
//! - **Scheduler**: opens and closes the window at fixed local times
//! - **Dispatcher**: long-polls for updates and routes commands and votes
//!
//! Transport is behind the [`channels::NotificationSink`] and
//! [`channels::EventSource`] traits, implemented for the Telegram Bot API by
//! [`channels::TelegramClient`].

pub mod channels;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod liveness;
pub mod scheduler;
pub mod voting;

#[cfg(test)]
mod test_utils;

pub use config::BotConfig;
pub use dispatcher::EventDispatcher;
pub use error::{BotError, Result};
pub use scheduler::WindowScheduler;
pub use voting::VoteGateway;
