//! Chat transport: the sink/source contracts, inbound event validation, and
//! the Telegram Bot API adapter.
//!
//! Voting logic never talks to Telegram directly. It only sees
//! [`NotificationSink`] and [`EventSource`], so it can be driven by in-memory
//! fakes in tests.

pub mod events;
pub mod telegram;
pub mod traits;

pub use events::{ChatMessage, InboundEvent, MalformedEvent, VoteToggle};
pub use telegram::TelegramClient;
pub use traits::{
    ChoiceButton, ChoiceButtons, EventSource, MessageHandle, NotificationSink, RawUpdate,
};
