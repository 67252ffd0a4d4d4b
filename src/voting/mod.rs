//! Vote state: voter identity, the per-chat ledger, and the gate in front of it.

pub mod gateway;
pub mod identity;
pub mod ledger;

/// Chat identifier as issued by the chat platform.
pub type ChatId = i64;

pub use gateway::{GateState, Toggled, VoteGateway, VoteRejected, WindowState};
pub use identity::{Actor, Voter};
pub use ledger::{ChatVoteState, Choice, VoteLedger};
