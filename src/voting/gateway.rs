//! Gate in front of the vote ledger.
//!
//! [`VoteGateway`] owns the process-wide [`WindowState`] and the
//! [`VoteLedger`]. Toggles are only forwarded while the window is open. The
//! window lock is always taken before the ledger lock, and neither is held
//! across an `.await`.

use crate::voting::ChatId;
use crate::voting::identity::Voter;
use crate::voting::ledger::{Choice, VoteLedger};
use chrono::NaiveDate;
use std::sync::{Mutex, MutexGuard};

/// Message shown to a voter who presses a button outside the window.
pub const VOTING_CLOSED_MESSAGE: &str = "Voting is closed for today 🕒";

/// Gate position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Open,
    Closed,
}

/// Window bookkeeping shared between the scheduler and the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowState {
    pub is_open: bool,
    /// Local date of the most recent successful open.
    pub last_opened: Option<NaiveDate>,
}

/// A toggle refused because the window is closed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", VOTING_CLOSED_MESSAGE)]
pub struct VoteRejected;

impl VoteRejected {
    pub fn user_message(&self) -> &'static str {
        VOTING_CLOSED_MESSAGE
    }
}

/// An accepted toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggled {
    /// Tally rendered right after the toggle.
    pub tally: String,
    /// `false` when the voter already held the chosen answer.
    pub changed: bool,
}

#[derive(Debug, Default)]
pub struct VoteGateway {
    window: Mutex<WindowState>,
    ledger: Mutex<VoteLedger>,
}

impl VoteGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        if self.lock_window().is_open {
            GateState::Open
        } else {
            GateState::Closed
        }
    }

    /// Snapshot of the window bookkeeping.
    pub fn window(&self) -> WindowState {
        self.lock_window().clone()
    }

    /// Apply a toggle if the gate is open and return the re-rendered tally.
    ///
    /// # Errors
    ///
    /// Returns [`VoteRejected`] without touching the ledger while closed.
    pub fn toggle(
        &self,
        chat: ChatId,
        voter: &Voter,
        choice: Choice,
    ) -> Result<Toggled, VoteRejected> {
        let window = self.lock_window();
        if !window.is_open {
            return Err(VoteRejected);
        }
        let mut ledger = self.lock_ledger();
        let changed = ledger.toggle(chat, voter, choice);
        Ok(Toggled {
            tally: ledger.render_tally(chat),
            changed,
        })
    }

    /// Current tally for `chat`, regardless of gate state.
    pub fn summary(&self, chat: ChatId) -> String {
        self.lock_ledger().render_tally(chat)
    }

    /// Run `f` against the ledger under its lock.
    pub fn with_ledger<R>(&self, f: impl FnOnce(&VoteLedger) -> R) -> R {
        f(&self.lock_ledger())
    }

    /// Open the gate for `today` and reset `chat`'s votes.
    ///
    /// Returns `false`, changing nothing, when the gate was already opened on
    /// `today`.
    pub(crate) fn open_for_day(&self, today: NaiveDate, chat: ChatId) -> bool {
        let mut window = self.lock_window();
        if window.last_opened == Some(today) {
            return false;
        }
        window.last_opened = Some(today);
        window.is_open = true;
        self.lock_ledger().clear(chat);
        true
    }

    /// Close the gate and return `chat`'s final tally, or `None` if it was
    /// already closed.
    pub(crate) fn close(&self, chat: ChatId) -> Option<String> {
        let mut window = self.lock_window();
        if !window.is_open {
            return None;
        }
        window.is_open = false;
        Some(self.lock_ledger().render_tally(chat))
    }

    fn lock_window(&self) -> MutexGuard<'_, WindowState> {
        self.window.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_ledger(&self) -> MutexGuard<'_, VoteLedger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }
}
