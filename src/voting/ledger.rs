//! Per-chat vote ledger and tally rendering.

use crate::voting::ChatId;
use crate::voting::identity::Voter;
use std::collections::HashMap;
use std::fmt;

/// Placeholder rendered for an empty roster.
const EMPTY_ROSTER: &str = "—";

/// The two answers a voter can give.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice {
    Yes,
    No,
}

impl Choice {
    /// Button payload carrying this choice.
    pub fn payload(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }

    /// Parse a button payload. Anything but `yes`/`no` is rejected.
    pub fn from_payload(payload: &str) -> Option<Self> {
        match payload {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.payload())
    }
}

/// Votes of one chat for the current day.
///
/// Each roster keeps voters in the order they last entered it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatVoteState {
    yes: Vec<Voter>,
    no: Vec<Voter>,
}

impl ChatVoteState {
    pub fn yes(&self) -> &[Voter] {
        &self.yes
    }

    pub fn no(&self) -> &[Voter] {
        &self.no
    }

    /// Returns `false` when the voter already held `choice`.
    fn toggle(&mut self, voter: &Voter, choice: Choice) -> bool {
        let (chosen, other) = match choice {
            Choice::Yes => (&mut self.yes, &mut self.no),
            Choice::No => (&mut self.no, &mut self.yes),
        };
        other.retain(|v| v != voter);
        if chosen.contains(voter) {
            return false;
        }
        chosen.push(voter.clone());
        true
    }

    fn clear(&mut self) {
        self.yes.clear();
        self.no.clear();
    }

    fn render(&self) -> String {
        format!(
            "🍽 *Lunch votes*\n\n✅ Going ({}): {}\n🚫 Not going ({}): {}",
            self.yes.len(),
            roster(&self.yes),
            self.no.len(),
            roster(&self.no),
        )
    }
}

fn roster(voters: &[Voter]) -> String {
    if voters.is_empty() {
        return EMPTY_ROSTER.to_owned();
    }
    voters
        .iter()
        .map(|v| escape_markdown(v.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Backslash-escape the characters that open an entity in Telegram's legacy
/// Markdown.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// In-memory vote state for every chat the bot has seen.
#[derive(Debug, Default)]
pub struct VoteLedger {
    chats: HashMap<ChatId, ChatVoteState>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create empty state for `chat` if none exists yet.
    pub fn ensure(&mut self, chat: ChatId) -> &mut ChatVoteState {
        self.chats.entry(chat).or_default()
    }

    /// Record `voter` under `choice`, removing them from the other roster.
    ///
    /// Returns whether the rosters changed.
    pub fn toggle(&mut self, chat: ChatId, voter: &Voter, choice: Choice) -> bool {
        self.ensure(chat).toggle(voter, choice)
    }

    /// Empty both rosters of `chat`.
    pub fn clear(&mut self, chat: ChatId) {
        self.ensure(chat).clear();
    }

    /// Render the tally for `chat`. Unknown chats render as empty.
    pub fn render_tally(&self, chat: ChatId) -> String {
        match self.chats.get(&chat) {
            Some(state) => state.render(),
            None => ChatVoteState::default().render(),
        }
    }

    /// Read-only view of `chat`'s state, if any votes were ever recorded.
    pub fn chat(&self, chat: ChatId) -> Option<&ChatVoteState> {
        self.chats.get(&chat)
    }

    pub fn yes_voters(&self, chat: ChatId) -> &[Voter] {
        self.chats.get(&chat).map(ChatVoteState::yes).unwrap_or_default()
    }

    pub fn no_voters(&self, chat: ChatId) -> &[Voter] {
        self.chats.get(&chat).map(ChatVoteState::no).unwrap_or_default()
    }
}
