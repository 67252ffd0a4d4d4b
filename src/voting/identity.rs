//! Voter identity derived from the sender record of an inbound event.

use serde::Deserialize;
use std::fmt;

/// Sender record as delivered by the chat platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Actor {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Display identity a vote is recorded under.
///
/// Two events from the same person resolve to the same `Voter` as long as the
/// person's profile did not change in between.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Voter(String);

impl Voter {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Full name, else `@username`, else the numeric id. `Unknown` without an actor.
    pub fn from_actor(actor: Option<&Actor>) -> Self {
        let Some(actor) = actor else {
            return Self::new("Unknown");
        };

        let parts: Vec<&str> = [actor.first_name.as_deref(), actor.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        if !parts.is_empty() {
            return Self::new(parts.join(" "));
        }

        match actor.username.as_deref() {
            Some(username) if !username.is_empty() => Self::new(format!("@{username}")),
            _ => Self::new(actor.id.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Voter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
