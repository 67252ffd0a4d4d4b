//! Validation of raw updates into typed inbound events.

use crate::voting::{Actor, ChatId, Choice, Voter};
use serde::Deserialize;

/// A text message posted in a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub chat_id: ChatId,
    pub sender: Voter,
    pub text: String,
}

/// A press on one of the poll buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteToggle {
    pub chat_id: ChatId,
    pub sender: Voter,
    pub interaction_id: String,
    pub choice: Choice,
    /// Message the buttons belong to.
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Message(ChatMessage),
    Toggle(VoteToggle),
}

/// An update the dispatcher cannot act on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedEvent {
    #[error("update body does not decode: {0}")]
    Undecodable(String),
    #[error("update is missing `{0}`")]
    MissingField(&'static str),
    #[error("unknown toggle payload `{0}`")]
    UnknownChoice(String),
}

#[derive(Deserialize)]
struct UpdateBody {
    #[serde(default)]
    message: Option<MessageBody>,
    #[serde(default)]
    callback_query: Option<CallbackBody>,
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message_id: Option<i64>,
    #[serde(default)]
    from: Option<Actor>,
    #[serde(default)]
    chat: Option<ChatBody>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChatBody {
    id: ChatId,
}

#[derive(Deserialize)]
struct CallbackBody {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    from: Option<Actor>,
    #[serde(default)]
    message: Option<MessageBody>,
    #[serde(default)]
    data: Option<String>,
}

impl InboundEvent {
    /// Validate an update body.
    ///
    /// Returns `Ok(None)` for update kinds the bot does not handle.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedEvent`] when a handled kind lacks a required field.
    pub fn parse(body: &serde_json::Value) -> Result<Option<Self>, MalformedEvent> {
        let update = UpdateBody::deserialize(body)
            .map_err(|e| MalformedEvent::Undecodable(e.to_string()))?;

        if let Some(message) = update.message {
            let chat = message.chat.ok_or(MalformedEvent::MissingField("message.chat"))?;
            return Ok(Some(Self::Message(ChatMessage {
                chat_id: chat.id,
                sender: Voter::from_actor(message.from.as_ref()),
                text: message.text.unwrap_or_default(),
            })));
        }

        if let Some(callback) = update.callback_query {
            let interaction_id = callback
                .id
                .ok_or(MalformedEvent::MissingField("callback_query.id"))?;
            let message = callback
                .message
                .ok_or(MalformedEvent::MissingField("callback_query.message"))?;
            let chat = message
                .chat
                .ok_or(MalformedEvent::MissingField("callback_query.message.chat"))?;
            let message_id = message
                .message_id
                .ok_or(MalformedEvent::MissingField("callback_query.message.message_id"))?;
            let data = callback
                .data
                .ok_or(MalformedEvent::MissingField("callback_query.data"))?;
            let choice = Choice::from_payload(&data).ok_or(MalformedEvent::UnknownChoice(data))?;

            return Ok(Some(Self::Toggle(VoteToggle {
                chat_id: chat.id,
                sender: Voter::from_actor(callback.from.as_ref()),
                interaction_id,
                choice,
                message_id,
            })));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use serde_json::json;

    #[test]
    fn parses_text_message() {
        let body = json!({
            "update_id": 5,
            "message": {
                "message_id": 10,
                "from": {"id": 1, "first_name": "Alice"},
                "chat": {"id": -100},
                "text": "/summary"
            }
        });
        let event = InboundEvent::parse(&body).unwrap().unwrap();
        assert_eq!(
            event,
            InboundEvent::Message(ChatMessage {
                chat_id: -100,
                sender: Voter::new("Alice"),
                text: "/summary".to_owned(),
            })
        );
    }

    #[test]
    fn message_without_text_has_empty_text() {
        let body = json!({"message": {"chat": {"id": 3}, "photo": []}});
        let Some(InboundEvent::Message(message)) = InboundEvent::parse(&body).unwrap() else {
            panic!("expected message");
        };
        assert!(message.text.is_empty());
        assert_eq!(message.sender, Voter::new("Unknown"));
    }

    #[test]
    fn parses_toggle() {
        let body = json!({
            "callback_query": {
                "id": "cb-1",
                "from": {"id": 2, "username": "bob"},
                "message": {"message_id": 44, "chat": {"id": -100}},
                "data": "no"
            }
        });
        let event = InboundEvent::parse(&body).unwrap().unwrap();
        assert_eq!(
            event,
            InboundEvent::Toggle(VoteToggle {
                chat_id: -100,
                sender: Voter::new("@bob"),
                interaction_id: "cb-1".to_owned(),
                choice: Choice::No,
                message_id: 44,
            })
        );
    }

    #[test]
    fn unknown_payload_is_malformed() {
        let body = json!({
            "callback_query": {
                "id": "cb-1",
                "message": {"message_id": 44, "chat": {"id": 1}},
                "data": "maybe"
            }
        });
        assert_eq!(
            InboundEvent::parse(&body),
            Err(MalformedEvent::UnknownChoice("maybe".to_owned()))
        );
    }

    #[test]
    fn toggle_without_message_is_malformed() {
        let body = json!({"callback_query": {"id": "cb-1", "data": "yes"}});
        assert_eq!(
            InboundEvent::parse(&body),
            Err(MalformedEvent::MissingField("callback_query.message"))
        );
    }

    #[test]
    fn message_without_chat_is_malformed() {
        let body = json!({"message": {"text": "/start"}});
        assert_eq!(
            InboundEvent::parse(&body),
            Err(MalformedEvent::MissingField("message.chat"))
        );
    }

    #[test]
    fn wrongly_typed_fields_are_undecodable() {
        let body = json!({"message": {"chat": {"id": "not-a-number"}}});
        assert!(matches!(
            InboundEvent::parse(&body),
            Err(MalformedEvent::Undecodable(_))
        ));
    }

    #[test]
    fn other_update_kinds_are_ignored() {
        let body = json!({"update_id": 9, "edited_message": {"chat": {"id": 1}}});
        assert_eq!(InboundEvent::parse(&body), Ok(None));
    }
}
