//! Discord adapter (serenity).
//!
//! This crate implements the `hh-core` ChatGateway over Discord's HTTP API and
//! feeds gateway events into the core dispatcher.

use std::sync::Arc;

use async_trait::async_trait;

use serenity::{builder::GetMessages, http::Http, model::channel::Message};

pub mod router;

use hh_core::{
    domain::{ChannelId, MessageId, MessageRef, UserId},
    errors::Error,
    messaging::{
        port::ChatGateway,
        types::{Author, FetchedMessage, InboundMessage},
    },
    Result,
};

#[derive(Clone)]
pub struct DiscordGateway {
    http: Arc<Http>,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn dc_channel(channel_id: ChannelId) -> serenity::model::id::ChannelId {
        serenity::model::id::ChannelId::new(channel_id.0)
    }

    fn dc_msg_id(message_id: MessageId) -> serenity::model::id::MessageId {
        serenity::model::id::MessageId::new(message_id.0)
    }

    fn map_err(e: serenity::Error) -> Error {
        Error::External(format!("discord error: {e}"))
    }
}

#[async_trait]
impl ChatGateway for DiscordGateway {
    async fn send_message(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef> {
        let msg = Self::dc_channel(channel_id)
            .say(&*self.http, text)
            .await
            .map_err(Self::map_err)?;

        Ok(MessageRef {
            channel_id,
            message_id: MessageId(msg.id.get()),
        })
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        Self::dc_channel(msg.channel_id)
            .delete_message(&*self.http, Self::dc_msg_id(msg.message_id))
            .await
            .map_err(Self::map_err)
    }

    async fn fetch_recent(&self, channel_id: ChannelId, limit: u8) -> Result<Vec<FetchedMessage>> {
        let messages = Self::dc_channel(channel_id)
            .messages(&*self.http, GetMessages::new().limit(limit.clamp(1, 100)))
            .await
            .map_err(Self::map_err)?;

        Ok(messages.iter().map(to_fetched_message).collect())
    }

    async fn open_direct_channel(&self, user_id: UserId) -> Result<ChannelId> {
        let dm = serenity::model::id::UserId::new(user_id.0)
            .create_dm_channel(&*self.http)
            .await
            .map_err(Self::map_err)?;

        Ok(ChannelId(dm.id.get()))
    }
}

fn to_author(user: &serenity::model::user::User) -> Author {
    Author {
        id: UserId(user.id.get()),
        name: user.tag(),
    }
}

/// Convert a serenity `Message` into the core history model.
pub fn to_fetched_message(m: &Message) -> FetchedMessage {
    FetchedMessage {
        id: MessageId(m.id.get()),
        channel_id: ChannelId(m.channel_id.get()),
        author: to_author(&m.author),
        content: m.content.clone(),
    }
}

/// Convert a serenity message-create event into the dispatcher's model.
///
/// `channel_name` comes from the local cache so logging never costs a request.
pub fn to_inbound_message(m: &Message, channel_name: Option<String>) -> InboundMessage {
    InboundMessage {
        id: MessageId(m.id.get()),
        channel_id: ChannelId(m.channel_id.get()),
        channel_name,
        author: to_author(&m.author),
        content: m.content.clone(),
        replied_to: m.referenced_message.as_deref().map(to_fetched_message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: &str, username: &str) -> serde_json::Value {
        json!({
            "id": id,
            "username": username,
            "discriminator": "0001",
            "global_name": null,
            "avatar": null,
            "bot": false,
        })
    }

    fn message(id: &str, author: serde_json::Value, content: &str) -> serde_json::Value {
        json!({
            "id": id,
            "channel_id": "10",
            "author": author,
            "content": content,
            "timestamp": "2024-01-01T00:00:00.000000+00:00",
            "edited_timestamp": null,
            "tts": false,
            "mention_everyone": false,
            "mentions": [],
            "mention_roles": [],
            "attachments": [],
            "embeds": [],
            "pinned": false,
            "type": 0,
            "flags": 0,
        })
    }

    #[test]
    fn converts_plain_message() {
        let raw = message("2", user("100", "moderator"), "/d3 spam");
        let msg: Message = serde_json::from_value(raw).unwrap();

        let inbound = to_inbound_message(&msg, Some("convention-questions".to_string()));
        assert_eq!(inbound.id, MessageId(2));
        assert_eq!(inbound.channel_id, ChannelId(10));
        assert_eq!(inbound.author.id, UserId(100));
        assert!(inbound.author.name.starts_with("moderator"));
        assert_eq!(inbound.content, "/d3 spam");
        assert_eq!(inbound.channel_label(), "#convention-questions");
        assert!(inbound.replied_to.is_none());
    }

    #[test]
    fn reply_carries_referenced_message() {
        let offending = message("1", user("200", "member"), "is this a finesse?");
        let mut raw = message("2", user("100", "moderator"), "/d1");
        raw["type"] = json!(19);
        raw["message_reference"] = json!({ "message_id": "1", "channel_id": "10" });
        raw["referenced_message"] = offending;
        let msg: Message = serde_json::from_value(raw).unwrap();

        let inbound = to_inbound_message(&msg, None);
        assert_eq!(inbound.channel_label(), "#10");

        let replied = inbound.replied_to.expect("referenced message");
        assert_eq!(replied.id, MessageId(1));
        assert_eq!(replied.channel_id, ChannelId(10));
        assert_eq!(replied.author.id, UserId(200));
        assert_eq!(replied.content, "is this a finesse?");
        assert_eq!(
            replied.msg_ref(),
            MessageRef {
                channel_id: ChannelId(10),
                message_id: MessageId(1),
            }
        );
    }
}
