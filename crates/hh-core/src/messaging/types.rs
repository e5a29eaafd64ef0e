use crate::domain::{ChannelId, MessageId, MessageRef, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: String,
}

/// A message-create event as seen by the dispatcher.
///
/// Platform-specific fields stay in the adapter.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    /// Resolved from the adapter's local cache; `None` when not cached.
    pub channel_name: Option<String>,
    pub author: Author,
    pub content: String,
    /// The message this one replies to, when the platform delivered it.
    pub replied_to: Option<FetchedMessage>,
}

impl InboundMessage {
    pub fn msg_ref(&self) -> MessageRef {
        MessageRef {
            channel_id: self.channel_id,
            message_id: self.id,
        }
    }

    /// Channel label for logs and notices (`#name`, or `#<id>` if unknown).
    pub fn channel_label(&self) -> String {
        match &self.channel_name {
            Some(name) => format!("#{name}"),
            None => format!("#{}", self.channel_id),
        }
    }
}

/// A message returned by a history fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchedMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author: Author,
    pub content: String,
}

impl FetchedMessage {
    pub fn msg_ref(&self) -> MessageRef {
        MessageRef {
            channel_id: self.channel_id,
            message_id: self.id,
        }
    }
}
