use async_trait::async_trait;

use crate::{
    domain::{ChannelId, MessageRef, UserId},
    messaging::types::FetchedMessage,
    Result,
};

/// Outbound operations of the chat session.
///
/// The Discord adapter implements this over serenity's HTTP client; tests swap
/// in an in-memory fake. Calls are never retried here.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn send_message(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef>;

    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    /// Most recent messages in a channel, newest first.
    async fn fetch_recent(&self, channel_id: ChannelId, limit: u8) -> Result<Vec<FetchedMessage>>;

    /// Open (or reuse) the direct-message channel with a user.
    async fn open_direct_channel(&self, user_id: UserId) -> Result<ChannelId>;
}
