use std::{collections::BTreeMap, fs, path::Path};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    commands::{CommandContext, CommandHandler},
    errors::Error,
    moderation::MODERATION_COMMANDS,
    Result,
};

const WRONG_CHANNEL: &str = "It looks like you are asking a question about the Hyphen-ated \
    conventions or the Hyphen-ated group. Please put all such questions in the \
    #questions-and-help channel, as that's what it is for.";

const BAD_QUESTION: &str = "It looks like this question does not include enough information \
    to be answered. Please post the full game state (ideally a replay link with the turn \
    number) and explain what you think should happen and why.";

const BAD_HERE: &str = "Please do not use `@here` or `@everyone` in this server. Pinging the \
    whole server is reserved for the administrators.";

const TWO_PLAYER_QUESTION: &str = "Two-player games follow special conventions that are \
    documented separately. Please read the 2-player section of the docs before asking, and \
    mention that it is a 2-player game in your question.";

/// Literal replies keyed by command token (already normalized).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CannedReplies {
    entries: BTreeMap<String, String>,
}

impl Default for CannedReplies {
    fn default() -> Self {
        let entries = [
            ("wrongchannel", WRONG_CHANNEL),
            ("badquestion", BAD_QUESTION),
            ("badhere", BAD_HERE),
            ("2pquestion", TWO_PLAYER_QUESTION),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self { entries }
    }
}

impl CannedReplies {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add or replace a reply. Tokens are matched case-insensitively, so they
    /// are stored lower-cased.
    pub fn insert(&mut self, token: &str, text: &str) -> Result<()> {
        let token = token.trim().to_lowercase();
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!("invalid canned reply token: {token:?}")));
        }
        if MODERATION_COMMANDS.contains(&token.as_str()) {
            return Err(Error::Config(format!(
                "canned reply token {token:?} is reserved for moderation"
            )));
        }
        if text.trim().is_empty() {
            return Err(Error::Config(format!("canned reply for {token:?} is blank")));
        }
        self.entries.insert(token, text.to_string());
        Ok(())
    }

    /// Merge a JSON object (`{"token": "text", ...}`) over the current table.
    pub fn merge_json(&mut self, json: &str) -> Result<()> {
        let overrides: BTreeMap<String, String> = serde_json::from_str(json)?;
        for (token, text) in overrides {
            self.insert(&token, &text)?;
        }
        Ok(())
    }

    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let json = fs::read_to_string(path)?;
        self.merge_json(&json)
    }
}

/// Posts a fixed reply into the channel the command came from.
pub struct CannedReply {
    text: String,
}

impl CannedReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl CommandHandler for CannedReply {
    async fn handle(&self, ctx: CommandContext<'_>) {
        let channel_id = ctx.message.channel_id;
        match ctx.gateway.send_message(channel_id, &self.text).await {
            Ok(sent) => {
                debug!(channel = %channel_id, message = %sent.message_id, "sent canned reply")
            }
            // A single lost notice is acceptable; never retried.
            Err(e) => {
                warn!(channel = %channel_id, text = %self.text, "failed to send canned reply: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_known_tokens() {
        let replies = CannedReplies::default();
        for token in ["wrongchannel", "badquestion", "badhere", "2pquestion"] {
            assert!(replies.get(token).is_some(), "missing {token}");
        }
        assert!(replies
            .get("wrongchannel")
            .unwrap()
            .contains("#questions-and-help"));
    }

    #[test]
    fn json_overrides_are_lowercased_and_merged() {
        let mut replies = CannedReplies::default();
        replies
            .merge_json(r#"{"WrongChannel": "go elsewhere", "offtopic": "stay on topic"}"#)
            .unwrap();
        assert_eq!(replies.get("wrongchannel"), Some("go elsewhere"));
        assert_eq!(replies.get("offtopic"), Some("stay on topic"));
        assert_eq!(replies.len(), 5);
    }

    #[test]
    fn rejects_blank_or_spaced_tokens() {
        let mut replies = CannedReplies::empty();
        assert!(replies.insert("  ", "x").is_err());
        assert!(replies.insert("two words", "x").is_err());
        assert!(replies.insert("ok", "   ").is_err());
        assert!(replies.is_empty());
    }

    #[test]
    fn rejects_moderation_tokens() {
        let mut replies = CannedReplies::default();
        for token in ["d", "D3", " d5 "] {
            assert!(
                matches!(replies.insert(token, "hello"), Err(Error::Config(_))),
                "{token} accepted"
            );
        }
        assert!(matches!(
            replies.merge_json(r#"{"d1": "hello"}"#),
            Err(Error::Config(_))
        ));
        assert_eq!(replies, CannedReplies::default());
    }

    #[test]
    fn rejects_malformed_json() {
        let mut replies = CannedReplies::empty();
        assert!(matches!(
            replies.merge_json("[\"not\", \"an object\"]"),
            Err(Error::Json(_))
        ));
    }
}
