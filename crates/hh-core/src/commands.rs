//! Command parsing and routing.
//!
//! Every inbound message passes through [`Dispatcher::dispatch`]; the first
//! word decides which registered [`CommandHandler`] (if any) runs.

use std::{collections::HashMap, sync::Arc, sync::OnceLock};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::{
    config::Config,
    domain::UserId,
    messaging::{port::ChatGateway, types::InboundMessage},
    moderation::DeleteAndNotify,
    replies::CannedReply,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Marker stripped, lower-cased.
    pub name: String,
    pub args: Vec<String>,
}

/// Extract the command token from a message, if it is one.
///
/// `/D3 foo` with marker `/` yields `d3` and `["foo"]`. Anything whose first
/// word does not start with the marker is not a command.
pub fn parse_command(text: &str, marker: char) -> Option<ParsedCommand> {
    let mut words = text.split_whitespace();
    let first = words.next()?;
    let name = first.strip_prefix(marker)?.to_lowercase();
    if name.is_empty() {
        return None;
    }

    Some(ParsedCommand {
        name,
        args: words.map(str::to_string).collect(),
    })
}

/// Everything a handler may touch while processing one command.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub gateway: &'a dyn ChatGateway,
    pub config: &'a Config,
    pub message: &'a InboundMessage,
    pub args: &'a [String],
}

/// A command implementation. Failures are logged inside the handler; nothing
/// escapes to the dispatcher.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: CommandContext<'_>);
}

/// Normalized token -> handler.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moderation commands (`d`, `d1`..`d5`) plus one entry per canned reply.
    pub fn standard(cfg: &Config) -> Self {
        let mut registry = Self::new();

        for (token, text) in cfg.canned_replies.iter() {
            registry.register(token, CannedReply::new(text));
        }

        // Registered last so nothing can shadow the moderation tokens.
        registry.register("d", DeleteAndNotify::from_argument());
        for rule in 1..=5 {
            registry.register(&format!("d{rule}"), DeleteAndNotify::for_rule(rule));
        }

        registry
    }

    /// Register a handler; a later registration for the same token wins.
    pub fn register(&mut self, token: &str, handler: impl CommandHandler + 'static) {
        self.handlers.insert(token.to_lowercase(), Arc::new(handler));
    }

    pub fn get(&self, token: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(token).cloned()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.handlers.contains_key(token)
    }

    pub fn tokens(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }
}

pub struct Dispatcher {
    cfg: Arc<Config>,
    registry: CommandRegistry,
    self_id: OnceLock<UserId>,
}

impl Dispatcher {
    pub fn new(cfg: Arc<Config>, registry: CommandRegistry) -> Self {
        Self {
            cfg,
            registry,
            self_id: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Record the bot's own user id (from the gateway's ready event).
    ///
    /// Only the first call takes effect; reconnects report the same id.
    pub fn set_self_id(&self, id: UserId) {
        let _ = self.self_id.set(id);
    }

    pub fn self_id(&self) -> Option<UserId> {
        self.self_id.get().copied()
    }

    /// Handle one message-create event.
    ///
    /// Duplicate deliveries are handled again; there is no deduplication.
    pub async fn dispatch(&self, gateway: &dyn ChatGateway, msg: &InboundMessage) {
        if self.self_id() == Some(msg.author.id) {
            return;
        }

        info!(
            channel = %msg.channel_label(),
            author = %msg.author.name,
            author_id = %msg.author.id,
            "{}",
            msg.content
        );

        let Some(cmd) = parse_command(&msg.content, self.cfg.command_prefix) else {
            return;
        };

        let Some(handler) = self.registry.get(&cmd.name) else {
            debug!(command = %cmd.name, "ignoring unknown command");
            return;
        };

        handler
            .handle(CommandContext {
                gateway,
                config: &self.cfg,
                message: msg,
                args: &cmd.args,
            })
            .await;
    }
}
