//! The privileged "delete and notify" command (`/d`, `/d1`..`/d5`).

use std::fmt;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::{
    commands::{CommandContext, CommandHandler},
    domain::MessageRef,
    messaging::{
        port::ChatGateway,
        types::{FetchedMessage, InboundMessage},
    },
    security::is_authorized,
};

/// Command tokens owned by the moderation handler; canned replies may not use them.
pub const MODERATION_COMMANDS: &[&str] = &["d", "d1", "d2", "d3", "d4", "d5"];

/// Which rule the deleted message broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleRef {
    General,
    Numbered(u32),
}

impl RuleRef {
    /// Rule number 0 means "unspecified".
    pub fn from_number(n: u32) -> Self {
        if n == 0 {
            Self::General
        } else {
            Self::Numbered(n)
        }
    }

    /// `/d 3` -> rule #3; anything else after `/d` is ignored.
    pub fn from_args(args: &[String]) -> Self {
        args.first()
            .and_then(|a| a.trim_start_matches('#').parse::<u32>().ok())
            .map(Self::from_number)
            .unwrap_or(Self::General)
    }
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => f.write_str("one of the rules"),
            Self::Numbered(n) => write!(f, "rule #{n}"),
        }
    }
}

/// Build the DM sent to the author of a removed message.
pub fn compose_notice(
    channel_label: &str,
    content: &str,
    rule: RuleRef,
    rules_url: &str,
) -> String {
    let mut msg = format!("You asked the following question in the `{channel_label}` channel:\n");
    msg.push_str("```\n");
    msg.push_str(content);
    if !content.ends_with('\n') {
        msg.push('\n');
    }
    msg.push_str("```\n");
    msg.push_str("An administrator thinks that this message might have broken ");
    msg.push_str(&format!("{rule}, so it has been deleted.\n"));
    msg.push_str(&format!("Please make sure that your message follows the rules: <{rules_url}>"));
    msg
}

/// Removes the command message and the message it targets, then DMs the
/// target's author why it was removed.
pub struct DeleteAndNotify {
    fixed_rule: Option<RuleRef>,
}

impl DeleteAndNotify {
    /// `/dN`: the rule is part of the command name.
    pub fn for_rule(rule: u32) -> Self {
        Self {
            fixed_rule: Some(RuleRef::from_number(rule)),
        }
    }

    /// `/d [N]`: the rule (if any) comes from the first argument.
    pub fn from_argument() -> Self {
        Self { fixed_rule: None }
    }

    fn rule(&self, args: &[String]) -> RuleRef {
        self.fixed_rule.unwrap_or_else(|| RuleRef::from_args(args))
    }
}

#[async_trait]
impl CommandHandler for DeleteAndNotify {
    async fn handle(&self, ctx: CommandContext<'_>) {
        let msg = ctx.message;

        // Denied silently so the permission boundary is not revealed.
        if !is_authorized(Some(msg.author.id), &ctx.config.allowed_users) {
            debug!(user = %msg.author.id, "ignoring moderation command from non-moderator");
            return;
        }

        let rule = self.rule(ctx.args);
        delete_and_notify(ctx.gateway, msg, rule, &ctx.config.rules_url).await;
    }
}

/// Run the moderation sequence. Every remote failure is logged and ends the
/// sequence; nothing is retried and completed deletions are not undone.
pub async fn delete_and_notify(
    gateway: &dyn ChatGateway,
    trigger: &InboundMessage,
    rule: RuleRef,
    rules_url: &str,
) {
    // A surviving command would be the newest message and get picked as the target.
    if !delete_logged(gateway, trigger.msg_ref()).await {
        return;
    }

    let Some(target) = find_target(gateway, trigger).await else {
        return;
    };

    if !delete_logged(gateway, target.msg_ref()).await {
        return;
    }

    info!(
        channel = %trigger.channel_label(),
        moderator = %trigger.author.name,
        author = %target.author.name,
        %rule,
        "deleted message"
    );

    let notice = compose_notice(&trigger.channel_label(), &target.content, rule, rules_url);
    send_direct(gateway, &target, &notice).await;
}

/// The message being moderated: the one replied to, else the newest message
/// left in the channel once the command itself is gone.
///
/// The fallback races with anyone posting between the command and the fetch.
async fn find_target(
    gateway: &dyn ChatGateway,
    trigger: &InboundMessage,
) -> Option<FetchedMessage> {
    if let Some(replied) = &trigger.replied_to {
        return Some(replied.clone());
    }

    let messages = match gateway.fetch_recent(trigger.channel_id, 1).await {
        Ok(v) => v,
        Err(e) => {
            error!(
                channel = %trigger.channel_id,
                "failed to get the last message from channel: {e}"
            );
            return None;
        }
    };

    let Some(last) = messages.into_iter().next() else {
        error!(channel = %trigger.channel_id, "failed to get any messages from channel");
        return None;
    };
    Some(last)
}

async fn delete_logged(gateway: &dyn ChatGateway, msg: MessageRef) -> bool {
    match gateway.delete_message(msg).await {
        Ok(()) => true,
        Err(e) => {
            error!(
                channel = %msg.channel_id,
                message = %msg.message_id,
                "failed to delete message: {e}"
            );
            false
        }
    }
}

async fn send_direct(gateway: &dyn ChatGateway, target: &FetchedMessage, notice: &str) {
    let user = target.author.id;
    let dm = match gateway.open_direct_channel(user).await {
        Ok(ch) => ch,
        Err(e) => {
            error!(%user, "failed to get the DM channel for user: {e}");
            return;
        }
    };

    if let Err(e) = gateway.send_message(dm, notice).await {
        error!(%user, channel = %dm, "failed to send deletion notice: {e}");
    }
}
