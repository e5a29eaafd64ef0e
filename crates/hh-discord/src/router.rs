use std::sync::Arc;

use serenity::{
    async_trait,
    model::{channel::Message, gateway::Ready},
    prelude::{Client, Context, EventHandler, GatewayIntents},
};
use tracing::{error, info};

use hh_core::{commands::Dispatcher, domain::UserId};

use crate::{to_inbound_message, DiscordGateway};

/// Feeds gateway events into the dispatcher.
pub struct Handler {
    dispatcher: Arc<Dispatcher>,
}

impl Handler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            "Discord bot connected with username: {}",
            ready.user.name
        );
        self.dispatcher.set_self_id(UserId(ready.user.id.get()));
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let channel_name = msg
            .guild(&ctx.cache)
            .and_then(|g| g.channels.get(&msg.channel_id).map(|c| c.name.clone()));
        let inbound = to_inbound_message(&msg, channel_name);
        let gateway = DiscordGateway::new(ctx.http.clone());

        self.dispatcher.dispatch(&gateway, &inbound).await;
    }
}

/// Connect to Discord and process events until SIGINT/SIGTERM.
pub async fn run(token: &str, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(token, intents)
        .event_handler(Handler::new(dispatcher.clone()))
        .await?;

    let registry = dispatcher.registry();
    info!(
        prefix = %dispatcher.config().command_prefix,
        moderators = dispatcher.config().allowed_users.len(),
        commands = %registry.tokens().join(", "),
        "helper is now running"
    );

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received, closing the Discord session");
        shard_manager.shutdown_all().await;
    });

    client.start().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
