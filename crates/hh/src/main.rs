use std::sync::Arc;

use hh_core::{
    commands::{CommandRegistry, Dispatcher},
    config::Config,
};

#[tokio::main]
async fn main() -> Result<(), hh_core::Error> {
    hh_core::logging::init("hh")?;

    let cfg = Arc::new(Config::load()?);
    if cfg.allowed_users.is_empty() {
        tracing::warn!("no moderators configured; /d commands will be ignored");
    }

    let registry = CommandRegistry::standard(&cfg);
    let dispatcher = Arc::new(Dispatcher::new(cfg.clone(), registry));

    hh_discord::router::run(&cfg.discord_token, dispatcher)
        .await
        .map_err(|e| hh_core::Error::External(format!("discord bot failed: {e}")))?;

    Ok(())
}
