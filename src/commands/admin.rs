use crate::{Context, Error};
use tracing::info;

/// Shut down the bot (Owner only)
#[poise::command(slash_command, prefix_command, owners_only, hide_in_help)]
pub async fn shutdown(ctx: Context<'_>) -> Result<(), Error> {
    info!("Shutdown command received from owner: {}", ctx.author().name);
    ctx.say("👋 Desligando...").await?;
    ctx.framework().shard_manager().shutdown_all().await;
    Ok(())
}

/// Register or unregister application commands (Owner only)
#[poise::command(prefix_command, owners_only, hide_in_help)]
pub async fn register(ctx: Context<'_>) -> Result<(), Error> {
    info!("Command registration requested by {}", ctx.author().name);
    poise::builtins::register_application_commands_buttons(ctx).await?;
    Ok(())
}
