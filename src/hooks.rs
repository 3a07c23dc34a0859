use crate::{Context, Data, Error};
use tracing::{error, info, warn};

pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {}", ctx.command().qualified_name, error);
            if let Err(e) = ctx.say("❌ Algo deu errado ao executar esse comando.").await {
                error!("Failed to report command error: {}", e);
            }
        }
        poise::FrameworkError::CooldownHit {
            remaining_cooldown,
            ctx,
            ..
        } => {
            warn!(
                "Command `{}` on cooldown for {}",
                ctx.command().qualified_name,
                ctx.author().name
            );
            let reply = format!(
                "> Calma aí, camarada! Tente novamente em `{:.1}s`",
                remaining_cooldown.as_secs_f64()
            );
            if let Err(e) = ctx.send(poise::CreateReply::default().content(reply).ephemeral(true)).await {
                error!("Failed to report cooldown: {}", e);
            }
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!("Error handling {} event: {}", event.snake_case_name(), error);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

pub async fn pre_command(ctx: Context<'_>) {
    info!(
        "Command `{}` invoked by {} in channel {}",
        ctx.command().qualified_name,
        ctx.author().name,
        ctx.channel_id()
    );
}

pub async fn post_command(ctx: Context<'_>) {
    info!(
        "Command `{}` completed for {}",
        ctx.command().qualified_name,
        ctx.author().name
    );
}
