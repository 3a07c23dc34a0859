use crate::markov::MarkovError;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

const MAX_WORDS: usize = 50;

/// Markov chain chat commands
#[poise::command(
    slash_command,
    prefix_command,
    subcommands("generate", "status", "trim"),
    guild_only
)]
pub async fn markov(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Generate a message from what the bot has learned
#[poise::command(slash_command, prefix_command, user_cooldown = 5)]
pub async fn generate(
    ctx: Context<'_>,
    #[description = "Number of words (default random)"]
    #[min = 1]
    #[max = 50]
    words: Option<usize>,
    #[description = "Text to seed the chain with"]
    #[rest]
    seed: Option<String>,
) -> Result<(), Error> {
    let markov = &ctx.data().markov;
    let n_words = words
        .map(|w| w.clamp(1, MAX_WORDS))
        .unwrap_or_else(|| markov.random_word_count());
    let seed = seed.unwrap_or_default();

    match markov.generate_reply(&seed, n_words).await {
        Ok(reply) => {
            ctx.send(
                poise::CreateReply::default()
                    .content(reply)
                    .allowed_mentions(serenity::CreateAllowedMentions::new()),
            )
            .await?;
        }
        Err(MarkovError::EmptyCorpus) | Err(MarkovError::EmptyChain) => {
            ctx.say("📭 Ainda não aprendi nada para dizer.").await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Show what the Markov chain currently knows
#[poise::command(slash_command, prefix_command)]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();
    let stored = data.markov.stored_count().await?;
    let settings = data.markov.settings();
    let retention = settings
        .retention
        .to_std()
        .map(|d| humantime::format_duration(d).to_string())
        .unwrap_or_else(|_| "?".to_string());
    let channel = data
        .config
        .markov_channel_id
        .map(|id| format!("<#{}>", id))
        .unwrap_or_else(|| "Desativado".to_string());

    let embed = serenity::CreateEmbed::new()
        .title("🧠 Markov")
        .field("Canal", channel, true)
        .field("Mensagens", format!("`{}`", stored), true)
        .field("Retenção", format!("`{}`", retention), true)
        .field(
            "Próxima resposta em",
            format!("`{}` mensagens", data.markov.messages_until_reply()),
            true,
        )
        .color(0x5865F2);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Remove learned messages older than the retention window
#[poise::command(slash_command, prefix_command, required_permissions = "MANAGE_MESSAGES")]
pub async fn trim(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    let removed = ctx.data().markov.trim_expired().await?;
    info!("Manual Markov trim by {} removed {} messages", ctx.author().name, removed);
    ctx.say(format!("✅ {} mensagens antigas removidas.", removed))
        .await?;
    Ok(())
}
