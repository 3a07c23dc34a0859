use crate::config::DISCORD_MESSAGE_LIMIT;
use crate::markov::MarkovError;
use crate::{Data, Error};
use poise::serenity_prelude as serenity;
use serenity::{CreateAllowedMentions, CreateMessage, MessageType};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const COOLDOWN_NOTICE_TTL: Duration = Duration::from_secs(2);

/// Gate for the whole Markov path: human authors in the configured channel.
pub fn in_markov_channel(author_is_bot: bool, channel_id: u64, markov_channel: Option<u64>) -> bool {
    !author_is_bot && markov_channel == Some(channel_id)
}

/// Decides whether a message that passed [`in_markov_channel`] feeds the
/// corpus. System notices and prefix commands are skipped.
pub fn should_learn(content: &str, is_system: bool, command_prefix: &str) -> bool {
    if is_system {
        return false;
    }
    command_prefix.is_empty() || !content.starts_with(command_prefix)
}

pub fn strip_bot_mentions(input: &str, bot_id: u64) -> String {
    let mention = format!("<@{}>", bot_id);
    let mention_nick = format!("<@!{}>", bot_id);

    input
        .replace(&mention, "")
        .replace(&mention_nick, "")
        .trim()
        .to_string()
}

fn is_system_message(kind: MessageType) -> bool {
    !matches!(
        kind,
        MessageType::Regular
            | MessageType::InlineReply
            | MessageType::ChatInputCommand
            | MessageType::ContextMenuCommand
    )
}

fn truncate_for_discord(text: &str) -> String {
    text.chars().take(DISCORD_MESSAGE_LIMIT).collect()
}

/// Learns from messages in the Markov channel and replies on a mention or
/// once every `MARKOV_COOLDOWN_MESSAGES` messages.
pub async fn handle_message(
    ctx: &serenity::Context,
    new_message: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    if !in_markov_channel(
        new_message.author.bot,
        new_message.channel_id.get(),
        data.config.markov_channel_id,
    ) {
        return Ok(());
    }

    if should_learn(
        &new_message.content,
        is_system_message(new_message.kind),
        &data.config.command_prefix,
    ) {
        let content = strip_bot_mentions(&new_message.content, data.bot_id);
        if !content.is_empty() {
            data.markov.learn(&content).await?;
        }
    }

    if data.markov.record_message() {
        info!(
            "Markov: cooldown reply triggered in channel {}",
            new_message.channel_id
        );
        return send_markov_reply(ctx, new_message, data).await;
    }

    let mentioned =
        new_message.mention_everyone || new_message.mentions_user_id(data.bot_id);
    if !mentioned {
        return Ok(());
    }

    match data.markov.try_mention_reply(new_message.guild_id.map(|id| id.get())) {
        Ok(()) => {
            info!(
                "Markov: mention reply triggered by {} in channel {}",
                new_message.author.name, new_message.channel_id
            );
            send_markov_reply(ctx, new_message, data).await
        }
        Err(remaining) => {
            debug!(
                "Markov: mention from {} rate limited for {:?}",
                new_message.author.name, remaining
            );
            send_cooldown_notice(ctx, new_message, remaining).await
        }
    }
}

async fn send_markov_reply(
    ctx: &serenity::Context,
    new_message: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    let seed = new_message.content_safe(&ctx.cache);
    let n_words = data.markov.random_word_count();

    let reply = match data.markov.generate_reply(&seed, n_words).await {
        Ok(reply) => reply,
        Err(MarkovError::EmptyCorpus) => {
            info!("Markov: nothing learned yet, skipping reply");
            return Ok(());
        }
        Err(MarkovError::EmptyChain) => {
            warn!("Markov: corpus produced an empty chain, skipping reply");
            return Ok(());
        }
        Err(e) => {
            error!("Markov: failed to generate reply: {}", e);
            return Err(e.into());
        }
    };

    let builder = CreateMessage::new()
        .content(truncate_for_discord(&reply))
        .reference_message(new_message)
        .allowed_mentions(CreateAllowedMentions::new());
    new_message
        .channel_id
        .send_message(&ctx.http, builder)
        .await?;
    Ok(())
}

async fn send_cooldown_notice(
    ctx: &serenity::Context,
    new_message: &serenity::Message,
    remaining: Duration,
) -> Result<(), Error> {
    let content = format!(
        "> Calma aí, camarada! Estou no cooldown... Tente novamente em `{:.1}s`",
        remaining.as_secs_f64()
    );
    let builder = CreateMessage::new()
        .content(content)
        .reference_message(new_message)
        .allowed_mentions(CreateAllowedMentions::new());
    let notice = new_message
        .channel_id
        .send_message(&ctx.http, builder)
        .await?;

    let http = ctx.http.clone();
    tokio::spawn(async move {
        tokio::time::sleep(COOLDOWN_NOTICE_TTL).await;
        if let Err(e) = notice.delete(&http).await {
            debug!("Failed to delete cooldown notice: {}", e);
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNEL: u64 = 794453931412684820;

    #[test]
    fn test_gate_admits_humans_in_markov_channel() {
        assert!(in_markov_channel(false, CHANNEL, Some(CHANNEL)));
    }

    #[test]
    fn test_gate_rejects_bots_other_channels_and_unset_channel() {
        assert!(!in_markov_channel(true, CHANNEL, Some(CHANNEL)));
        assert!(!in_markov_channel(false, 1, Some(CHANNEL)));
        assert!(!in_markov_channel(false, CHANNEL, None));
    }

    #[test]
    fn test_learns_plain_messages() {
        assert!(should_learn("bom dia", false, "!"));
    }

    #[test]
    fn test_skips_system_and_commands() {
        assert!(!should_learn("pinned a message", true, "!"));
        assert!(!should_learn("!8ball vai chover?", false, "!"));
        assert!(should_learn("!8ball vai chover?", false, ""));
    }

    #[test]
    fn test_strip_bot_mentions() {
        assert_eq!(strip_bot_mentions("<@42> oi bot", 42), "oi bot");
        assert_eq!(strip_bot_mentions("oi <@!42>", 42), "oi");
        assert_eq!(strip_bot_mentions("<@7> oi", 42), "<@7> oi");
        assert_eq!(strip_bot_mentions("<@42>", 42), "");
    }

    #[test]
    fn test_system_message_kinds() {
        assert!(!is_system_message(MessageType::Regular));
        assert!(!is_system_message(MessageType::InlineReply));
        assert!(is_system_message(MessageType::MemberJoin));
        assert!(is_system_message(MessageType::PinsAdd));
    }

    #[test]
    fn test_truncate_for_discord() {
        let long = "a".repeat(DISCORD_MESSAGE_LIMIT + 10);
        assert_eq!(truncate_for_discord(&long).chars().count(), DISCORD_MESSAGE_LIMIT);
    }
}
