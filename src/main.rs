use poise::serenity_prelude as serenity;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use utopify::markov::{MarkovService, MarkovSettings};
use utopify::{commands, config::Config, db::Database, handler, hooks, Data};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let discord_token = config.discord_token.clone();
    info!("Loaded configuration: {:?}", config);

    if config.markov_channel_id.is_none() {
        info!("MARKOV_CHANNEL_ID is not set; Markov learning is disabled");
    }

    let db = Database::new(&config)?;
    let owners: HashSet<serenity::UserId> = config
        .owner_id
        .map(serenity::UserId::new)
        .into_iter()
        .collect();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            owners,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.command_prefix.clone()),
                mention_as_prefix: false,
                ..Default::default()
            },
            on_error: |error| Box::pin(hooks::on_error(error)),
            pre_command: |ctx| Box::pin(hooks::pre_command(ctx)),
            post_command: |ctx| Box::pin(hooks::post_command(ctx)),
            event_handler: |ctx, event, _framework, data| {
                Box::pin(async move {
                    if let serenity::FullEvent::Message { new_message } = event {
                        handler::handle_message(ctx, new_message, data).await?;
                    }
                    Ok(())
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot is ready as {}!", ready.user.name);

                if config.register_commands {
                    let commands = &framework.options().commands;
                    match config.dev_guild_id {
                        Some(guild_id) => {
                            info!("Registering commands in guild {}", guild_id);
                            poise::builtins::register_in_guild(
                                ctx,
                                commands,
                                serenity::GuildId::new(guild_id),
                            )
                            .await?;
                        }
                        None => {
                            info!("Registering commands globally");
                            poise::builtins::register_globally(ctx, commands).await?;
                        }
                    }
                }

                // Set bot status
                ctx.set_activity(Some(serenity::ActivityData::playing(&config.status_message)));

                let markov = MarkovService::new(Arc::new(db), MarkovSettings::from_config(&config));

                Ok(Data {
                    config,
                    markov,
                    bot_id: ready.user.id.get(),
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MESSAGES;

    let mut client = serenity::ClientBuilder::new(&discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    info!("Starting bot...");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    Ok(())
}
