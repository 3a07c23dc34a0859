use dotenvy::dotenv;
use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub discord_token: String,
    pub owner_id: Option<u64>,
    pub database_url: String,
    pub command_prefix: String,
    pub status_message: String,
    pub dev_guild_id: Option<u64>,
    pub register_commands: bool,

    // Markov chat settings
    pub markov_channel_id: Option<u64>,
    pub markov_retention: Duration,
    pub markov_cooldown_messages: usize,
    pub markov_min_words: usize,
    pub markov_max_words: usize,
    pub markov_mention_cooldown_secs: u64,
}

const DEFAULT_STATUS_MESSAGE: &str = "Em busca da utopia automática";
const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        let markov_min_words = env::var("MARKOV_MIN_WORDS")
            .unwrap_or_else(|_| "6".to_string())
            .parse::<usize>()
            .unwrap_or(6)
            .max(1);
        let markov_max_words = env::var("MARKOV_MAX_WORDS")
            .unwrap_or_else(|_| "12".to_string())
            .parse::<usize>()
            .unwrap_or(12)
            .max(markov_min_words);

        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?,
            owner_id: env::var("OWNER_ID").ok().and_then(|id| id.parse().ok()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "data/markov.db".to_string()),
            command_prefix: env::var("COMMAND_PREFIX").unwrap_or_else(|_| "!".to_string()),
            status_message: env::var("STATUS_MESSAGE")
                .unwrap_or_else(|_| DEFAULT_STATUS_MESSAGE.to_string()),
            dev_guild_id: env::var("DEV_GUILD_ID").ok().and_then(|id| id.parse().ok()),
            register_commands: env::var("REGISTER_COMMANDS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),

            markov_channel_id: env::var("MARKOV_CHANNEL_ID")
                .ok()
                .and_then(|id| id.parse().ok()),
            markov_retention: env::var("MARKOV_RETENTION")
                .ok()
                .and_then(|raw| humantime::parse_duration(raw.trim()).ok())
                .unwrap_or(DEFAULT_RETENTION),
            markov_cooldown_messages: env::var("MARKOV_COOLDOWN_MESSAGES")
                .unwrap_or_else(|_| "52".to_string())
                .parse()
                .unwrap_or(52),
            markov_min_words,
            markov_max_words,
            markov_mention_cooldown_secs: env::var("MARKOV_MENTION_COOLDOWN_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"[REDACTED]")
            .field("owner_id", &self.owner_id)
            .field("database_url", &self.database_url)
            .field("command_prefix", &self.command_prefix)
            .field("status_message", &self.status_message)
            .field("dev_guild_id", &self.dev_guild_id)
            .field("register_commands", &self.register_commands)
            .field("markov_channel_id", &self.markov_channel_id)
            .field(
                "markov_retention",
                &humantime::format_duration(self.markov_retention).to_string(),
            )
            .field("markov_cooldown_messages", &self.markov_cooldown_messages)
            .field("markov_min_words", &self.markov_min_words)
            .field("markov_max_words", &self.markov_max_words)
            .field(
                "markov_mention_cooldown_secs",
                &self.markov_mention_cooldown_secs,
            )
            .finish()
    }
}

/// Discord message limit is 2000 characters
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_config_logic() {
        // 1. Test missing vars
        env::remove_var("DISCORD_TOKEN");
        let result = Config::build();
        assert!(result.is_err(), "Should fail when required vars are missing");

        // 2. Test defaults
        env::set_var("DISCORD_TOKEN", "test_token");
        let config = Config::build().unwrap();
        assert_eq!(config.discord_token, "test_token");
        assert_eq!(config.database_url, "data/markov.db");
        assert_eq!(config.markov_retention, Duration::from_secs(86_400));
        assert_eq!(config.markov_cooldown_messages, 52);
        assert_eq!((config.markov_min_words, config.markov_max_words), (6, 12));

        // 3. Test overrides and clamping
        env::set_var("MARKOV_RETENTION", "2h 30m");
        env::set_var("MARKOV_MIN_WORDS", "10");
        env::set_var("MARKOV_MAX_WORDS", "4");
        env::set_var("MARKOV_CHANNEL_ID", "794453931412684820");
        let config = Config::build().unwrap();
        assert_eq!(config.markov_retention, Duration::from_secs(9_000));
        assert_eq!((config.markov_min_words, config.markov_max_words), (10, 10));
        assert_eq!(config.markov_channel_id, Some(794453931412684820));

        // 4. Test invalid values fall back
        env::set_var("MARKOV_RETENTION", "forever");
        env::set_var("MARKOV_COOLDOWN_MESSAGES", "lots");
        let config = Config::build().unwrap();
        assert_eq!(config.markov_retention, Duration::from_secs(86_400));
        assert_eq!(config.markov_cooldown_messages, 52);

        // 5. Test debug redaction
        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("test_token"));
        assert!(debug_output.contains("[REDACTED]"));

        // Cleanup
        for key in [
            "DISCORD_TOKEN",
            "MARKOV_RETENTION",
            "MARKOV_MIN_WORDS",
            "MARKOV_MAX_WORDS",
            "MARKOV_CHANNEL_ID",
            "MARKOV_COOLDOWN_MESSAGES",
        ] {
            env::remove_var(key);
        }
    }
}
