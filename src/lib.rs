pub mod commands;
pub mod config;
pub mod db;
pub mod handler;
pub mod hooks;
pub mod markov;

/// Custom data passed to all commands
pub struct Data {
    pub config: config::Config,
    pub markov: markov::MarkovService,
    /// Bot's own user ID, stripped from learned messages
    pub bot_id: u64,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
