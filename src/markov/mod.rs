pub mod chain;
pub mod generator;
pub mod store;
pub mod trigger;

use crate::config::Config;
use chain::{gather_tokens, Chain};
use chrono::Duration;
use rand::Rng;
use std::sync::Arc;
use store::{MessageStore, StoreError, StoredMessage, TrimBefore};
use tracing::{debug, info};
use trigger::{MentionCooldown, ReplyTrigger};

#[derive(Debug, thiserror::Error)]
pub enum MarkovError {
    #[error("no messages have been learned yet")]
    EmptyCorpus,
    #[error("the chain has no entries to start from")]
    EmptyChain,
    #[error("message store failure: {0}")]
    Persistence(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct MarkovSettings {
    pub retention: Duration,
    pub cooldown_messages: usize,
    pub mention_cooldown: std::time::Duration,
    pub min_words: usize,
    pub max_words: usize,
}

impl MarkovSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retention: Duration::from_std(config.markov_retention)
                .unwrap_or_else(|_| Duration::hours(24)),
            cooldown_messages: config.markov_cooldown_messages,
            mention_cooldown: std::time::Duration::from_secs(config.markov_mention_cooldown_secs),
            min_words: config.markov_min_words,
            max_words: config.markov_max_words,
        }
    }
}

impl Default for MarkovSettings {
    fn default() -> Self {
        Self {
            retention: Duration::hours(24),
            cooldown_messages: 52,
            mention_cooldown: std::time::Duration::from_secs(5),
            min_words: 6,
            max_words: 12,
        }
    }
}

/// Learns chat messages and answers with Markov-generated text.
///
/// The chain is rebuilt from the store on every reply; only the message log
/// is persisted. Expired rows are trimmed after each corpus read.
pub struct MarkovService {
    store: Arc<dyn MessageStore>,
    settings: MarkovSettings,
    trigger: ReplyTrigger,
    mention_cooldown: MentionCooldown,
}

impl MarkovService {
    pub fn new(store: Arc<dyn MessageStore>, settings: MarkovSettings) -> Self {
        let trigger = ReplyTrigger::new(settings.cooldown_messages);
        let mention_cooldown = MentionCooldown::new(settings.mention_cooldown);
        Self {
            store,
            settings,
            trigger,
            mention_cooldown,
        }
    }

    pub fn settings(&self) -> &MarkovSettings {
        &self.settings
    }

    pub async fn learn(&self, raw_message: &str) -> Result<(), MarkovError> {
        let text = raw_message.to_lowercase();
        debug!("Markov: learning message ({} chars)", text.len());
        self.store.append(&text).await?;
        Ok(())
    }

    /// Generates a reply seeded by `seed_text`.
    ///
    /// Fails with [`MarkovError::EmptyCorpus`] when nothing has been learned.
    pub async fn generate_reply(&self, seed_text: &str, n_words: usize) -> Result<String, MarkovError> {
        let corpus = self.corpus().await?;
        let reply = compose(seed_text, &corpus, n_words, &mut rand::rng())?;
        info!(
            "Markov: generated {} words from {} stored messages",
            reply.split(' ').count(),
            corpus.len()
        );
        Ok(reply)
    }

    /// Reads the corpus snapshot, then trims expired rows. The snapshot is
    /// returned untouched by the trim that follows it.
    async fn corpus(&self) -> Result<Vec<StoredMessage>, MarkovError> {
        let snapshot = self.store.fetch_all().await?;
        self.trim_expired().await?;
        snapshot.ok_or(MarkovError::EmptyCorpus)
    }

    pub async fn trim_expired(&self) -> Result<usize, MarkovError> {
        let removed = self
            .store
            .trim(TrimBefore::Age(self.settings.retention))
            .await?;
        if removed > 0 {
            info!("Markov: trimmed {} expired messages", removed);
        }
        Ok(removed)
    }

    pub async fn stored_count(&self) -> Result<usize, MarkovError> {
        Ok(self.store.fetch_all().await?.map_or(0, |rows| rows.len()))
    }

    /// Records a learned-channel message; `true` means a cooldown reply is due.
    pub fn record_message(&self) -> bool {
        self.trigger.record()
    }

    pub fn messages_until_reply(&self) -> usize {
        self.trigger.remaining()
    }

    pub fn try_mention_reply(&self, guild_id: Option<u64>) -> Result<(), std::time::Duration> {
        self.mention_cooldown.try_acquire(guild_id)
    }

    pub fn random_word_count(&self) -> usize {
        let min = self.settings.min_words.max(1);
        let max = self.settings.max_words.max(min);
        rand::rng().random_range(min..=max)
    }
}

/// Builds a chain from the seed and corpus and walks it.
pub fn compose<R: Rng + ?Sized>(
    seed_text: &str,
    corpus: &[StoredMessage],
    n_words: usize,
    rng: &mut R,
) -> Result<String, MarkovError> {
    let tokens = gather_tokens(seed_text, corpus);
    let chain = Chain::build(&tokens, 1);
    debug!(
        "Markov: built chain with {} keys from {} tokens",
        chain.len(),
        tokens.len()
    );
    generator::generate(&chain, n_words, rng)
}
