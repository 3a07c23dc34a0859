use poise::serenity_prelude as serenity;
use poise::{CooldownConfig, CooldownContext, CooldownTracker};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[cfg(test)]
use poise::CooldownType;
#[cfg(test)]
use std::time::Instant;

/// Counts learned-channel messages and fires every `threshold` messages.
pub struct ReplyTrigger {
    threshold: usize,
    count: AtomicUsize,
}

impl ReplyTrigger {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            count: AtomicUsize::new(0),
        }
    }

    /// Records one message. Returns `true` and resets the counter to zero
    /// when the threshold is reached.
    pub fn record(&self) -> bool {
        let threshold = self.threshold;
        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                Some(if count + 1 >= threshold { 0 } else { count + 1 })
            })
            .unwrap_or_else(|count| count);
        previous + 1 >= threshold
    }

    pub fn remaining(&self) -> usize {
        self.threshold - self.count.load(Ordering::SeqCst)
    }
}

/// One reply per guild per `period` for mention-triggered replies.
pub struct MentionCooldown {
    config: CooldownConfig,
    tracker: Mutex<CooldownTracker>,
}

impl MentionCooldown {
    pub fn new(period: Duration) -> Self {
        Self {
            config: CooldownConfig {
                guild: Some(period),
                ..Default::default()
            },
            tracker: Mutex::new(CooldownTracker::new()),
        }
    }

    fn context(guild_id: Option<u64>) -> CooldownContext {
        CooldownContext {
            guild_id: guild_id.filter(|id| *id != 0).map(serenity::GuildId::new),
            ..Default::default()
        }
    }

    /// Claims the guild's slot, or returns how long until it frees up.
    /// Messages outside a guild are never limited.
    pub fn try_acquire(&self, guild_id: Option<u64>) -> Result<(), Duration> {
        let ctx = Self::context(guild_id);
        let mut tracker = self.tracker.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(remaining) = tracker.remaining_cooldown(ctx.clone(), &self.config) {
            return Err(remaining);
        }

        tracker.start_cooldown(ctx);
        Ok(())
    }

    #[cfg(test)]
    fn set_last_reply(&self, guild_id: u64, at: Instant) {
        let mut tracker = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
        tracker.set_last_invocation(CooldownType::Guild(serenity::GuildId::new(guild_id)), at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_fires_on_threshold_and_resets() {
        let trigger = ReplyTrigger::new(3);
        assert!(!trigger.record());
        assert!(!trigger.record());
        assert_eq!(trigger.remaining(), 1);
        assert!(trigger.record());
        assert_eq!(trigger.remaining(), 3);

        assert!(!trigger.record());
        assert!(!trigger.record());
        assert!(trigger.record());
    }

    #[test]
    fn test_zero_threshold_fires_every_message() {
        let trigger = ReplyTrigger::new(0);
        assert!(trigger.record());
        assert!(trigger.record());
    }

    #[test]
    fn test_mention_cooldown_is_per_guild() {
        let period = Duration::from_secs(5);
        let cooldown = MentionCooldown::new(period);

        assert!(cooldown.try_acquire(Some(1)).is_ok());
        let remaining = cooldown.try_acquire(Some(1)).unwrap_err();
        assert!(remaining <= period && remaining > Duration::from_secs(4));

        assert!(cooldown.try_acquire(Some(2)).is_ok());

        // Two seconds into the window, three remain.
        let two_secs_ago = Instant::now().checked_sub(Duration::from_secs(2)).unwrap();
        cooldown.set_last_reply(1, two_secs_ago);
        let remaining = cooldown.try_acquire(Some(1)).unwrap_err();
        assert!(remaining <= Duration::from_secs(3) && remaining > Duration::from_secs(2));

        let expired = Instant::now()
            .checked_sub(period + Duration::from_secs(1))
            .unwrap();
        cooldown.set_last_reply(1, expired);
        assert!(cooldown.try_acquire(Some(1)).is_ok());
    }

    #[test]
    fn test_mention_cooldown_ignores_direct_messages() {
        let cooldown = MentionCooldown::new(Duration::from_secs(5));
        assert!(cooldown.try_acquire(None).is_ok());
        assert!(cooldown.try_acquire(None).is_ok());
    }
}
