//! Configuration types for fixture seeding.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Configuration for seeding operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Number of users to generate.
    pub user_count: usize,

    /// Number of posts per user (range).
    pub posts_per_user: RangeInclusive<usize>,

    /// Number of comments per post (range).
    pub comments_per_post: RangeInclusive<usize>,

    /// Seed for the faker and scenario RNG.
    pub seed: u64,

    /// Batch size for database insertions.
    pub batch_size: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            user_count: 25,
            posts_per_user: 0..=4,
            comments_per_post: 0..=6,
            seed: 42,
            batch_size: 50,
        }
    }
}

impl SeedConfig {
    /// Reads overrides from `SEED`, `SEED_USERS` and `SEED_BATCH_SIZE`,
    /// keeping defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(seed) = env_parse("SEED") {
            config.seed = seed;
        }
        if let Some(users) = env_parse("SEED_USERS") {
            config.user_count = users;
        }
        if let Some(batch_size) = env_parse::<usize>("SEED_BATCH_SIZE") {
            config.batch_size = batch_size.max(1);
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
