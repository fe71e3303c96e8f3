//! Comment factory.

use foundry::{AttributeValue, Attributes, Factory};

use super::recent_timestamp;
use super::user::UserGenerator;
use crate::models::Comment;

/// Configuration for comment generation.
#[derive(Debug, Clone)]
pub struct CommentGenConfig {
    /// Word count range of a comment.
    pub words: std::ops::Range<usize>,
    /// Comments are written up to this many days ago.
    pub max_age_days: i64,
}

impl Default for CommentGenConfig {
    fn default() -> Self {
        Self {
            words: 4..16,
            max_age_days: 90,
        }
    }
}

/// Builds comment factories.
pub struct CommentGenerator {
    config: CommentGenConfig,
}

impl CommentGenerator {
    pub fn new() -> Self {
        Self {
            config: CommentGenConfig::default(),
        }
    }

    pub fn with_config(config: CommentGenConfig) -> Self {
        Self { config }
    }

    /// Comments written by a freshly built user.
    pub fn factory(&self) -> Factory<Comment> {
        self.factory_by(UserGenerator::new().factory())
    }

    /// Comments written by `author`, which may be a nested factory or an
    /// existing user.
    pub fn factory_by(&self, author: impl Into<AttributeValue>) -> Factory<Comment> {
        let config = self.config.clone();
        Factory::generated(move |faker| {
            Attributes::new()
                .set("id", faker.uuid().to_string())
                .set("body", faker.sentence(config.words.clone()))
                .set("created_at", recent_timestamp(faker, config.max_age_days))
        })
        .with_attributes(Attributes::new().set("author", author))
    }
}

impl Default for CommentGenerator {
    fn default() -> Self {
        Self::new()
    }
}
