//! Post factory with nested comments.

use foundry::{AttributeValue, Attributes, Factory};
use rand::Rng;

use super::comment::CommentGenerator;
use super::recent_timestamp;
use super::user::UserGenerator;
use crate::models::Post;

/// Configuration for post generation.
#[derive(Debug, Clone)]
pub struct PostGenConfig {
    /// Word count range of a title.
    pub title_words: std::ops::Range<usize>,
    /// Sentence count range of the body.
    pub body_sentences: std::ops::Range<usize>,
    /// Probability that a post is published.
    pub publish_rate: f64,
    /// Posts are written up to this many days ago.
    pub max_age_days: i64,
}

impl Default for PostGenConfig {
    fn default() -> Self {
        Self {
            title_words: 3..8,
            body_sentences: 3..10,
            publish_rate: 0.8,
            max_age_days: 365,
        }
    }
}

/// Builds post factories.
pub struct PostGenerator {
    config: PostGenConfig,
}

impl PostGenerator {
    pub fn new() -> Self {
        Self {
            config: PostGenConfig::default(),
        }
    }

    pub fn with_config(config: PostGenConfig) -> Self {
        Self { config }
    }

    /// Posts by a freshly built user, without comments.
    pub fn factory(&self) -> Factory<Post> {
        self.factory_by(UserGenerator::new().factory())
    }

    /// Posts written by `author`.
    pub fn factory_by(&self, author: impl Into<AttributeValue>) -> Factory<Post> {
        let config = self.config.clone();
        Factory::generated(move |faker| {
            let title = faker.sentence(config.title_words.clone());
            Attributes::new()
                .set("id", faker.uuid().to_string())
                .set("title", title.trim_end_matches('.'))
                .set("body", faker.paragraph(config.body_sentences.clone()))
                .set("published", faker.gen_bool(config.publish_rate.clamp(0.0, 1.0)))
                .set("created_at", recent_timestamp(faker, config.max_age_days))
        })
        .with_attributes(Attributes::new().set("author", author))
    }

    /// Posts by `author` carrying `count` comments from `comments`.
    pub fn with_comments(
        &self,
        author: impl Into<AttributeValue>,
        comments: &CommentGenerator,
        commenter: impl Into<AttributeValue>,
        count: usize,
    ) -> Factory<Post> {
        self.factory_by(author).with_attributes(
            Attributes::new().set("comments", comments.factory_by(commenter).many(count)),
        )
    }
}

impl Default for PostGenerator {
    fn default() -> Self {
        Self::new()
    }
}
