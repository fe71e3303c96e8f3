//! Fluent builder for constructing blog test scenarios.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Instant;

use foundry::{AttributeValue, Attributes, Configuration, InMemoryStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::PgPool;
use tracing::info;

use crate::config::SeedConfig;
use crate::db::{SeedError, Seeder};
use crate::factories::{
    CommentGenConfig, CommentGenerator, PostGenConfig, PostGenerator, UserGenConfig,
    UserGenerator,
};
use crate::models::{Post, User};

/// Result of building (and optionally seeding) a scenario.
#[derive(Debug)]
pub struct ScenarioResult {
    pub users: Vec<User>,
    pub posts: Vec<Post>,
    /// Every persisted record, in insertion order.
    pub store: Arc<InMemoryStore>,
    /// Metrics from scenario generation (populated if metrics tracking enabled).
    pub metrics: Option<ScenarioMetrics>,
}

impl ScenarioResult {
    /// Total number of comments across all posts.
    pub fn comment_count(&self) -> usize {
        self.posts.iter().map(|p| p.comments.len()).sum()
    }
}

/// Performance metrics from scenario generation.
#[derive(Debug, Clone)]
pub struct ScenarioMetrics {
    /// Time spent generating data (milliseconds).
    pub generation_time_ms: u64,
    /// Time spent seeding database (milliseconds, 0 if build_data used).
    pub seeding_time_ms: u64,
    pub user_count: usize,
    pub post_count: usize,
    pub comment_count: usize,
    /// Records written to the store, nested copies included.
    pub record_count: usize,
}

/// Draws a count from `range`. An empty range such as `5..=2` yields its start.
fn sample_count(rng: &mut StdRng, range: &RangeInclusive<usize>) -> usize {
    let (start, end) = (*range.start(), *range.end());
    rng.gen_range(start..=end.max(start))
}

/// Builder for creating complete blog scenarios.
///
/// # Example
///
/// ```rust,ignore
/// let result = ScenarioBuilder::new()
///     .with_users(20)
///     .with_posts_per_user(1..=3)
///     .with_comments_per_post(0..=5)
///     .with_seed(7)
///     .build(&pool)
///     .await?;
/// ```
pub struct ScenarioBuilder {
    user_count: usize,
    user_config: UserGenConfig,
    posts_per_user: RangeInclusive<usize>,
    post_config: PostGenConfig,
    comments_per_post: RangeInclusive<usize>,
    comment_config: CommentGenConfig,
    seed: u64,
    batch_size: usize,
    track_metrics: bool,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenarioBuilder {
    /// Creates a new scenario builder with default settings.
    pub fn new() -> Self {
        Self::from_config(&SeedConfig::default())
    }

    /// Creates a builder from a seed configuration.
    pub fn from_config(config: &SeedConfig) -> Self {
        Self {
            user_count: config.user_count,
            user_config: UserGenConfig::default(),
            posts_per_user: config.posts_per_user.clone(),
            post_config: PostGenConfig::default(),
            comments_per_post: config.comments_per_post.clone(),
            comment_config: CommentGenConfig::default(),
            seed: config.seed,
            batch_size: config.batch_size,
            track_metrics: false,
        }
    }

    /// Sets the number of users to generate.
    pub fn with_users(mut self, count: usize) -> Self {
        self.user_count = count;
        self
    }

    /// Sets the user generation configuration.
    pub fn with_user_config(mut self, config: UserGenConfig) -> Self {
        self.user_config = config;
        self
    }

    /// Sets the range of posts per user.
    pub fn with_posts_per_user(mut self, range: RangeInclusive<usize>) -> Self {
        self.posts_per_user = range;
        self
    }

    pub fn with_post_config(mut self, config: PostGenConfig) -> Self {
        self.post_config = config;
        self
    }

    /// Sets the range of comments per post.
    pub fn with_comments_per_post(mut self, range: RangeInclusive<usize>) -> Self {
        self.comments_per_post = range;
        self
    }

    pub fn with_comment_config(mut self, config: CommentGenConfig) -> Self {
        self.comment_config = config;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enables metrics tracking for performance analysis.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.track_metrics = enabled;
        self
    }

    /// Builds the scenario (generates data but doesn't seed database).
    pub fn build_data(&self) -> Result<ScenarioResult, SeedError> {
        let start_time = self.track_metrics.then(Instant::now);

        let store = Arc::new(InMemoryStore::new());
        let configuration = Arc::new(
            Configuration::new()
                .with_seed(self.seed)
                .with_persister(store.clone()),
        );
        let mut rng = StdRng::seed_from_u64(self.seed);

        // Generate users
        let user_handles = UserGenerator::with_config(self.user_config.clone())
            .factory()
            .with_configuration(configuration.clone())
            .create_many(self.user_count, Attributes::new())?;

        let authors = user_handles
            .iter()
            .map(|u| u.to_attribute())
            .collect::<Result<Vec<_>, _>>()?;

        // Generate posts, each commented on by random existing users
        let post_gen = PostGenerator::with_config(self.post_config.clone());
        let comment_gen = CommentGenerator::with_config(self.comment_config.clone());
        let mut posts = Vec::new();

        for author in &authors {
            let num_posts = sample_count(&mut rng, &self.posts_per_user);

            for _ in 0..num_posts {
                let num_comments = if authors.is_empty() {
                    0
                } else {
                    sample_count(&mut rng, &self.comments_per_post)
                };
                let comments: Vec<AttributeValue> = (0..num_comments)
                    .map(|_| {
                        let commenter = authors[rng.gen_range(0..authors.len())].clone();
                        AttributeValue::from(comment_gen.factory_by(commenter))
                    })
                    .collect();

                let post = post_gen
                    .factory_by(author.clone())
                    .with_configuration(configuration.clone())
                    .create(Attributes::new().set("comments", comments))?;
                posts.push(post.into_object());
            }
        }

        let users: Vec<User> = user_handles.into_iter().map(|u| u.into_object()).collect();
        info!(
            "Generated {} users, {} posts, {} records",
            users.len(),
            posts.len(),
            store.len()
        );

        let mut result = ScenarioResult {
            users,
            posts,
            store,
            metrics: None,
        };

        result.metrics = start_time.map(|start| ScenarioMetrics {
            generation_time_ms: start.elapsed().as_millis() as u64,
            seeding_time_ms: 0, // Set by build() if database seeding occurs
            user_count: result.users.len(),
            post_count: result.posts.len(),
            comment_count: result.comment_count(),
            record_count: result.store.len(),
        });

        Ok(result)
    }

    /// Builds and seeds the scenario into the database.
    pub async fn build(self, pool: &PgPool) -> Result<ScenarioResult, SeedError> {
        let mut result = self.build_data()?;
        let seed_start = self.track_metrics.then(Instant::now);

        let seeder = Seeder::new(pool.clone()).with_batch_size(self.batch_size);
        seeder.ensure_schema().await?;
        seeder.seed_records(&result.store.snapshot()).await?;

        // Update seeding time in metrics
        if let (Some(start), Some(metrics)) = (seed_start, result.metrics.as_mut()) {
            metrics.seeding_time_ms = start.elapsed().as_millis() as u64;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_data_counts() {
        let result = ScenarioBuilder::new()
            .with_users(5)
            .with_posts_per_user(2..=2)
            .with_comments_per_post(1..=1)
            .with_metrics(true)
            .build_data()
            .unwrap();

        assert_eq!(result.users.len(), 5);
        assert_eq!(result.posts.len(), 10);
        assert_eq!(result.comment_count(), 10);
        assert_eq!(result.store.count("user"), 5);
        assert_eq!(result.store.count("post"), 10);
        assert_eq!(result.store.count("comment"), 10);

        let metrics = result.metrics.unwrap();
        assert_eq!(metrics.record_count, 25);
        assert_eq!(metrics.seeding_time_ms, 0);
    }

    #[test]
    fn test_posts_reference_existing_users() {
        let result = ScenarioBuilder::new()
            .with_users(4)
            .with_posts_per_user(1..=3)
            .with_comments_per_post(0..=3)
            .build_data()
            .unwrap();

        for post in &result.posts {
            assert!(result.users.contains(&post.author));
            for comment in &post.comments {
                assert!(result.users.contains(&comment.author));
            }
        }
    }

    #[test]
    fn test_same_seed_same_users() {
        let a = ScenarioBuilder::new().with_users(3).with_seed(9).build_data().unwrap();
        let b = ScenarioBuilder::new().with_users(3).with_seed(9).build_data().unwrap();

        let names = |r: &ScenarioResult| r.users.iter().map(|u| u.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&a), names(&b));
        assert_eq!(a.posts.len(), b.posts.len());
    }

    #[test]
    fn test_no_users_no_posts() {
        let result = ScenarioBuilder::new().with_users(0).build_data().unwrap();
        assert!(result.users.is_empty());
        assert!(result.posts.is_empty());
        assert!(result.store.is_empty());
    }

    #[test]
    fn test_empty_ranges_use_their_start() {
        let config = SeedConfig {
            user_count: 2,
            posts_per_user: 2..=1,
            comments_per_post: 3..=0,
            ..Default::default()
        };
        let result = ScenarioBuilder::from_config(&config).build_data().unwrap();

        assert_eq!(result.posts.len(), 4);
        assert_eq!(result.comment_count(), 12);
    }
}
