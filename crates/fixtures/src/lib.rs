//! Blog fixtures built with foundry.
//!
//! This crate provides factories for users, posts, and comments, a scenario
//! builder that assembles them into a consistent data set, and a seeder that
//! writes the result to PostgreSQL for manual verification and integration
//! testing.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fixtures::prelude::*;
//!
//! let scenario = ScenarioBuilder::new()
//!     .with_users(50)
//!     .with_posts_per_user(0..=5)
//!     .with_comments_per_post(0..=8)
//!     .with_seed(12345)
//!     .build(&pool)
//!     .await?;
//! ```

pub mod builders;
pub mod config;
pub mod db;
pub mod factories;
pub mod models;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::builders::{ScenarioBuilder, ScenarioMetrics, ScenarioResult};
    pub use crate::config::SeedConfig;
    pub use crate::db::{SeedError, Seeder};
    pub use crate::factories::{
        CommentGenConfig, CommentGenerator, PostGenConfig, PostGenerator, UserGenConfig,
        UserGenerator,
    };
    pub use crate::models::{Comment, Gender, Post, User};
    pub use foundry::prelude::*;
}
