//! Database integration for seeding fixtures.
//!
//! The [`Seeder`] flushes records collected by foundry's in-memory store
//! into PostgreSQL in batches.

mod seeder;

pub use seeder::{SeedError, Seeder, count_by_model};
