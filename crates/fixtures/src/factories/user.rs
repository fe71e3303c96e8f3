//! User factory with demographics.

use foundry::{Attributes, Factory, Faker};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde_json::Value;

use super::recent_timestamp;
use crate::models::{Gender, User};

/// Attribute value of a gender, in the model's own serde representation.
fn gender_value(gender: Gender) -> Value {
    // Unit variants always serialize.
    serde_json::to_value(gender).unwrap_or(Value::Null)
}

/// Configuration for user generation.
#[derive(Debug, Clone)]
pub struct UserGenConfig {
    /// Distribution of genders (male, female, other, prefer_not_to_say).
    pub gender_distribution: [f64; 4],
    /// Mean birth year.
    pub birth_year_mean: i32,
    /// Standard deviation of birth year.
    pub birth_year_std: f64,
    /// Probability that demographics are filled in.
    pub demographics_fill_rate: f64,
    /// Accounts are created up to this many days ago.
    pub max_account_age_days: i64,
}

impl Default for UserGenConfig {
    fn default() -> Self {
        Self {
            gender_distribution: [0.48, 0.46, 0.02, 0.04], // M, F, Other, PrefNot
            birth_year_mean: 1988,
            birth_year_std: 12.0,
            demographics_fill_rate: 0.7,
            max_account_age_days: 730,
        }
    }
}

/// Builds user factories.
pub struct UserGenerator {
    config: UserGenConfig,
}

impl UserGenerator {
    /// Creates a new user generator with default configuration.
    pub fn new() -> Self {
        Self {
            config: UserGenConfig::default(),
        }
    }

    /// Creates a generator with custom configuration.
    pub fn with_config(config: UserGenConfig) -> Self {
        Self { config }
    }

    /// Factory producing users with fresh random attributes on every build.
    pub fn factory(&self) -> Factory<User> {
        let config = self.config.clone();
        Factory::generated(move |faker| generate_attributes(&config, faker))
    }
}

impl Default for UserGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_attributes(config: &UserGenConfig, faker: &mut Faker) -> Attributes {
    let name = faker.name();
    let email = generate_email(&name, faker);

    let (gender, birth_year) = if faker.r#gen::<f64>() < config.demographics_fill_rate {
        (
            gender_value(generate_gender(config, faker)),
            Value::from(generate_birth_year(config, faker)),
        )
    } else {
        (Value::Null, Value::Null)
    };

    Attributes::new()
        .set("id", faker.uuid().to_string())
        .set("name", name)
        .set("email", email)
        .set("gender", gender)
        .set("birth_year", birth_year)
        .set(
            "created_at",
            recent_timestamp(faker, config.max_account_age_days),
        )
}

/// Generates an email from a name.
fn generate_email(name: &str, faker: &mut Faker) -> String {
    let normalized: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(".");

    let suffix: u32 = faker.gen_range(1..9999);
    format!("{normalized}{suffix}@example.com")
}

/// Generates a gender based on configured distribution.
fn generate_gender(config: &UserGenConfig, faker: &mut Faker) -> Gender {
    let roll: f64 = faker.r#gen();
    let mut cumulative = 0.0;

    for (i, &weight) in config.gender_distribution.iter().enumerate() {
        cumulative += weight;
        if roll < cumulative {
            return match i {
                0 => Gender::Male,
                1 => Gender::Female,
                2 => Gender::Other,
                _ => Gender::PreferNotToSay,
            };
        }
    }

    Gender::PreferNotToSay
}

/// Generates a birth year based on configured distribution.
fn generate_birth_year(config: &UserGenConfig, faker: &mut Faker) -> i32 {
    let Ok(normal) = Normal::new(config.birth_year_mean as f64, config.birth_year_std) else {
        return config.birth_year_mean;
    };

    let year = normal.sample(faker) as i32;
    // Adults only
    year.clamp(1940, 2006)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use foundry::{Configuration, InMemoryStore};

    use super::*;

    fn configuration() -> Arc<Configuration> {
        Arc::new(
            Configuration::new()
                .with_seed(3)
                .with_persister(Arc::new(InMemoryStore::new())),
        )
    }

    #[test]
    fn test_generate_user() {
        let user = UserGenerator::new()
            .factory()
            .with_configuration(configuration())
            .create(Attributes::new())
            .unwrap();

        assert!(!user.name.is_empty());
        assert!(user.email.ends_with("@example.com"));
        assert!(user.is_persisted());
    }

    #[test]
    fn test_generate_batch_unique_ids() {
        let users = UserGenerator::new()
            .factory()
            .with_configuration(configuration())
            .create_many(10, Attributes::new())
            .unwrap();

        assert_eq!(users.len(), 10);

        let ids: std::collections::HashSet<_> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_demographics_respect_fill_rate() {
        let never = UserGenerator::with_config(UserGenConfig {
            demographics_fill_rate: 0.0,
            ..Default::default()
        });
        let always = UserGenerator::with_config(UserGenConfig {
            demographics_fill_rate: 1.0,
            ..Default::default()
        });
        let config = configuration();

        let bare = never
            .factory()
            .with_configuration(config.clone())
            .resolve(Attributes::new())
            .unwrap();
        assert!(bare.gender.is_none());
        assert!(bare.birth_year.is_none());

        let full = always
            .factory()
            .with_configuration(config)
            .resolve(Attributes::new())
            .unwrap();
        assert!(full.gender.is_some());
        let year = full.birth_year.unwrap();
        assert!((1940..=2006).contains(&year));
    }

    #[test]
    fn test_override_fixed_name() {
        let user = UserGenerator::new()
            .factory()
            .with_configuration(configuration())
            .create(Attributes::new().set("name", "Ada Lovelace"))
            .unwrap();
        assert_eq!(user.name, "Ada Lovelace");
    }

    #[test]
    fn test_gender_value_matches_model_serde() {
        for gender in [
            Gender::Male,
            Gender::Female,
            Gender::Other,
            Gender::PreferNotToSay,
        ] {
            let back: Gender = serde_json::from_value(gender_value(gender)).unwrap();
            assert_eq!(back, gender);
        }
        assert_eq!(
            gender_value(Gender::PreferNotToSay),
            Value::from("prefer_not_to_say")
        );
    }
}
