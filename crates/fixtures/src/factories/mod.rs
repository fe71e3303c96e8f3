//! Foundry factories for the blog entities.
//!
//! - [`UserGenerator`]: users with optional demographics
//! - [`PostGenerator`]: posts with an author and nested comments
//! - [`CommentGenerator`]: comments with an author

pub mod comment;
pub mod post;
pub mod user;

pub use comment::{CommentGenConfig, CommentGenerator};
pub use post::{PostGenConfig, PostGenerator};
pub use user::{UserGenConfig, UserGenerator};

use foundry::{AttributeValue, Faker};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::warn;

/// RFC 3339 attribute for a moment up to `max_days_ago` days in the past.
pub(crate) fn recent_timestamp(faker: &mut Faker, max_days_ago: i64) -> AttributeValue {
    let seconds_ago = faker.number_between(0, max_days_ago.max(0) * 86_400);
    timestamp(OffsetDateTime::now_utc() - Duration::seconds(seconds_ago))
}

/// RFC 3339 attribute for `at`, or null when `at` has no RFC 3339 form.
pub(crate) fn timestamp(at: OffsetDateTime) -> AttributeValue {
    match at.format(&Rfc3339) {
        Ok(text) => AttributeValue::from(text),
        Err(err) => {
            warn!(%at, error = %err, "timestamp cannot be formatted as RFC 3339");
            AttributeValue::Plain(Value::Null)
        }
    }
}

#[cfg(test)]
mod tests {
    use time::UtcOffset;

    use super::*;

    #[test]
    fn test_recent_timestamp_parses_back() {
        let mut faker = Faker::seeded(1);
        let value = recent_timestamp(&mut faker, 30);
        let text = value.as_plain().and_then(Value::as_str).unwrap();

        let parsed = OffsetDateTime::parse(text, &Rfc3339).unwrap();
        assert!(parsed <= OffsetDateTime::now_utc());
        assert!(parsed >= OffsetDateTime::now_utc() - Duration::days(31));
    }

    #[test]
    fn test_unformattable_timestamp_is_null() {
        // RFC 3339 offsets carry no seconds.
        let offset = UtcOffset::from_hms(1, 0, 30).unwrap();
        let value = timestamp(OffsetDateTime::now_utc().to_offset(offset));
        assert_eq!(value.as_plain(), Some(&Value::Null));
    }
}
