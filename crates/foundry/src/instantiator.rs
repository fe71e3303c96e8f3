//! Default strategy for turning resolved attributes into objects.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::attributes::ResolvedAttributes;
use crate::error::{FoundryError, FoundryResult};

/// Builds objects by deserializing the resolved attribute map.
///
/// Attributes the target type does not carry are rejected unless
/// [`Instantiator::allow_extra_attributes`] is set, so typos in factory
/// definitions surface instead of silently vanishing.
#[derive(Debug, Clone, Default)]
pub struct Instantiator {
    allow_extra_attributes: bool,
}

impl Instantiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignores attributes that have no matching field.
    pub fn allow_extra_attributes(mut self) -> Self {
        self.allow_extra_attributes = true;
        self
    }

    pub fn allows_extra_attributes(&self) -> bool {
        self.allow_extra_attributes
    }

    pub fn instantiate<T>(&self, attributes: &ResolvedAttributes, model: &str) -> FoundryResult<T>
    where
        T: DeserializeOwned,
    {
        let value = Value::Object(attributes.clone());
        let instantiation_error = |source: serde_json::Error| FoundryError::Instantiation {
            model: model.to_string(),
            source,
        };

        if self.allow_extra_attributes {
            return serde_json::from_value(value).map_err(instantiation_error);
        }

        // Only top-level keys count; nested objects were built by their own
        // factories.
        let mut extra = Vec::new();
        let object = serde_ignored::deserialize(value, |path| {
            if let serde_ignored::Path::Map {
                parent: serde_ignored::Path::Root,
                key,
            } = path
            {
                extra.push(key);
            }
        })
        .map_err(instantiation_error)?;

        if extra.is_empty() {
            Ok(object)
        } else {
            Err(FoundryError::ExtraAttributes {
                model: model.to_string(),
                attributes: extra,
            })
        }
    }
}
