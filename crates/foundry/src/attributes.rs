//! Attribute maps and the layers factories merge them from.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::faker::Faker;
use crate::value::AttributeValue;

/// Fully resolved attributes, containing plain values only.
pub type ResolvedAttributes = Map<String, Value>;

/// Field name to value mapping, possibly holding nested factories.
#[derive(Debug, Clone, Default)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, replacing any previous value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// Plain value of `key`, if present and already plain.
    pub fn plain(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(AttributeValue::as_plain)
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, AttributeValue> {
        self.0.iter()
    }

    /// Overlays `other` on top of `self`; colliding keys take `other`'s
    /// value whole.
    pub fn merge(&mut self, other: Attributes) {
        self.0.extend(other.0);
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Attributes {
    type Item = (String, AttributeValue);
    type IntoIter = btree_map::IntoIter<String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<ResolvedAttributes> for Attributes {
    fn from(map: ResolvedAttributes) -> Self {
        map.into_iter().collect()
    }
}

pub type GeneratorFn = dyn Fn(&mut Faker) -> Attributes + Send + Sync;

/// One source of attribute values.
#[derive(Clone)]
pub enum AttributeLayer {
    Static(Attributes),
    /// Re-run on every resolution pass.
    Generated(Arc<GeneratorFn>),
}

impl AttributeLayer {
    pub fn generated<F>(generator: F) -> Self
    where
        F: Fn(&mut Faker) -> Attributes + Send + Sync + 'static,
    {
        AttributeLayer::Generated(Arc::new(generator))
    }

    pub(crate) fn normalize(&self, faker: &mut Faker) -> Attributes {
        match self {
            AttributeLayer::Static(attributes) => attributes.clone(),
            AttributeLayer::Generated(generator) => generator(faker),
        }
    }
}

impl Default for AttributeLayer {
    fn default() -> Self {
        AttributeLayer::Static(Attributes::new())
    }
}

impl From<Attributes> for AttributeLayer {
    fn from(attributes: Attributes) -> Self {
        AttributeLayer::Static(attributes)
    }
}

impl fmt::Debug for AttributeLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeLayer::Static(attributes) => f.debug_tuple("Static").field(attributes).finish(),
            AttributeLayer::Generated(_) => f.write_str("Generated(..)"),
        }
    }
}

/// Normalizes each layer with the shared faker and collapses them left to right.
pub(crate) fn merge_layers<'a, I>(layers: I, faker: &mut Faker) -> Attributes
where
    I: IntoIterator<Item = &'a AttributeLayer>,
{
    layers
        .into_iter()
        .fold(Attributes::new(), |mut merged, layer| {
            merged.merge(layer.normalize(faker));
            merged
        })
}
