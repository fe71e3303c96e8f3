//! Attribute values and their resolution into plain JSON.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::Configuration;
use crate::error::FoundryResult;
use crate::factory::Factory;
use crate::handle::Handle;
use crate::model::Model;

/// A factory whose target type has been erased, usable as an attribute.
pub trait NestedFactory: Send + Sync {
    fn target_type(&self) -> &'static str;

    /// Constructs one object, persisting it when `persist` is true, and
    /// returns it as a plain value.
    fn build_value(&self, persist: bool, configuration: &Arc<Configuration>)
    -> FoundryResult<Value>;
}

/// An already constructed object whose type has been erased.
pub trait BuiltObject: Send + Sync {
    fn target_type(&self) -> &'static str;

    fn object_value(&self) -> FoundryResult<Value>;
}

/// One attribute as supplied to a factory.
#[derive(Clone)]
pub enum AttributeValue {
    /// Used as-is.
    Plain(Value),
    /// Built on demand while the owning object is resolved.
    Nested(Arc<dyn NestedFactory>),
    /// Resolved element by element; order and length are kept.
    Sequence(Vec<AttributeValue>),
    /// Unwrapped to the object the handle owns.
    Built(Arc<dyn BuiltObject>),
}

impl AttributeValue {
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<AttributeValue>,
    {
        AttributeValue::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Returns the plain value, if this attribute needs no resolution.
    pub fn as_plain(&self) -> Option<&Value> {
        match self {
            AttributeValue::Plain(value) => Some(value),
            _ => None,
        }
    }

    /// Resolves this attribute into a plain value.
    ///
    /// `persist` is the mode of the object being built; nested factories
    /// inherit it.
    pub(crate) fn resolve(
        &self,
        persist: bool,
        configuration: &Arc<Configuration>,
    ) -> FoundryResult<Value> {
        match self {
            AttributeValue::Plain(value) => Ok(value.clone()),
            AttributeValue::Built(object) => object.object_value(),
            AttributeValue::Sequence(items) => items
                .iter()
                .map(|item| item.resolve(persist, configuration))
                .collect::<FoundryResult<Vec<_>>>()
                .map(Value::Array),
            AttributeValue::Nested(factory) => factory.build_value(persist, configuration),
        }
    }
}

impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Plain(value) => f.debug_tuple("Plain").field(value).finish(),
            AttributeValue::Nested(factory) => {
                f.debug_tuple("Nested").field(&factory.target_type()).finish()
            }
            AttributeValue::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            AttributeValue::Built(object) => {
                f.debug_tuple("Built").field(&object.target_type()).finish()
            }
        }
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        AttributeValue::Plain(value)
    }
}

macro_rules! plain_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AttributeValue {
                fn from(value: $ty) -> Self {
                    AttributeValue::Plain(Value::from(value))
                }
            }
        )*
    };
}

plain_from!(&str, String, bool, i32, i64, u32, u64, f32, f64);

impl<T: Model> From<Factory<T>> for AttributeValue {
    fn from(factory: Factory<T>) -> Self {
        AttributeValue::Nested(Arc::new(factory))
    }
}

impl<T: Model> From<&Factory<T>> for AttributeValue {
    fn from(factory: &Factory<T>) -> Self {
        AttributeValue::Nested(Arc::new(factory.clone()))
    }
}

impl<T: Model> From<Handle<T>> for AttributeValue {
    fn from(handle: Handle<T>) -> Self {
        AttributeValue::Built(Arc::new(handle))
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(items: Vec<AttributeValue>) -> Self {
        AttributeValue::Sequence(items)
    }
}
