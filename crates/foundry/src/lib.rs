//! Layered test-data factories.
//!
//! A [`Factory`] collects attribute layers and lifecycle hooks and turns them
//! into constructed, optionally persisted objects wrapped in a [`Handle`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use foundry::prelude::*;
//!
//! foundry::boot(Configuration::new().with_seed(42));
//!
//! let users = Factory::<User>::generated(|faker| {
//!     Attributes::new()
//!         .set("name", faker.name())
//!         .set("email", faker.email())
//! });
//! let posts = Factory::<Post>::generated(|faker| {
//!     Attributes::new().set("title", faker.sentence(3..6))
//! })
//! .with_attributes(Attributes::new().set("author", &users));
//!
//! let post = posts.create(Attributes::new().set("title", "Hello"))?;
//! let drafts = posts.without_persisting().create_many(5, Attributes::new())?;
//! ```

pub mod attributes;
pub mod config;
pub mod error;
pub mod factory;
pub mod faker;
pub mod handle;
pub mod instantiator;
pub mod model;
pub mod store;
pub mod value;

pub use attributes::{AttributeLayer, Attributes, ResolvedAttributes};
pub use config::{Configuration, boot, configuration, is_booted, shutdown};
pub use error::{FoundryError, FoundryResult};
pub use factory::Factory;
pub use faker::Faker;
pub use handle::Handle;
pub use instantiator::Instantiator;
pub use model::Model;
pub use store::{InMemoryStore, Persister, RecordId, StoredRecord};
pub use value::AttributeValue;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::{
        AttributeLayer, AttributeValue, Attributes, Configuration, Factory, Faker, FoundryError,
        FoundryResult, Handle, InMemoryStore, Instantiator, Model, Persister, ResolvedAttributes,
    };
}
