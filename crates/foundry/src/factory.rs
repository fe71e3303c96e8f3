//! Immutable factory builder and the attribute-resolution pipeline.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::attributes::{AttributeLayer, Attributes, ResolvedAttributes, merge_layers};
use crate::config::{self, Configuration};
use crate::error::{FoundryError, FoundryResult};
use crate::faker::Faker;
use crate::handle::Handle;
use crate::model::Model;
use crate::value::{AttributeValue, NestedFactory};

pub type InstantiatorFn<T> = dyn Fn(&ResolvedAttributes, &str) -> FoundryResult<T> + Send + Sync;
pub type BeforeInstantiateFn = dyn Fn(Attributes) -> FoundryResult<Attributes> + Send + Sync;
pub type AfterInstantiateFn<T> = dyn Fn(&mut T, &ResolvedAttributes) + Send + Sync;
pub type AfterPersistFn<T> = dyn Fn(&mut T, &ResolvedAttributes) + Send + Sync;

/// Describes how to build, and optionally persist, objects of type `T`.
///
/// Every builder method returns a new factory and leaves the receiver
/// untouched, so a base factory can be shared between tests.
///
/// ```rust,ignore
/// let users = Factory::<User>::generated(|faker| {
///     Attributes::new().set("name", faker.name()).set("email", faker.email())
/// });
///
/// let admin = users.with_attributes(Attributes::new().set("role", "admin"));
/// let handle = admin.create(Attributes::new().set("name", "Root"))?;
/// ```
pub struct Factory<T: Model> {
    layers: Vec<AttributeLayer>,
    instantiator: Option<Arc<InstantiatorFn<T>>>,
    persist: bool,
    before_instantiate: Vec<Arc<BeforeInstantiateFn>>,
    after_instantiate: Vec<Arc<AfterInstantiateFn<T>>>,
    after_persist: Vec<Arc<AfterPersistFn<T>>>,
    configuration: Option<Arc<Configuration>>,
}

impl<T: Model> Clone for Factory<T> {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
            instantiator: self.instantiator.clone(),
            persist: self.persist,
            before_instantiate: self.before_instantiate.clone(),
            after_instantiate: self.after_instantiate.clone(),
            after_persist: self.after_persist.clone(),
            configuration: self.configuration.clone(),
        }
    }
}

impl<T: Model> Default for Factory<T> {
    fn default() -> Self {
        Self::new(Attributes::new())
    }
}

impl<T: Model> Factory<T> {
    /// Creates a factory with one default attribute layer.
    pub fn new(defaults: impl Into<AttributeLayer>) -> Self {
        Self {
            layers: vec![defaults.into()],
            instantiator: None,
            persist: true,
            before_instantiate: Vec::new(),
            after_instantiate: Vec::new(),
            after_persist: Vec::new(),
            configuration: None,
        }
    }

    /// Creates a factory whose defaults are generated on every build.
    pub fn generated<F>(generator: F) -> Self
    where
        F: Fn(&mut Faker) -> Attributes + Send + Sync + 'static,
    {
        Self::new(AttributeLayer::generated(generator))
    }

    pub fn target_type(&self) -> &'static str {
        T::NAME
    }

    pub fn is_persisting(&self) -> bool {
        self.persist
    }

    fn with(&self, change: impl FnOnce(&mut Self)) -> Self {
        let mut cloned = self.clone();
        change(&mut cloned);
        cloned
    }

    /// Adds an attribute layer that overrides all earlier ones.
    pub fn with_attributes(&self, attributes: impl Into<AttributeLayer>) -> Self {
        let layer = attributes.into();
        self.with(|f| f.layers.push(layer))
    }

    /// Adds a generated attribute layer.
    pub fn with_generated<F>(&self, generator: F) -> Self
    where
        F: Fn(&mut Faker) -> Attributes + Send + Sync + 'static,
    {
        self.with_attributes(AttributeLayer::generated(generator))
    }

    /// Transforms the merged attributes before nested values are resolved.
    pub fn before_instantiate<F>(&self, hook: F) -> Self
    where
        F: Fn(Attributes) -> FoundryResult<Attributes> + Send + Sync + 'static,
    {
        self.with(|f| f.before_instantiate.push(Arc::new(hook)))
    }

    pub fn after_instantiate<F>(&self, hook: F) -> Self
    where
        F: Fn(&mut T, &ResolvedAttributes) + Send + Sync + 'static,
    {
        self.with(|f| f.after_instantiate.push(Arc::new(hook)))
    }

    /// Runs after the object is stored, without auto-refresh. Changes made by
    /// the hook are saved afterwards.
    pub fn after_persist<F>(&self, hook: F) -> Self
    where
        F: Fn(&mut T, &ResolvedAttributes) + Send + Sync + 'static,
    {
        self.with(|f| f.after_persist.push(Arc::new(hook)))
    }

    /// Replaces the configured instantiator for this factory.
    pub fn instantiate_with<F>(&self, instantiator: F) -> Self
    where
        F: Fn(&ResolvedAttributes, &str) -> FoundryResult<T> + Send + Sync + 'static,
    {
        self.with(|f| f.instantiator = Some(Arc::new(instantiator)))
    }

    /// Builds without persisting, including every nested factory.
    pub fn without_persisting(&self) -> Self {
        self.with(|f| f.persist = false)
    }

    /// Uses `configuration` instead of the booted one.
    pub fn with_configuration(&self, configuration: Arc<Configuration>) -> Self {
        self.with(|f| f.configuration = Some(configuration))
    }

    /// `count` nested copies of this factory, for one-to-many attributes.
    pub fn many(&self, count: usize) -> AttributeValue {
        AttributeValue::Sequence((0..count).map(|_| AttributeValue::from(self)).collect())
    }

    /// Builds one object without persisting it.
    ///
    /// Nested factories follow this factory's own persistence setting.
    pub fn resolve(&self, overrides: impl Into<AttributeLayer>) -> FoundryResult<Handle<T>> {
        let configuration = self.configuration()?;
        let (handle, _) = self.instantiate(&overrides.into(), self.persist, &configuration)?;
        Ok(handle)
    }

    /// Builds one object and, unless disabled, persists it.
    pub fn create(&self, overrides: impl Into<AttributeLayer>) -> FoundryResult<Handle<T>> {
        let configuration = self.configuration()?;
        self.create_with(&overrides.into(), self.persist, &configuration)
    }

    /// Calls [`Factory::create`] `count` times with the same overrides.
    pub fn create_many(
        &self,
        count: usize,
        overrides: impl Into<AttributeLayer>,
    ) -> FoundryResult<Vec<Handle<T>>> {
        let overrides = overrides.into();
        let configuration = self.configuration()?;
        debug!(model = T::NAME, count, "creating many");

        (0..count)
            .map(|_| self.create_with(&overrides, self.persist, &configuration))
            .collect()
    }

    fn configuration(&self) -> FoundryResult<Arc<Configuration>> {
        match &self.configuration {
            Some(configuration) => Ok(Arc::clone(configuration)),
            None => config::configuration(),
        }
    }

    fn create_with(
        &self,
        overrides: &AttributeLayer,
        persist: bool,
        configuration: &Arc<Configuration>,
    ) -> FoundryResult<Handle<T>> {
        if !persist {
            let (handle, _) = self.instantiate(overrides, false, configuration)?;
            return Ok(handle);
        }

        let (mut handle, attributes) = self.instantiate(overrides, true, configuration)?;
        handle.persist()?;

        if self.after_persist.is_empty() {
            return Ok(handle);
        }

        handle.without_auto_refresh(|handle| -> FoundryResult<()> {
            for hook in &self.after_persist {
                trace!(model = T::NAME, "running after persist hook");
                handle.execute_callback(
                    |object, attributes| hook(object, attributes),
                    &attributes,
                )?;
            }
            Ok(())
        })?;
        handle.save()?;

        Ok(handle)
    }

    fn instantiate(
        &self,
        overrides: &AttributeLayer,
        persist: bool,
        configuration: &Arc<Configuration>,
    ) -> FoundryResult<(Handle<T>, ResolvedAttributes)> {
        debug!(model = T::NAME, persist, "instantiating");

        let mut faker = configuration.faker();
        let mut attributes =
            merge_layers(self.layers.iter().chain(std::iter::once(overrides)), &mut faker);
        trace!(model = T::NAME, keys = attributes.len(), "merged attribute layers");

        for hook in &self.before_instantiate {
            attributes = hook(attributes)?;
        }

        let resolved = attributes
            .into_iter()
            .map(|(key, value)| {
                let value = value.resolve(persist, configuration)?;
                Ok::<_, FoundryError>((key, value))
            })
            .collect::<FoundryResult<ResolvedAttributes>>()?;

        let mut object = match &self.instantiator {
            Some(instantiator) => instantiator(&resolved, T::NAME)?,
            None => configuration
                .instantiator()
                .instantiate::<T>(&resolved, T::NAME)?,
        };

        for hook in &self.after_instantiate {
            hook(&mut object, &resolved);
        }

        let handle = Handle::new(object, configuration.persister(), configuration.auto_refresh());
        Ok((handle, resolved))
    }
}

impl<T: Model> NestedFactory for Factory<T> {
    fn target_type(&self) -> &'static str {
        T::NAME
    }

    fn build_value(
        &self,
        persist: bool,
        configuration: &Arc<Configuration>,
    ) -> FoundryResult<Value> {
        let configuration = self.configuration.as_ref().unwrap_or(configuration);
        let handle = self.create_with(&AttributeLayer::default(), persist, configuration)?;
        Ok(serde_json::to_value(handle.object())?)
    }
}

impl<T: Model> fmt::Debug for Factory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("model", &T::NAME)
            .field("layers", &self.layers)
            .field("persist", &self.persist)
            .field("custom_instantiator", &self.instantiator.is_some())
            .field("before_instantiate", &self.before_instantiate.len())
            .field("after_instantiate", &self.after_instantiate.len())
            .field("after_persist", &self.after_persist.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FoundryError;
    use crate::store::InMemoryStore;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Author {
        name: String,
    }

    impl Model for Author {
        const NAME: &'static str = "author";
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Book {
        title: String,
        author: Author,
        #[serde(default)]
        reviewers: Vec<Author>,
    }

    impl Model for Book {
        const NAME: &'static str = "book";
    }

    fn setup() -> (Arc<InMemoryStore>, Arc<Configuration>) {
        let store = Arc::new(InMemoryStore::new());
        let config = Arc::new(
            Configuration::new()
                .with_seed(42)
                .with_persister(store.clone()),
        );
        (store, config)
    }

    fn authors(config: &Arc<Configuration>) -> Factory<Author> {
        Factory::new(Attributes::new().set("name", "A")).with_configuration(config.clone())
    }

    #[test]
    fn test_later_layer_overrides_earlier() {
        let (_, config) = setup();
        let factory = authors(&config).with_attributes(Attributes::new().set("name", "B"));

        let author = factory.create(Attributes::new()).unwrap();
        assert_eq!(author.object().name, "B");
    }

    #[test]
    fn test_call_site_override_wins() {
        let (_, config) = setup();
        let factory = authors(&config).with_attributes(Attributes::new().set("name", "B"));

        let author = factory.create(Attributes::new().set("name", "C")).unwrap();
        assert_eq!(author.name, "C");
    }

    #[test]
    fn test_builders_leave_receiver_untouched() {
        let (_, config) = setup();
        let base = authors(&config);
        let _derived = base
            .with_attributes(Attributes::new().set("name", "B"))
            .without_persisting()
            .after_instantiate(|author, _| author.name.push('!'));

        let author = base.create(Attributes::new()).unwrap();
        assert_eq!(author.name, "A");
        assert!(author.is_persisted());
        assert!(base.is_persisting());
    }

    #[test]
    fn test_create_persists_by_default() {
        let (store, config) = setup();
        let handle = authors(&config).create(Attributes::new()).unwrap();

        assert!(handle.is_persisted());
        assert_eq!(store.records("author"), vec![json!({"name": "A"})]);
    }

    #[test]
    fn test_without_persisting_skips_store() {
        let (store, config) = setup();
        let handle = authors(&config)
            .without_persisting()
            .create(Attributes::new())
            .unwrap();

        assert!(!handle.is_persisted());
        assert!(store.is_empty());
    }

    #[test]
    fn test_nested_factory_is_built_and_persisted() {
        let (store, config) = setup();
        let books = Factory::<Book>::new(
            Attributes::new()
                .set("title", "Dune")
                .set("author", authors(&config)),
        )
        .with_configuration(config.clone());

        let book = books.create(Attributes::new()).unwrap();
        assert_eq!(book.author.name, "A");
        assert_eq!(store.count("author"), 1);
        assert_eq!(store.count("book"), 1);

        let order: Vec<String> = store.snapshot().into_iter().map(|r| r.model).collect();
        assert_eq!(order, ["author", "book"]);
    }

    #[test]
    fn test_unpersisted_root_does_not_persist_nested() {
        let (store, config) = setup();
        let nested = authors(&config);
        assert!(nested.is_persisting());

        let books = Factory::<Book>::new(
            Attributes::new()
                .set("title", "Dune")
                .set("author", nested),
        )
        .with_configuration(config.clone())
        .without_persisting();

        let book = books.create(Attributes::new()).unwrap();
        assert_eq!(book.author.name, "A");
        assert!(store.is_empty());
    }

    #[test]
    fn test_persisting_root_persists_unpersisted_nested_factory() {
        let (store, config) = setup();
        let nested = authors(&config).without_persisting();
        assert!(!nested.is_persisting());

        let books = Factory::<Book>::new(
            Attributes::new()
                .set("title", "Dune")
                .set("author", nested),
        )
        .with_configuration(config.clone());

        let book = books.create(Attributes::new()).unwrap();
        assert_eq!(book.author.name, "A");
        assert_eq!(store.count("author"), 1);

        let order: Vec<String> = store.snapshot().into_iter().map(|r| r.model).collect();
        assert_eq!(order, ["author", "book"]);
    }

    #[test]
    fn test_handles_inside_sequence_are_unwrapped() {
        let (store, config) = setup();
        let first = authors(&config)
            .create(Attributes::new().set("name", "Irulan"))
            .unwrap();
        let second = authors(&config)
            .create(Attributes::new().set("name", "Leto"))
            .unwrap();
        let books = Factory::<Book>::new(
            Attributes::new()
                .set("title", "Dune")
                .set("author", authors(&config)),
        )
        .with_configuration(config.clone());

        let book = books
            .create(Attributes::new().set("reviewers", AttributeValue::sequence([first, second])))
            .unwrap();

        let names: Vec<&str> = book.reviewers.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Irulan", "Leto"]);
        // Two existing reviewers plus the nested author.
        assert_eq!(store.count("author"), 3);
    }

    #[test]
    fn test_resolve_never_persists_root() {
        let (store, config) = setup();
        let books = Factory::<Book>::new(
            Attributes::new()
                .set("title", "Dune")
                .set("author", authors(&config)),
        )
        .with_configuration(config.clone());

        let book = books.resolve(Attributes::new()).unwrap();
        assert!(!book.is_persisted());
        assert_eq!(store.count("book"), 0);
        assert_eq!(store.count("author"), 1);
    }

    #[test]
    fn test_sequence_of_nested_factories() {
        let (store, config) = setup();
        let books = Factory::<Book>::new(
            Attributes::new()
                .set("title", "Dune")
                .set("author", authors(&config))
                .set("reviewers", authors(&config).many(3)),
        )
        .with_configuration(config.clone());

        let book = books.create(Attributes::new()).unwrap();
        assert_eq!(book.reviewers.len(), 3);
        assert_eq!(store.count("author"), 4);
    }

    #[test]
    fn test_built_handle_is_unwrapped() {
        let (store, config) = setup();
        let author = authors(&config)
            .create(Attributes::new().set("name", "Frank"))
            .unwrap();
        let books = Factory::<Book>::new(Attributes::new().set("title", "Dune"))
            .with_configuration(config.clone());

        let book = books
            .create(Attributes::new().set("author", author))
            .unwrap();
        assert_eq!(book.author.name, "Frank");
        assert_eq!(store.count("author"), 1);
    }

    #[test]
    fn test_before_hooks_chain_in_order() {
        let (_, config) = setup();
        let factory = authors(&config)
            .before_instantiate(|attrs| {
                let name = attrs.plain("name").and_then(|v| v.as_str()).unwrap_or("");
                let name = format!("{name}1");
                Ok(attrs.set("name", name))
            })
            .before_instantiate(|attrs| {
                let name = attrs.plain("name").and_then(|v| v.as_str()).unwrap_or("");
                let name = format!("{name}2");
                Ok(attrs.set("name", name))
            });

        let author = factory.create(Attributes::new()).unwrap();
        assert_eq!(author.name, "A12");
    }

    #[test]
    fn test_failing_before_hook_stops_pipeline() {
        let (store, config) = setup();
        let factory = authors(&config)
            .before_instantiate(|_| Err(FoundryError::invalid_hook("no attributes returned")));

        let err = factory.create(Attributes::new()).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(store.is_empty());
    }

    #[test]
    fn test_after_instantiate_hooks_see_same_object_in_order() {
        let (_, config) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let first = seen.clone();
        let second = seen.clone();

        let factory = authors(&config)
            .after_instantiate(move |author, attrs| {
                first
                    .lock()
                    .unwrap()
                    .push(format!("1:{}:{}", author.name, attrs["name"]));
                author.name.push('+');
            })
            .after_instantiate(move |author, attrs| {
                second
                    .lock()
                    .unwrap()
                    .push(format!("2:{}:{}", author.name, attrs["name"]));
            });

        let author = factory.create(Attributes::new()).unwrap();
        assert_eq!(author.name, "A+");
        assert_eq!(*seen.lock().unwrap(), ["1:A:\"A\"", "2:A+:\"A\""]);
    }

    #[test]
    fn test_after_persist_sees_memory_state_and_is_saved() {
        let (store, config) = setup();
        let factory = authors(&config)
            .after_instantiate(|author, _| author.name = "in-memory".to_string())
            .after_persist(|author, _| {
                assert_eq!(author.name, "in-memory");
                author.name = "after-persist".to_string();
            });

        let author = factory.create(Attributes::new()).unwrap();
        assert_eq!(author.name, "after-persist");
        assert!(author.is_auto_refreshing());
        assert_eq!(store.records("author"), vec![json!({"name": "after-persist"})]);
    }

    #[test]
    fn test_after_persist_not_run_without_persisting() {
        let (_, config) = setup();
        let factory = authors(&config)
            .without_persisting()
            .after_persist(|author, _| author.name = "persisted".to_string());

        let author = factory.create(Attributes::new()).unwrap();
        assert_eq!(author.name, "A");
    }

    #[test]
    fn test_create_many_reruns_generator() {
        let (store, config) = setup();
        let factory = Factory::<Author>::generated(|faker| {
            Attributes::new().set("name", faker.uuid().to_string())
        })
        .with_configuration(config.clone());

        let created = factory.create_many(3, Attributes::new()).unwrap();
        let names: std::collections::HashSet<_> =
            created.iter().map(|a| a.name.clone()).collect();

        assert_eq!(created.len(), 3);
        assert_eq!(names.len(), 3);
        assert_eq!(store.persist_calls(), 3);
        assert_eq!(store.count("author"), 3);
    }

    #[test]
    fn test_custom_instantiator_receives_target_type() {
        let (_, config) = setup();
        let factory = authors(&config).instantiate_with(|attrs, target| {
            Ok(Author {
                name: format!("{target}:{}", attrs["name"].as_str().unwrap_or_default()),
            })
        });

        let author = factory.create(Attributes::new()).unwrap();
        assert_eq!(author.name, "author:A");
    }

    #[test]
    fn test_nested_failure_propagates() {
        let (store, config) = setup();
        let broken = Factory::<Author>::new(Attributes::new()).with_configuration(config.clone());
        let books = Factory::<Book>::new(
            Attributes::new()
                .set("title", "Dune")
                .set("author", broken),
        )
        .with_configuration(config.clone());

        let err = books.create(Attributes::new()).unwrap_err();
        assert!(matches!(err, FoundryError::Instantiation { ref model, .. } if model == "author"));
        assert!(store.is_empty());
    }
}
