//! Factory configuration and the process-wide default registry.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::{FoundryError, FoundryResult};
use crate::faker::{Faker, FakerSource};
use crate::instantiator::Instantiator;
use crate::store::{InMemoryStore, Persister};

/// Collaborators a factory needs while it builds objects.
pub struct Configuration {
    faker: FakerSource,
    seed: Option<u64>,
    instantiator: Instantiator,
    persister: Arc<dyn Persister>,
    auto_refresh: bool,
}

impl Configuration {
    /// Entropy-seeded faker, strict instantiator, fresh [`InMemoryStore`],
    /// auto-refresh enabled.
    pub fn new() -> Self {
        Self {
            faker: FakerSource::from_entropy(),
            seed: None,
            instantiator: Instantiator::default(),
            persister: Arc::new(InMemoryStore::new()),
            auto_refresh: true,
        }
    }

    /// Seeds the faker so generated data repeats between runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.faker = FakerSource::seeded(seed);
        self.seed = Some(seed);
        self
    }

    /// Sets the instantiator used by factories without their own.
    pub fn with_instantiator(mut self, instantiator: Instantiator) -> Self {
        self.instantiator = instantiator;
        self
    }

    pub fn with_persister(mut self, persister: Arc<dyn Persister>) -> Self {
        self.persister = persister;
        self
    }

    /// Handles start with auto-refresh disabled.
    pub fn without_auto_refresh(mut self) -> Self {
        self.auto_refresh = false;
        self
    }

    /// Draws a generator handle for one resolution pass.
    pub fn faker(&self) -> Faker {
        self.faker.generate()
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn instantiator(&self) -> &Instantiator {
        &self.instantiator
    }

    pub fn persister(&self) -> Arc<dyn Persister> {
        Arc::clone(&self.persister)
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("seed", &self.seed)
            .field("instantiator", &self.instantiator)
            .field("auto_refresh", &self.auto_refresh)
            .finish_non_exhaustive()
    }
}

static CONFIGURATION: RwLock<Option<Arc<Configuration>>> = RwLock::new(None);

/// Installs the process-wide default configuration, replacing any previous one.
pub fn boot(configuration: Configuration) -> Arc<Configuration> {
    let configuration = Arc::new(configuration);
    debug!(seed = ?configuration.seed, "booting foundry");
    *CONFIGURATION.write().unwrap_or_else(PoisonError::into_inner) =
        Some(Arc::clone(&configuration));
    configuration
}

pub fn is_booted() -> bool {
    CONFIGURATION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

/// Returns the booted configuration.
pub fn configuration() -> FoundryResult<Arc<Configuration>> {
    CONFIGURATION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or(FoundryError::NotBooted)
}

/// Clears the process-wide configuration, for test isolation.
pub fn shutdown() {
    debug!("shutting down foundry");
    *CONFIGURATION.write().unwrap_or_else(PoisonError::into_inner) = None;
}
