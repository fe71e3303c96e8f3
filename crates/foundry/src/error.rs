//! Error types for factory resolution and persistence.

use thiserror::Error;

use crate::store::RecordId;

#[derive(Debug, Error)]
pub enum FoundryError {
    #[error(
        "Foundry is not yet booted: call foundry::boot() or give the factory a configuration"
    )]
    NotBooted,

    #[error("before instantiate hook must return attributes: {message}")]
    InvalidHook { message: String },

    #[error("Cannot instantiate {model}: unknown attributes {attributes:?}")]
    ExtraAttributes {
        model: String,
        attributes: Vec<String>,
    },

    #[error("Cannot instantiate {model}: {source}")]
    Instantiation {
        model: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persistence error for {model}: {message}")]
    Persistence { model: String, message: String },

    #[error("{model} record {id} no longer exists")]
    RecordMissing { model: String, id: RecordId },

    #[error("{model} has not been persisted")]
    NotPersisted { model: String },
}

impl FoundryError {
    /// Builds an [`FoundryError::InvalidHook`] for a before-instantiate hook.
    pub fn invalid_hook(message: impl Into<String>) -> Self {
        Self::InvalidHook {
            message: message.into(),
        }
    }

    /// Builds a [`FoundryError::Persistence`] from any displayable store error.
    pub fn persistence(model: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            model: model.into(),
            message: err.to_string(),
        }
    }

    /// Returns true for contract violations that no retry can fix.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            FoundryError::NotBooted
                | FoundryError::InvalidHook { .. }
                | FoundryError::ExtraAttributes { .. }
        )
    }
}

pub type FoundryResult<T> = Result<T, FoundryError>;
