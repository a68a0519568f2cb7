//! Registry error types.

use thiserror::Error;

/// Registry error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No feature registered under this name.
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// A feature with this name is already registered.
    #[error("duplicate feature: {0}")]
    DuplicateFeature(&'static str),

    /// No capability registered under this key.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// A capability with this key is already registered.
    #[error("duplicate capability: {0}")]
    DuplicateCapability(&'static str),

    /// The value's type does not match the capability's accessor pair.
    #[error("type mismatch for capability {key}")]
    TypeMismatch { key: &'static str },

    /// A capability's accessor was registered against a different concrete
    /// feature type than the one living under its feature name.
    #[error("capability {key} does not belong to feature {feature}")]
    WrongFeature {
        key: &'static str,
        feature: &'static str,
    },
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
