//! Feature lifecycle and capability registry.
//!
//! Features are flat state machines registered into one table: no
//! inheritance hierarchy, no ambient globals, no reflection. Cross-feature
//! access goes through explicitly registered capability keys with typed
//! accessor/mutator pairs, and everything a feature needs at runtime
//! arrives through an [`AppContext`] passed by reference.

pub mod capability;
pub mod context;
pub mod error;
pub mod feature;

pub use capability::CapabilityValue;
pub use context::AppContext;
pub use error::{RegistryError, RegistryResult};
pub use feature::{Feature, FeatureRegistry};
