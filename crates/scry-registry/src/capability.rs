//! Typed capability accessors.

use crate::error::{RegistryError, RegistryResult};
use crate::feature::Feature;

/// A capability value crossing the feature boundary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CapabilityValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl CapabilityValue {
    pub fn as_bool(self, key: &'static str) -> RegistryResult<bool> {
        match self {
            Self::Bool(v) => Ok(v),
            _ => Err(RegistryError::TypeMismatch { key }),
        }
    }

    pub fn as_int(self, key: &'static str) -> RegistryResult<i64> {
        match self {
            Self::Int(v) => Ok(v),
            _ => Err(RegistryError::TypeMismatch { key }),
        }
    }

    pub fn as_float(self, key: &'static str) -> RegistryResult<f64> {
        match self {
            Self::Float(v) => Ok(v),
            _ => Err(RegistryError::TypeMismatch { key }),
        }
    }
}

type Getter = Box<dyn Fn(&dyn Feature) -> RegistryResult<CapabilityValue>>;
type Setter = Box<dyn Fn(&mut dyn Feature, CapabilityValue) -> RegistryResult<()>>;

/// One registered accessor/mutator pair, bound to the concrete feature
/// type that supplied it at registration time.
pub(crate) struct CapabilityEntry {
    feature: &'static str,
    get: Getter,
    set: Setter,
}

impl CapabilityEntry {
    pub(crate) fn new<F: Feature + 'static>(
        feature: &'static str,
        key: &'static str,
        get: impl Fn(&F) -> CapabilityValue + 'static,
        set: impl Fn(&mut F, CapabilityValue) -> RegistryResult<()> + 'static,
    ) -> Self {
        Self {
            feature,
            get: Box::new(move |f| {
                f.as_any()
                    .downcast_ref::<F>()
                    .map(&get)
                    .ok_or(RegistryError::WrongFeature { key, feature })
            }),
            set: Box::new(move |f, value| {
                let feature_ref = f
                    .as_any_mut()
                    .downcast_mut::<F>()
                    .ok_or(RegistryError::WrongFeature { key, feature })?;
                set(feature_ref, value)
            }),
        }
    }

    pub(crate) const fn feature(&self) -> &'static str {
        self.feature
    }

    pub(crate) fn get(&self, feature: &dyn Feature) -> RegistryResult<CapabilityValue> {
        (self.get)(feature)
    }

    pub(crate) fn set(
        &self,
        feature: &mut dyn Feature,
        value: CapabilityValue,
    ) -> RegistryResult<()> {
        (self.set)(feature, value)
    }
}
