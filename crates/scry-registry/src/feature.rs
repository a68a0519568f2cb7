//! Flat feature registry.

use std::any::Any;

use hashbrown::HashMap;

use crate::capability::{CapabilityEntry, CapabilityValue};
use crate::context::AppContext;
use crate::error::{RegistryError, RegistryResult};

/// A toggleable feature: a three-method state machine, no base class.
///
/// Implementations keep their own enabled flag and flip it inside the
/// lifecycle hooks; the registry only drives transitions and never calls
/// `on_enable` on an already-enabled feature (or vice versa).
pub trait Feature {
    fn name(&self) -> &'static str;
    fn is_enabled(&self) -> bool;
    fn on_enable(&mut self, cx: &mut AppContext);
    fn on_disable(&mut self, cx: &mut AppContext);

    /// Downcast support for capability accessors.
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// One flat table of features plus their registered capabilities.
#[derive(Default)]
pub struct FeatureRegistry {
    features: HashMap<&'static str, Box<dyn Feature>>,
    capabilities: HashMap<&'static str, CapabilityEntry>,
}

impl FeatureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, feature: Box<dyn Feature>) -> RegistryResult<()> {
        let name = feature.name();
        if self.features.contains_key(name) {
            return Err(RegistryError::DuplicateFeature(name));
        }
        self.features.insert(name, feature);
        Ok(())
    }

    /// Register a typed accessor/mutator pair for one of `feature`'s
    /// settings under a capability key. Replaces name-based reflection:
    /// the feature hands over exactly what may be touched, nothing else.
    pub fn register_capability<F: Feature + 'static>(
        &mut self,
        feature: &'static str,
        key: &'static str,
        get: impl Fn(&F) -> CapabilityValue + 'static,
        set: impl Fn(&mut F, CapabilityValue) -> RegistryResult<()> + 'static,
    ) -> RegistryResult<()> {
        if !self.features.contains_key(feature) {
            return Err(RegistryError::UnknownFeature(feature.to_owned()));
        }
        if self.capabilities.contains_key(key) {
            return Err(RegistryError::DuplicateCapability(key));
        }
        self.capabilities
            .insert(key, CapabilityEntry::new(feature, key, get, set));
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> RegistryResult<bool> {
        self.feature(name).map(|f| f.is_enabled())
    }

    /// Enable a feature. Returns whether a transition happened.
    pub fn enable(&mut self, name: &str, cx: &mut AppContext) -> RegistryResult<bool> {
        let feature = self.feature_mut(name)?;
        if feature.is_enabled() {
            return Ok(false);
        }
        feature.on_enable(cx);
        tracing::debug!(feature = name, "enabled");
        Ok(true)
    }

    /// Disable a feature. Returns whether a transition happened.
    pub fn disable(&mut self, name: &str, cx: &mut AppContext) -> RegistryResult<bool> {
        let feature = self.feature_mut(name)?;
        if !feature.is_enabled() {
            return Ok(false);
        }
        feature.on_disable(cx);
        tracing::debug!(feature = name, "disabled");
        Ok(true)
    }

    /// Flip a feature's state; returns the new enabled state.
    pub fn toggle(&mut self, name: &str, cx: &mut AppContext) -> RegistryResult<bool> {
        if self.is_enabled(name)? {
            self.disable(name, cx)?;
            Ok(false)
        } else {
            self.enable(name, cx)?;
            Ok(true)
        }
    }

    /// Read a capability's current value.
    pub fn capability(&self, key: &str) -> RegistryResult<CapabilityValue> {
        let entry = self
            .capabilities
            .get(key)
            .ok_or_else(|| RegistryError::UnknownCapability(key.to_owned()))?;
        let feature = self.feature(entry.feature())?;
        entry.get(feature)
    }

    /// Write a capability's value.
    pub fn set_capability(&mut self, key: &str, value: CapabilityValue) -> RegistryResult<()> {
        let entry = self
            .capabilities
            .get(key)
            .ok_or_else(|| RegistryError::UnknownCapability(key.to_owned()))?;
        let feature_name = entry.feature();
        let feature = self
            .features
            .get_mut(feature_name)
            .ok_or_else(|| RegistryError::UnknownFeature(feature_name.to_owned()))?;
        entry.set(feature.as_mut(), value)
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.features.keys().copied()
    }

    fn feature(&self, name: &str) -> RegistryResult<&dyn Feature> {
        self.features
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| RegistryError::UnknownFeature(name.to_owned()))
    }

    fn feature_mut(&mut self, name: &str) -> RegistryResult<&mut (dyn Feature + '_)> {
        self.features
            .get_mut(name)
            .map(|f| f.as_mut() as &mut (dyn Feature + '_))
            .ok_or_else(|| RegistryError::UnknownFeature(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use scry_search::SearchCoordinator;
    use scry_search::SearchWorkers;
    use scry_search::StateSetPredicate;
    use std::sync::Arc;

    use super::*;

    struct SpeedOverride {
        enabled: bool,
        multiplier: f64,
    }

    impl SpeedOverride {
        const TTL: u64 = 1_000_000;

        fn new() -> Self {
            Self {
                enabled: false,
                multiplier: 2.5,
            }
        }
    }

    impl Feature for SpeedOverride {
        fn name(&self) -> &'static str {
            "speed-override"
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn on_enable(&mut self, cx: &mut AppContext) {
            self.enabled = true;
            cx.speed.request(self.name(), 10, self.multiplier, Self::TTL);
        }

        fn on_disable(&mut self, cx: &mut AppContext) {
            self.enabled = false;
            cx.speed.retract(&self.name());
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn test_context() -> AppContext {
        let coordinator = SearchCoordinator::new(
            Arc::new(StateSetPredicate::new([])),
            Arc::new(SearchWorkers::new(1).unwrap()),
        );
        AppContext::new(coordinator.feed())
    }

    fn speed_registry() -> FeatureRegistry {
        let mut registry = FeatureRegistry::new();
        registry.register(Box::new(SpeedOverride::new())).unwrap();
        registry
            .register_capability::<SpeedOverride>(
                "speed-override",
                "speed-override.multiplier",
                |f| CapabilityValue::Float(f.multiplier),
                |f, v| {
                    f.multiplier = v.as_float("speed-override.multiplier")?;
                    Ok(())
                },
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut registry = speed_registry();
        let mut cx = test_context();

        assert!(!registry.is_enabled("speed-override").unwrap());
        assert!(registry.enable("speed-override", &mut cx).unwrap());
        // Enabling twice is a no-op, not a second on_enable.
        assert!(!registry.enable("speed-override", &mut cx).unwrap());

        assert_eq!(cx.active_speed(), Some(2.5));

        assert!(!registry.toggle("speed-override", &mut cx).unwrap());
        assert_eq!(cx.active_speed(), None);
    }

    #[test]
    fn test_capability_access_without_reflection() {
        let mut registry = speed_registry();

        assert_eq!(
            registry.capability("speed-override.multiplier").unwrap(),
            CapabilityValue::Float(2.5)
        );

        registry
            .set_capability("speed-override.multiplier", CapabilityValue::Float(4.0))
            .unwrap();
        assert_eq!(
            registry.capability("speed-override.multiplier").unwrap(),
            CapabilityValue::Float(4.0)
        );
    }

    #[test]
    fn test_capability_type_mismatch() {
        let mut registry = speed_registry();

        let err = registry
            .set_capability("speed-override.multiplier", CapabilityValue::Bool(true))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::TypeMismatch {
                key: "speed-override.multiplier"
            }
        );
    }

    #[test]
    fn test_unknown_and_duplicate_registration() {
        let mut registry = speed_registry();
        let mut cx = test_context();

        assert!(matches!(
            registry.enable("nope", &mut cx),
            Err(RegistryError::UnknownFeature(_))
        ));
        assert_eq!(
            registry.register(Box::new(SpeedOverride::new())),
            Err(RegistryError::DuplicateFeature("speed-override"))
        );
    }
}
