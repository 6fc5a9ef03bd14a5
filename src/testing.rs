//! In-memory decision engine for tests.
//!
//! [`TestEngine`] keeps a registry of features, lets tests force a feature on for every user, and
//! records tracking events instead of sending them anywhere.
//!
//! ```
//! # use std::sync::Arc;
//! # use decision_client::{DecisionClient, Feature, UserContext, Variable, testing::TestEngine};
//! let engine = Arc::new(TestEngine::new());
//! engine.add_feature_rollout(
//!     Feature::new("advanced")
//!         .with_variable(Variable::new("var1", "val1"))
//!         .with_variable(Variable::new("var2", "val2")),
//! );
//!
//! let client = DecisionClient::new(engine.clone());
//! let decision = client
//!     .get_and_track_feature_with_context("advanced", &UserContext::without_attributes("userId"))
//!     .unwrap();
//! assert!(decision.enabled);
//! assert_eq!(decision.variables.len(), 2);
//! assert_eq!(engine.tracked_events().len(), 1);
//! ```

use std::{
    collections::{BTreeMap, HashSet},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{DecisionEngine, EngineError, Error, Feature, Result, TrackingEvent, UserContext};

#[derive(Default)]
struct Registry {
    features: BTreeMap<String, Feature>,
    rollouts: HashSet<String>,
    tracked_events: Vec<TrackingEvent>,
    fail_tracking: bool,
}

/// A network-free [`DecisionEngine`] whose features are registered by the test itself.
///
/// Features registered with [`TestEngine::add_feature`] are never enabled. Features registered
/// with [`TestEngine::add_feature_rollout`] are enabled for every user.
#[derive(Default)]
pub struct TestEngine {
    registry: RwLock<Registry>,
}

impl TestEngine {
    /// Create an engine with no features.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `feature`, replacing any feature with the same key.
    pub fn add_feature(&self, feature: Feature) {
        let mut registry = self.write();
        registry.rollouts.remove(&feature.key);
        registry.features.insert(feature.key.clone(), feature);
    }

    /// Register `feature` and enable it for every user.
    pub fn add_feature_rollout(&self, feature: Feature) {
        let mut registry = self.write();
        registry.rollouts.insert(feature.key.clone());
        registry.features.insert(feature.key.clone(), feature);
    }

    /// Tracking events recorded so far, oldest first.
    pub fn tracked_events(&self) -> Vec<TrackingEvent> {
        self.read().tracked_events.clone()
    }

    /// Make subsequent [`DecisionEngine::track`] calls fail (or succeed again).
    pub fn fail_tracking(&self, fail: bool) {
        self.write().fail_tracking = fail;
    }

    // A panicking test can poison the lock; the registry stays usable for the rest of it.
    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DecisionEngine for TestEngine {
    fn list_features(&self) -> Result<Vec<Feature>> {
        Ok(self.read().features.values().cloned().collect())
    }

    fn get_feature(&self, feature_key: &str) -> Result<Feature> {
        self.read()
            .features
            .get(feature_key)
            .cloned()
            .ok_or_else(|| Error::FeatureNotFound(feature_key.to_owned()))
    }

    fn decide(&self, feature: &Feature, _context: &UserContext) -> Result<bool> {
        let registry = self.read();
        if !registry.features.contains_key(&feature.key) {
            return Err(Error::FeatureNotFound(feature.key.clone()));
        }
        Ok(registry.rollouts.contains(&feature.key))
    }

    fn track(&self, event: TrackingEvent) -> Result<()> {
        let mut registry = self.write();
        if registry.fail_tracking {
            return Err(EngineError::Dispatch("tracking disabled by test".to_owned()).into());
        }
        registry.tracked_events.push(event);
        Ok(())
    }
}
