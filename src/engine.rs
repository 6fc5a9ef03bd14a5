use crate::{Feature, Result, TrackingEvent, UserContext};

/// Capability a [`DecisionClient`](crate::DecisionClient) delegates to.
///
/// Implemented by [`DatafileEngine`](crate::DatafileEngine) for production use and by
/// [`TestEngine`](crate::testing::TestEngine) for tests. Implementations own the feature
/// registry and decide how features are enabled; the client only shapes their answers.
pub trait DecisionEngine {
    /// Returns every known feature. Ordering is up to the implementation.
    fn list_features(&self) -> Result<Vec<Feature>>;

    /// Returns the feature registered under `feature_key`.
    ///
    /// # Errors
    ///
    /// Must return [`Error::FeatureNotFound`](crate::Error::FeatureNotFound) if the key is not
    /// registered.
    fn get_feature(&self, feature_key: &str) -> Result<Feature>;

    /// Decide whether `feature` is enabled for `context`.
    fn decide(&self, feature: &Feature, context: &UserContext) -> Result<bool>;

    /// Record that a feature was evaluated. Callers treat failures as non-fatal.
    fn track(&self, event: TrackingEvent) -> Result<()>;
}
