use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::Error;
use crate::{DecisionEngine, Feature, Result, TrackingEvent, UserContext, VariableMap, VariableValue};

/// Outcome of evaluating a feature for a user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct FeatureDecision {
    /// Whether the feature is enabled for the user.
    pub enabled: bool,
    /// One entry per variable declared by the feature, keyed by variable key.
    pub variables: VariableMap,
}

/// A simplified client on top of a [`DecisionEngine`].
///
/// # Examples
/// ```
/// # use std::sync::Arc;
/// # use decision_client::{DecisionClient, Feature, UserContext, testing::TestEngine};
/// let engine = Arc::new(TestEngine::new());
/// engine.add_feature_rollout(Feature::new("checkout"));
///
/// let client = DecisionClient::new(engine);
/// let decision = client
///     .get_feature_with_context("checkout", &UserContext::without_attributes("user-id"))
///     .unwrap();
/// assert!(decision.enabled);
/// ```
#[derive(Clone)]
pub struct DecisionClient {
    engine: Arc<dyn DecisionEngine + Send + Sync>,
    context: Option<UserContext>,
}

impl DecisionClient {
    /// Create a new `DecisionClient` delegating to `engine`.
    pub fn new(engine: Arc<dyn DecisionEngine + Send + Sync>) -> Self {
        DecisionClient {
            engine,
            context: None,
        }
    }

    /// Attach a default user context, used by [`DecisionClient::get_feature_for_user`].
    pub fn with_context(mut self, context: UserContext) -> Self {
        self.context = Some(context);
        self
    }

    /// The attached user context, if any.
    pub fn context(&self) -> Option<&UserContext> {
        self.context.as_ref()
    }

    /// List all features known to the engine.
    pub fn list_features(&self) -> Result<Vec<Feature>> {
        self.engine.list_features()
    }

    /// Get a feature with all its variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeatureNotFound`] if no feature is registered under `feature_key`.
    pub fn get_feature(&self, feature_key: &str) -> Result<Feature> {
        self.engine.get_feature(feature_key)
    }

    /// Evaluate a feature for the given user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FeatureNotFound`] if no feature is registered under `feature_key`. Engine
    /// failures are returned as [`Error::Upstream`].
    pub fn get_feature_with_context(
        &self,
        feature_key: &str,
        context: &UserContext,
    ) -> Result<FeatureDecision> {
        let feature = self.get_feature(feature_key)?;
        self.evaluate(&feature, context)
    }

    /// Evaluate a feature for the given user and track the evaluation.
    ///
    /// Returns the same decision as [`DecisionClient::get_feature_with_context`]. Tracking is best
    /// effort: if the engine fails to record the event, the failure is logged and the decision is
    /// still returned.
    pub fn get_and_track_feature_with_context(
        &self,
        feature_key: &str,
        context: &UserContext,
    ) -> Result<FeatureDecision> {
        let feature = self.get_feature(feature_key)?;
        let decision = self.evaluate(&feature, context)?;

        let event = TrackingEvent::new(&feature.key, context, decision.enabled);
        log::trace!(target: "decision_client", event:serde; "tracking feature evaluation");
        if let Err(err) = self.engine.track(event) {
            log::warn!(target: "decision_client",
                       feature_key,
                       user_id = context.user_id();
                       "failed to track feature evaluation: {}", err);
        }

        Ok(decision)
    }

    /// Evaluate a feature for the attached user context.
    ///
    /// Returns `Ok(None)` if no context is attached.
    pub fn get_feature_for_user(&self, feature_key: &str) -> Result<Option<FeatureDecision>> {
        let Some(context) = &self.context else {
            log::warn!(target: "decision_client", feature_key; "evaluating a feature without a user context");
            return Ok(None);
        };
        self.get_feature_with_context(feature_key, context).map(Some)
    }

    fn evaluate(&self, feature: &Feature, context: &UserContext) -> Result<FeatureDecision> {
        let enabled = self
            .engine
            .decide(feature, context)
            .inspect_err(|err| {
                log::warn!(target: "decision_client",
                    feature_key:display = feature.key,
                    user_id = context.user_id(),
                    attributes:serde = context.attributes();
                    "error occurred while evaluating a feature: {:?}", err,
                );
            })?;

        let variables = feature
            .variables
            .iter()
            .map(|variable| {
                let value = variable.typed_value().unwrap_or_else(|| {
                    log::warn!(target: "decision_client",
                               feature_key:display = feature.key,
                               variable_key:display = variable.key;
                               "variable value does not match its declared type");
                    VariableValue::String(variable.default_value.clone())
                });
                (variable.key.clone(), value)
            })
            .collect();

        log::trace!(target: "decision_client",
                    feature_key:display = feature.key,
                    user_id = context.user_id(),
                    enabled;
                    "evaluated a feature");

        Ok(FeatureDecision { enabled, variables })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        testing::TestEngine, DecisionClient, Error, Feature, FeatureDecision, UserContext,
        Variable, VariableType, VariableValue,
    };

    fn setup() -> (Arc<TestEngine>, DecisionClient) {
        let engine = Arc::new(TestEngine::new());
        let client = DecisionClient::new(engine.clone());
        (engine, client)
    }

    #[test]
    fn variable_values_follow_declared_type() {
        let (engine, client) = setup();
        engine.add_feature_rollout(
            Feature::new("typed")
                .with_variable(Variable::typed("count", VariableType::Integer, "3"))
                .with_variable(Variable::typed("ratio", VariableType::Double, "broken")),
        );

        let decision = client
            .get_feature_with_context("typed", &UserContext::without_attributes("u"))
            .unwrap();
        assert_eq!(decision.variables["count"], VariableValue::Integer(3));
        assert_eq!(decision.variables["ratio"], VariableValue::from("broken"));
    }

    #[test]
    fn decision_survives_json_round_trip() {
        let (engine, client) = setup();
        engine.add_feature_rollout(
            Feature::new("typed")
                .with_variable(Variable::typed("number", VariableType::Json, "5"))
                .with_variable(Variable::typed("text", VariableType::Json, r#""x""#))
                .with_variable(Variable::typed("count", VariableType::Integer, "5")),
        );

        let decision = client
            .get_feature_with_context("typed", &UserContext::without_attributes("u"))
            .unwrap();
        assert_eq!(
            decision.variables["number"],
            VariableValue::Json(serde_json::json!(5))
        );

        let json = serde_json::to_string(&decision).unwrap();
        let parsed: FeatureDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, decision);
    }

    #[test]
    fn feature_for_user_requires_context() {
        let (engine, client) = setup();
        engine.add_feature_rollout(Feature::new("basic"));

        assert_eq!(client.get_feature_for_user("basic").unwrap(), None);

        let client = client.with_context(UserContext::without_attributes("userId"));
        let decision = client.get_feature_for_user("basic").unwrap().unwrap();
        assert!(decision.enabled);
        assert!(matches!(
            client.get_feature_for_user("DNE"),
            Err(Error::FeatureNotFound(key)) if key == "DNE"
        ));
    }
}
