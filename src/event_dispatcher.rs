use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Attributes, UserContext};

/// Records that a feature was evaluated for a user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    /// Key of the evaluated feature.
    pub feature_key: String,
    /// Identifier of the user the feature was evaluated for.
    pub user_id: String,
    /// Attributes of the user at evaluation time.
    pub attributes: Attributes,
    /// Whether the feature was enabled for the user.
    pub enabled: bool,
    /// RFC 3339 timestamp of the evaluation.
    pub timestamp: String,
    /// SDK metadata.
    pub meta_data: HashMap<String, String>,
}

impl TrackingEvent {
    pub(crate) fn new(feature_key: &str, context: &UserContext, enabled: bool) -> Self {
        TrackingEvent {
            feature_key: feature_key.to_owned(),
            user_id: context.user_id().to_owned(),
            attributes: context.attributes().clone(),
            enabled,
            timestamp: chrono::Utc::now().to_rfc3339(),
            meta_data: HashMap::from([
                ("sdkName".to_owned(), env!("CARGO_PKG_NAME").to_owned()),
                (
                    "sdkVersion".to_owned(),
                    env!("CARGO_PKG_VERSION").to_owned(),
                ),
            ]),
        }
    }
}

/// Receives tracking events from the [`DatafileEngine`](crate::DatafileEngine) and forwards them
/// to your analytics backend.
pub trait EventDispatcher {
    /// Hands over a tracking event.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use decision_client::{EventDispatcher, TrackingEvent};
    /// struct StdoutDispatcher;
    ///
    /// impl EventDispatcher for StdoutDispatcher {
    ///     fn dispatch_event(&self, event: TrackingEvent) {
    ///         println!("{}", serde_json::to_string(&event).unwrap());
    ///     }
    /// }
    /// ```
    ///
    /// # Notes
    ///
    /// This method is called before the decision is returned to the caller. It must not block
    /// and must not panic; failures should be handled inside the implementation.
    fn dispatch_event(&self, event: TrackingEvent);
}

pub(crate) struct NoopEventDispatcher;
impl EventDispatcher for NoopEventDispatcher {
    fn dispatch_event(&self, _event: TrackingEvent) {}
}

impl<T: Fn(TrackingEvent)> EventDispatcher for T {
    fn dispatch_event(&self, event: TrackingEvent) {
        self(event);
    }
}
