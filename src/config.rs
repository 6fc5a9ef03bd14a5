use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    configuration_store::ConfigurationStore, event_dispatcher::NoopEventDispatcher,
    DatafileEngine, DecisionClient, EventDispatcher,
};

/// Configuration for a [`DatafileEngine`].
pub struct ClientConfig {
    pub(crate) datafile_path: PathBuf,
    pub(crate) poll_interval: Duration,
    pub(crate) event_dispatcher: Box<dyn EventDispatcher + Send + Sync>,
}

impl ClientConfig {
    /// Create a default configuration reading the datafile from `path`.
    ///
    /// ```
    /// # use decision_client::ClientConfig;
    /// ClientConfig::from_datafile_path("datafile.json");
    /// ```
    pub fn from_datafile_path(path: impl Into<PathBuf>) -> Self {
        ClientConfig {
            datafile_path: path.into(),
            poll_interval: DatafileEngine::DEFAULT_POLL_INTERVAL,
            event_dispatcher: Box::new(NoopEventDispatcher),
        }
    }

    /// Set event dispatcher to pass tracking events to your analytics backend.
    ///
    /// ```
    /// # use decision_client::{ClientConfig, TrackingEvent};
    /// let mut config = ClientConfig::from_datafile_path("datafile.json");
    /// config.event_dispatcher(|event: TrackingEvent| {
    ///   println!("{:?}", event);
    /// });
    /// ```
    pub fn event_dispatcher(
        &mut self,
        event_dispatcher: impl EventDispatcher + Send + Sync + 'static,
    ) -> &mut Self {
        self.event_dispatcher = Box::new(event_dispatcher);
        self
    }

    /// Override how often the poller thread reloads the datafile.
    ///
    /// Intervals below [`DatafileEngine::MIN_POLL_INTERVAL`] are raised to it.
    pub fn poll_interval(&mut self, poll_interval: Duration) -> &mut Self {
        if poll_interval < DatafileEngine::MIN_POLL_INTERVAL {
            log::warn!(target: "decision_client",
                       requested_ms = poll_interval.as_millis() as u64,
                       minimum_ms = DatafileEngine::MIN_POLL_INTERVAL.as_millis() as u64;
                       "poll interval too short, using minimum");
        }
        self.poll_interval = poll_interval.max(DatafileEngine::MIN_POLL_INTERVAL);
        self
    }

    /// Create a new [`DatafileEngine`] using the specified configuration.
    pub fn to_engine(self) -> DatafileEngine {
        DatafileEngine::with_parts(
            Arc::new(ConfigurationStore::new()),
            self.event_dispatcher,
            Some(self.datafile_path),
            self.poll_interval,
        )
    }

    /// Create a new [`DecisionClient`] backed by a [`DatafileEngine`], returning the engine as
    /// well so that its poller thread can be started.
    ///
    /// ```
    /// # use decision_client::ClientConfig;
    /// let (client, engine) = ClientConfig::from_datafile_path("datafile.json").to_client();
    /// ```
    pub fn to_client(self) -> (DecisionClient, Arc<DatafileEngine>) {
        let engine = Arc::new(self.to_engine());
        (DecisionClient::new(engine.clone()), engine)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ClientConfig;
    use crate::{DatafileEngine, TrackingEvent};

    #[test]
    fn defaults() {
        let config = ClientConfig::from_datafile_path("datafile.json");
        assert_eq!(config.poll_interval, DatafileEngine::DEFAULT_POLL_INTERVAL);
        assert_eq!(config.datafile_path.to_str(), Some("datafile.json"));
    }

    #[test]
    fn builder_overrides() {
        let mut config = ClientConfig::from_datafile_path("datafile.json");
        config
            .poll_interval(Duration::from_secs(1))
            .event_dispatcher(|_event: TrackingEvent| {});
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn zero_poll_interval_uses_minimum() {
        let mut config = ClientConfig::from_datafile_path("datafile.json");
        config.poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval, DatafileEngine::MIN_POLL_INTERVAL);
    }
}
