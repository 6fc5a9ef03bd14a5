use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    configuration_store::ConfigurationStore,
    event_dispatcher::NoopEventDispatcher,
    poller::{PollerThread, PollerThreadConfig},
    Datafile, DecisionEngine, Error, EventDispatcher, Feature, Result, TrackingEvent, UserContext,
};

/// Decision engine backed by a local datafile.
///
/// A feature is enabled for every user when the datafile declares a rollout for it, and disabled
/// otherwise. Tracking events are handed to the configured [`EventDispatcher`].
///
/// Until a datafile is loaded, the engine reports no features.
pub struct DatafileEngine {
    store: Arc<ConfigurationStore>,
    dispatcher: Box<dyn EventDispatcher + Send + Sync>,
    datafile_path: Option<PathBuf>,
    poll_interval: Duration,
}

impl DatafileEngine {
    /// Default interval between datafile reloads.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);

    /// Shortest interval the poller thread honors. Shorter intervals are raised to this value.
    pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Create an engine with no datafile source and a no-op dispatcher. Use
    /// [`DatafileEngine::load_datafile`] to provide configuration.
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(ConfigurationStore::new()),
            Box::new(NoopEventDispatcher),
            None,
            Self::DEFAULT_POLL_INTERVAL,
        )
    }

    pub(crate) fn with_parts(
        store: Arc<ConfigurationStore>,
        dispatcher: Box<dyn EventDispatcher + Send + Sync>,
        datafile_path: Option<PathBuf>,
        poll_interval: Duration,
    ) -> Self {
        DatafileEngine {
            store,
            dispatcher,
            datafile_path,
            poll_interval,
        }
    }

    /// Replace the current datafile.
    pub fn load_datafile(&self, datafile: Datafile) {
        self.store.set_datafile(datafile);
    }

    /// Version of the datafile currently served, or `None` before the first load.
    pub fn datafile_version(&self) -> Option<String> {
        self.store.datafile_version()
    }

    /// Start a poller thread reloading the datafile from the configured path.
    ///
    /// Returns `Ok(None)` if the engine was created without a datafile path.
    pub fn start_poller_thread(&self) -> Result<Option<PollerThread>> {
        let Some(datafile_path) = self.datafile_path.clone() else {
            log::warn!(target: "decision_client", "no datafile path configured, poller thread not started");
            return Ok(None);
        };
        PollerThread::start(PollerThreadConfig {
            store: self.store.clone(),
            datafile_path,
            poll_interval: self.poll_interval,
        })
        .map(Some)
    }

    fn datafile(&self) -> Option<Arc<Datafile>> {
        let datafile = self.store.get_datafile();
        if datafile.is_none() {
            log::warn!(target: "decision_client", "accessing features before a datafile has been loaded");
        }
        datafile
    }
}

impl Default for DatafileEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionEngine for DatafileEngine {
    fn list_features(&self) -> Result<Vec<Feature>> {
        let Some(datafile) = self.datafile() else {
            // Missing datafile is a normal scenario while the poller is starting up.
            return Ok(Vec::new());
        };
        let features = datafile.features().into_iter().cloned().collect();
        Ok(features)
    }

    fn get_feature(&self, feature_key: &str) -> Result<Feature> {
        let Some(datafile) = self.datafile() else {
            return Err(Error::FeatureNotFound(feature_key.to_owned()));
        };
        let feature = datafile.find_feature(feature_key)?.clone();
        Ok(feature)
    }

    fn decide(&self, feature: &Feature, _context: &UserContext) -> Result<bool> {
        Ok(self
            .datafile()
            .map_or(false, |datafile| datafile.is_rolled_out(&feature.key)))
    }

    fn track(&self, event: TrackingEvent) -> Result<()> {
        self.dispatcher.dispatch_event(event);
        Ok(())
    }
}
