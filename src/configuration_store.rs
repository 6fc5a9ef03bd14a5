use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::Datafile;

/// Holds the datafile currently served by a [`DatafileEngine`](crate::DatafileEngine).
///
/// Readers get a cheap `Arc` snapshot; the poller thread swaps in whole datafiles.
pub struct ConfigurationStore {
    datafile: RwLock<Option<Arc<Datafile>>>,
}

impl ConfigurationStore {
    /// Create a store with no datafile.
    pub fn new() -> Self {
        Self {
            datafile: RwLock::new(None),
        }
    }

    /// Snapshot of the current datafile, or `None` before the first load.
    pub fn get_datafile(&self) -> Option<Arc<Datafile>> {
        self.read().clone()
    }

    /// Version of the current datafile, or `None` before the first load.
    pub fn datafile_version(&self) -> Option<String> {
        self.read()
            .as_ref()
            .map(|datafile| datafile.version().to_owned())
    }

    /// Swap in `datafile`, returning the one it replaced.
    pub fn set_datafile(&self, datafile: Datafile) -> Option<Arc<Datafile>> {
        let datafile = Arc::new(datafile);
        let previous = self.write().replace(Arc::clone(&datafile));

        log::debug!(target: "decision_client",
                    previous_version = previous.as_ref().map(|d| d.version()).unwrap_or(""),
                    version = datafile.version();
                    "datafile replaced");
        previous
    }

    // The guarded value is a single `Option<Arc<_>>` assignment, so a writer that panicked
    // cannot leave it half-updated. Recover the guard instead of dropping the datafile.
    fn read(&self) -> RwLockReadGuard<'_, Option<Arc<Datafile>>> {
        self.datafile
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Arc<Datafile>>> {
        self.datafile
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ConfigurationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::Datafile;

    use super::ConfigurationStore;

    fn datafile(version: &str) -> Datafile {
        Datafile::from_json(&format!(r#"{{"version": "{}"}}"#, version)).unwrap()
    }

    #[test]
    fn can_set_datafile_from_another_thread() {
        let store = Arc::new(ConfigurationStore::new());
        assert!(store.get_datafile().is_none());

        {
            let store = store.clone();
            let _ = std::thread::spawn(move || {
                store.set_datafile(datafile("1"));
            })
            .join();
        }

        assert_eq!(store.datafile_version().as_deref(), Some("1"));
    }

    #[test]
    fn set_returns_replaced_datafile() {
        let store = ConfigurationStore::new();
        assert!(store.set_datafile(datafile("1")).is_none());

        let replaced = store.set_datafile(datafile("2")).unwrap();
        assert_eq!(replaced.version(), "1");
        assert_eq!(store.datafile_version().as_deref(), Some("2"));
    }

    #[test]
    fn survives_poisoned_lock() {
        let store = Arc::new(ConfigurationStore::new());
        store.set_datafile(datafile("1"));

        {
            let store = store.clone();
            let _ = std::thread::spawn(move || {
                let _guard = store.write();
                panic!("writer panicked while holding the lock");
            })
            .join();
        }

        assert_eq!(store.datafile_version().as_deref(), Some("1"));
        store.set_datafile(datafile("2"));
        assert_eq!(store.datafile_version().as_deref(), Some("2"));
    }
}
