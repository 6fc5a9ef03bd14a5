use std::{
    path::{Path, PathBuf},
    sync::{mpsc::RecvTimeoutError, Arc, Condvar, Mutex},
    time::Duration,
};

use rand::{thread_rng, Rng};

use crate::{configuration_store::ConfigurationStore, Datafile, DatafileEngine, EngineError, Result};

pub(crate) struct PollerThreadConfig {
    pub store: Arc<ConfigurationStore>,
    pub datafile_path: PathBuf,
    pub poll_interval: Duration,
}

/// A datafile poller thread.
///
/// Use [`DatafileEngine::start_poller_thread`](crate::DatafileEngine::start_poller_thread) to get
/// an instance of it.
pub struct PollerThread {
    join_handle: std::thread::JoinHandle<()>,

    /// Used to send a stop command to the poller thread.
    stop_sender: std::sync::mpsc::Sender<()>,

    /// Holds `None` until the first load attempt finishes, then the outcome of that attempt. A
    /// later successful load overwrites an initial error.
    result: Arc<(Mutex<Option<Result<()>>>, Condvar)>,
}

impl PollerThread {
    pub(crate) fn start(config: PollerThreadConfig) -> Result<PollerThread> {
        let (stop_sender, stop_receiver) = std::sync::mpsc::channel::<()>();

        let result = Arc::new((Mutex::new(None), Condvar::new()));

        let join_handle = {
            // Cloning Arc for move into thread
            let result = Arc::clone(&result);
            let update_result = move |value: Result<()>| {
                if let Ok(mut slot) = result.0.lock() {
                    if value.is_ok() || slot.is_none() {
                        *slot = Some(value);
                    }
                }
                result.1.notify_all();
            };

            std::thread::Builder::new()
                .name("decision-client-poller".to_owned())
                .spawn(move || loop {
                    log::debug!(target: "decision_client",
                                path:display = config.datafile_path.display();
                                "loading datafile");
                    match read_datafile(&config.datafile_path) {
                        Ok(datafile) => {
                            log::debug!(target: "decision_client",
                                        version = datafile.version();
                                        "successfully loaded datafile");
                            config.store.set_datafile(datafile);
                            update_result(Ok(()));
                        }
                        Err(err) => {
                            // Keep serving the previous datafile and retry later.
                            log::warn!(target: "decision_client", "failed to load datafile: {}", err);
                            update_result(Err(err));
                        }
                    }

                    let timeout = next_timeout(config.poll_interval);
                    match stop_receiver.recv_timeout(timeout) {
                        Err(RecvTimeoutError::Timeout) => {
                            // Timed out. Loop to reload the datafile.
                        }
                        Ok(()) => {
                            log::debug!(target: "decision_client", "poller thread received stop command");
                            return;
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            // When the other end of channel disconnects, calls to
                            // .recv_timeout() return immediately. Use normal thread sleep in
                            // this case.
                            std::thread::sleep(timeout);
                        }
                    }
                })?
        };

        Ok(PollerThread {
            join_handle,
            stop_sender,
            result,
        })
    }

    /// Block waiting for the first datafile load attempt.
    ///
    /// Returns the error of the first attempt if it failed (e.g. the file does not exist or is not
    /// a valid datafile).
    pub fn wait_for_configuration(&self) -> Result<()> {
        let mut lock = self
            .result
            .0
            .lock()
            .map_err(|_| EngineError::PollerThreadPanicked)?;
        loop {
            match &*lock {
                Some(result) => return result.clone(),
                None => {
                    lock = self
                        .result
                        .1
                        .wait(lock)
                        .map_err(|_| EngineError::PollerThreadPanicked)?;
                }
            }
        }
    }

    /// Stop the poller thread.
    ///
    /// This function does not wait for the thread to actually stop.
    pub fn stop(&self) {
        // Error means that the receiver was dropped (thread exited). Ignoring it as there's nothing
        // useful we can do.
        let _ = self.stop_sender.send(());
    }

    /// Stop the poller thread and block waiting for it to exit.
    ///
    /// If you don't need to wait for the thread to exit, use [`PollerThread::stop`] instead.
    pub fn shutdown(self) -> Result<()> {
        self.stop();

        self.join_handle
            .join()
            .map_err(|_| EngineError::PollerThreadPanicked)?;

        Ok(())
    }
}

fn read_datafile(path: &Path) -> Result<Datafile> {
    let json = std::fs::read_to_string(path)?;
    Datafile::from_json(&json)
}

/// Time to wait before the next reload. Never shorter than
/// [`DatafileEngine::MIN_POLL_INTERVAL`], so a zero interval cannot spin the thread.
fn next_timeout(poll_interval: Duration) -> Duration {
    let interval = poll_interval.max(DatafileEngine::MIN_POLL_INTERVAL);
    jitter(interval, interval / 10)
}

/// Apply a random jitter to `interval`.
fn jitter(interval: Duration, jitter: Duration) -> Duration {
    if jitter.is_zero() {
        return interval;
    }
    interval + thread_rng().gen_range(Duration::ZERO..jitter)
}
