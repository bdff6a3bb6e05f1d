//! Background tracking session.
//!
//! Location providers push samples from their own callback thread; the
//! session hands them to a single worker thread that owns the [`Tracker`],
//! so samples are evaluated strictly in arrival order and the hysteresis
//! state is never touched concurrently.
//!
//! The queue between the two is a bounded `tokio::sync::broadcast` channel
//! with one receiver. When the worker falls behind, the oldest queued
//! samples are dropped and the lag is logged; newer samples are never
//! rejected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::{info, warn};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::format::{NO_TRAILS_STATUS, NO_TRAIL_STATUS};
use crate::tracker::{ArrivalConfig, Tracker, TrackerUpdate};
use crate::{LocationSample, MatchConfig, Trail};

/// Configuration for a tracking session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Samples buffered before the oldest are dropped. Rounded up to a
    /// power of two, minimum 1.
    /// Default: 16
    pub queue_capacity: usize,

    pub match_config: MatchConfig,

    pub arrival_config: ArrivalConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            match_config: MatchConfig::default(),
            arrival_config: ArrivalConfig::default(),
        }
    }
}

/// A running tracking session.
///
/// Dropping the session stops it.
pub struct TrackingSession {
    sender: Option<broadcast::Sender<LocationSample>>,
    stopped: Arc<AtomicBool>,
    status: Arc<Mutex<String>>,
    worker: Option<JoinHandle<()>>,
}

impl TrackingSession {
    /// Start a session over a fixed trail set.
    ///
    /// `sink` runs on the worker thread after every evaluated sample; it is
    /// where the host publishes the status and plays the arrival tone.
    pub fn start<F>(trails: Vec<Trail>, config: SessionConfig, mut sink: F) -> std::io::Result<Self>
    where
        F: FnMut(&TrackerUpdate) + Send + 'static,
    {
        let (sender, mut receiver) = broadcast::channel(config.queue_capacity.max(1));
        let stopped = Arc::new(AtomicBool::new(false));

        let initial = if trails.is_empty() {
            NO_TRAILS_STATUS
        } else {
            NO_TRAIL_STATUS
        };
        let status = Arc::new(Mutex::new(initial.to_string()));

        info!("[TrackingSession] Starting with {} trails", trails.len());

        let worker = {
            let stopped = Arc::clone(&stopped);
            let status = Arc::clone(&status);
            let mut tracker = Tracker::with_config(config.match_config, config.arrival_config);

            thread::Builder::new()
                .name("trail-tracker".to_string())
                .spawn(move || loop {
                    match receiver.blocking_recv() {
                        Ok(sample) => {
                            if stopped.load(Ordering::Acquire) {
                                break;
                            }
                            let update = tracker.on_sample(&sample, &trails);
                            if let Ok(mut latest) = status.lock() {
                                latest.clone_from(&update.status);
                            }
                            sink(&update);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(
                                "[TrackingSession] Worker behind, dropped {} oldest samples",
                                skipped
                            );
                        }
                        Err(RecvError::Closed) => break,
                    }
                })?
        };

        Ok(Self {
            sender: Some(sender),
            stopped,
            status,
            worker: Some(worker),
        })
    }

    /// Queue a location sample. Returns `false` once the session is stopped.
    pub fn push(&self, sample: LocationSample) -> bool {
        if self.stopped.load(Ordering::Acquire) {
            return false;
        }
        match &self.sender {
            Some(sender) => sender.send(sample).is_ok(),
            None => false,
        }
    }

    /// Latest status text, kept while no samples arrive.
    pub fn latest_status(&self) -> String {
        self.status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|_| NO_TRAIL_STATUS.to_string())
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Stop evaluating samples and wait for the worker to exit.
    ///
    /// Samples still queued are discarded. Idempotent.
    pub fn stop(&mut self) {
        self.stopped.store(true, Ordering::Release);
        // Closing the channel wakes the worker if it is idle
        self.sender.take();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("[TrackingSession] Worker panicked");
            }
            info!("[TrackingSession] Stopped");
        }
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.stop();
    }
}
