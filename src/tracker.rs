//! Per-observer tracking state.
//!
//! A [`Tracker`] bundles everything one consumer of location updates needs:
//! its own matcher hysteresis, its own arrival edge detector and the latest
//! status text. Two consumers of the same location stream (for example a
//! live data field and an on-screen display) each own a separate tracker.

use log::{debug, info};

use crate::format::{format_status, NO_TRAILS_STATUS, NO_TRAIL_STATUS};
use crate::matcher::{evaluate, Match, MatchConfig, MatcherState};
use crate::{LocationSample, Trail};

/// Thresholds for the arrival alert.
///
/// These are independent of [`MatchConfig`]: the alert fires much closer to
/// the trail than the on-trail status, and re-arms only after moving well
/// away.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct ArrivalConfig {
    /// Fire when the nearest trail is closer than this.
    /// Default: 15.0 meters
    pub arrival_meters: f64,

    /// Forget the last alerted trail once farther than this.
    /// Default: 50.0 meters
    pub reset_meters: f64,
}

impl Default for ArrivalConfig {
    fn default() -> Self {
        Self {
            arrival_meters: 15.0,
            reset_meters: 50.0,
        }
    }
}

/// Edge trigger for "arrived on a new trail".
#[derive(Debug, Clone, Default)]
pub struct ArrivalDetector {
    config: ArrivalConfig,
    last_alerted: Option<String>,
}

impl ArrivalDetector {
    pub fn new(config: ArrivalConfig) -> Self {
        Self {
            config,
            last_alerted: None,
        }
    }

    /// Name of the trail that last triggered an alert, if still armed.
    pub fn last_alerted(&self) -> Option<&str> {
        self.last_alerted.as_deref()
    }

    /// Feed a match; returns `true` exactly on an arrival edge.
    ///
    /// Fires when the match is within `arrival_meters` of a named trail other
    /// than the last alerted one. Moving beyond `reset_meters` clears the
    /// last alerted trail so the same trail can alert again later.
    pub fn observe(&mut self, matched: &Match) -> bool {
        let name = matched.trail.as_ref().map_or("", |t| t.name.as_str());

        let arrived = matched.distance < self.config.arrival_meters
            && !name.is_empty()
            && self.last_alerted.as_deref() != Some(name);

        if arrived {
            info!("[ArrivalDetector] Arrived on: {}", name);
            self.last_alerted = Some(name.to_string());
        }

        if matched.distance > self.config.reset_meters && self.last_alerted.is_some() {
            debug!("[ArrivalDetector] Left trail area, re-arming");
            self.last_alerted = None;
        }

        arrived
    }

    pub fn reset(&mut self) {
        self.last_alerted = None;
    }
}

/// Outcome of feeding one sample to a [`Tracker`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerUpdate {
    /// The match, or `None` when no trails were loaded
    pub matched: Option<Match>,
    pub status: String,
    /// Whether this sample is an arrival edge
    pub arrived: bool,
}

/// One observer's tracking session state.
#[derive(Debug, Clone)]
pub struct Tracker {
    match_config: MatchConfig,
    matcher: MatcherState,
    arrival: ArrivalDetector,
    status: String,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    /// Tracker with default thresholds.
    pub fn new() -> Self {
        Self::with_config(MatchConfig::default(), ArrivalConfig::default())
    }

    pub fn with_config(match_config: MatchConfig, arrival_config: ArrivalConfig) -> Self {
        Self {
            match_config,
            matcher: MatcherState::default(),
            arrival: ArrivalDetector::new(arrival_config),
            status: NO_TRAIL_STATUS.to_string(),
        }
    }

    /// Latest status text. Unchanged while no samples arrive.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Hysteresis state after the last sample.
    pub fn matcher_state(&self) -> &MatcherState {
        &self.matcher
    }

    /// Apply one location sample.
    ///
    /// With an empty trail set nothing is matched and the status reads
    /// `No Trails`.
    pub fn on_sample(&mut self, sample: &LocationSample, trails: &[Trail]) -> TrackerUpdate {
        if trails.is_empty() {
            self.status = NO_TRAILS_STATUS.to_string();
            return TrackerUpdate {
                matched: None,
                status: self.status.clone(),
                arrived: false,
            };
        }

        let (matched, next) = evaluate(&self.matcher, sample, trails, &self.match_config);
        self.matcher = next;
        self.status = format_status(&matched);
        let arrived = self.arrival.observe(&matched);

        debug!("[Tracker] Status: {:?}", self.status);

        TrackerUpdate {
            matched: Some(matched),
            status: self.status.clone(),
            arrived,
        }
    }

    /// Start over as a fresh session.
    pub fn reset(&mut self) {
        self.matcher = MatcherState::default();
        self.arrival.reset();
        self.status = NO_TRAIL_STATUS.to_string();
    }
}
