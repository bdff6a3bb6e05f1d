//! Trail matching state machine.
//!
//! Each location sample is matched against every node of every trail. The
//! nearest node decides the distance, and the distance falls into one of
//! three zones:
//!
//! | Distance | Status |
//! |----------|--------|
//! | `< on_trail_meters` (50 m) | [`TrailStatus::OnTrail`] |
//! | `< nearby_meters` (200 m) | [`TrailStatus::Approaching`] or [`TrailStatus::Leaving`] |
//! | otherwise | [`TrailStatus::NoTrail`] |
//!
//! Inside the transition zone the trend against the previous match for the
//! same trail picks approaching versus leaving. The previous match lives in
//! an explicit [`MatcherState`] owned by the caller, so every observer keeps
//! its own hysteresis and [`evaluate`] stays a pure function.

use log::debug;

use crate::geo_utils::{self, Compass, RelativeDirection};
use crate::{GeoPoint, LocationSample, Trail};

/// Distance thresholds for status classification.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct MatchConfig {
    /// Closer than this counts as riding the trail.
    /// Default: 50.0 meters
    pub on_trail_meters: f64,

    /// Closer than this (but not on the trail) counts as near the trail.
    /// Default: 200.0 meters
    pub nearby_meters: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            on_trail_meters: 50.0,
            nearby_meters: 200.0,
        }
    }
}

/// Relationship between the rider and the nearest trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum TrailStatus {
    OnTrail,
    Approaching,
    Leaving,
    NoTrail,
}

/// Result of evaluating one location sample.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Match {
    /// Nearest trail, reported only when `status` is not `NoTrail`
    pub trail: Option<Trail>,
    /// Distance to the nearest node in meters (`+inf` without candidates)
    pub distance: f64,
    pub status: TrailStatus,
    /// Bearing from the rider to the nearest node, `[0, 360)`
    pub bearing_to_trail: f32,
    pub compass: Compass,
    /// Direction relative to travel; `None` when the heading is unknown
    pub relative_direction: Option<RelativeDirection>,
}

/// Hysteresis state carried between samples for one observer.
///
/// Starts empty for every tracking session.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct MatcherState {
    pub previous: Option<Match>,
}

/// Nearest node found by the scan.
struct Nearest<'a> {
    trail: &'a Trail,
    node: &'a GeoPoint,
    distance: f64,
}

/// Find the globally nearest node.
///
/// Only a strictly smaller distance replaces the current best, so exact ties
/// keep the trail (and node) seen first in input order.
fn nearest_node<'a>(position: &GeoPoint, trails: &'a [Trail]) -> Option<Nearest<'a>> {
    let mut best: Option<Nearest<'a>> = None;

    for trail in trails {
        for node in &trail.nodes {
            let distance = geo_utils::distance_meters(position, node);
            let is_better = match &best {
                Some(b) => distance < b.distance,
                None => distance < f64::INFINITY,
            };
            if is_better {
                best = Some(Nearest { trail, node, distance });
            }
        }
    }

    best
}

/// Evaluate one sample against the trail set.
///
/// Returns the match together with the state to use for the next sample
/// (the input state is left untouched). Runtime is linear in the total
/// number of nodes.
///
/// # Example
/// ```
/// use trail_matcher::{evaluate, GeoPoint, LocationSample, MatchConfig, MatcherState, TrailStatus};
///
/// let (m, _) = evaluate(
///     &MatcherState::default(),
///     &LocationSample::new(GeoPoint::new(36.88, -107.855), None),
///     &[],
///     &MatchConfig::default(),
/// );
/// assert_eq!(m.status, TrailStatus::NoTrail);
/// assert!(m.distance.is_infinite());
/// ```
pub fn evaluate(
    state: &MatcherState,
    sample: &LocationSample,
    trails: &[Trail],
    config: &MatchConfig,
) -> (Match, MatcherState) {
    let nearest = nearest_node(&sample.position, trails);
    let distance = nearest.as_ref().map_or(f64::INFINITY, |n| n.distance);

    let bearing_to_trail = nearest
        .as_ref()
        .map_or(0.0, |n| geo_utils::initial_bearing_degrees(&sample.position, n.node));
    let compass = geo_utils::compass_octant(bearing_to_trail);

    let relative_direction = match (sample.heading, &nearest) {
        (Some(heading), Some(_)) if geo_utils::heading_is_known(Some(heading)) => {
            Some(geo_utils::relative_direction(heading, bearing_to_trail))
        }
        _ => None,
    };

    let nearest_id = nearest.as_ref().map(|n| n.trail.id);
    let status = classify(distance, nearest_id, state.previous.as_ref(), config);

    let trail = match status {
        TrailStatus::NoTrail => None,
        _ => nearest.map(|n| n.trail.clone()),
    };

    debug!(
        "[TrailMatcher] {:?} at {:.1}m (trail {:?}, bearing {:.0})",
        status, distance, nearest_id, bearing_to_trail
    );

    let matched = Match {
        trail,
        distance,
        status,
        bearing_to_trail,
        compass,
        relative_direction,
    };

    let next = MatcherState {
        previous: Some(matched.clone()),
    };

    (matched, next)
}

/// Map a distance to a status, using the previous match inside the
/// transition zone.
fn classify(
    distance: f64,
    nearest_id: Option<i64>,
    previous: Option<&Match>,
    config: &MatchConfig,
) -> TrailStatus {
    if distance < config.on_trail_meters {
        return TrailStatus::OnTrail;
    }
    if distance >= config.nearby_meters || nearest_id.is_none() {
        return TrailStatus::NoTrail;
    }

    let previous_id = previous.and_then(|p| p.trail.as_ref().map(|t| t.id));
    match previous {
        Some(prev) if previous_id == nearest_id => {
            if distance < prev.distance {
                TrailStatus::Approaching
            } else {
                TrailStatus::Leaving
            }
        }
        _ => TrailStatus::Approaching,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Meters per degree of latitude on the matching sphere.
    const M_PER_DEG_LAT: f64 = geo_utils::EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

    const BASE: GeoPoint = GeoPoint { lat: 36.88, lon: -107.855 };

    /// A point `meters` due north of `BASE`.
    fn north_of_base(meters: f64) -> GeoPoint {
        GeoPoint::new(BASE.lat + meters / M_PER_DEG_LAT, BASE.lon)
    }

    fn single_node_trail(id: i64, name: &str) -> Trail {
        Trail::new(id, name, vec![BASE])
    }

    fn sample_at(meters_north: f64) -> LocationSample {
        LocationSample::new(north_of_base(meters_north), None)
    }

    fn run(state: &MatcherState, meters_north: f64, trails: &[Trail]) -> (Match, MatcherState) {
        evaluate(state, &sample_at(meters_north), trails, &MatchConfig::default())
    }

    #[test]
    fn test_empty_trail_set() {
        let (m, next) = run(&MatcherState::default(), 10.0, &[]);
        assert_eq!(m.status, TrailStatus::NoTrail);
        assert!(m.distance.is_infinite() && m.distance > 0.0);
        assert!(m.trail.is_none());
        assert_eq!(m.bearing_to_trail, 0.0);
        assert_eq!(m.compass, Compass::N);
        assert!(m.relative_direction.is_none());
        assert_eq!(next.previous, Some(m));
    }

    #[test]
    fn test_trails_without_nodes_never_match() {
        let trails = vec![Trail::new(1, "Empty", vec![]), Trail::new(2, "Also Empty", vec![])];
        let (m, _) = run(&MatcherState::default(), 0.0, &trails);
        assert_eq!(m.status, TrailStatus::NoTrail);
        assert!(m.distance.is_infinite());
    }

    #[test]
    fn test_zone_classification_first_observation() {
        let trails = vec![single_node_trail(1, "Road Apple")];

        let (m, _) = run(&MatcherState::default(), 10.0, &trails);
        assert_eq!(m.status, TrailStatus::OnTrail);
        assert_eq!(m.trail.as_ref().map(|t| t.id), Some(1));

        let (m, _) = run(&MatcherState::default(), 120.0, &trails);
        assert_eq!(m.status, TrailStatus::Approaching);
        assert_eq!(m.trail.as_ref().map(|t| t.id), Some(1));

        let (m, _) = run(&MatcherState::default(), 500.0, &trails);
        assert_eq!(m.status, TrailStatus::NoTrail);
        assert!(m.trail.is_none());
        assert!((m.distance - 500.0).abs() < 0.01);
    }

    #[test]
    fn test_zone_boundaries() {
        let trails = vec![single_node_trail(1, "Road Apple")];

        let (m, _) = run(&MatcherState::default(), 49.9, &trails);
        assert_eq!(m.status, TrailStatus::OnTrail);

        let (m, _) = run(&MatcherState::default(), 50.1, &trails);
        assert_eq!(m.status, TrailStatus::Approaching);

        let (m, _) = run(&MatcherState::default(), 199.9, &trails);
        assert_eq!(m.status, TrailStatus::Approaching);

        let (m, _) = run(&MatcherState::default(), 200.1, &trails);
        assert_eq!(m.status, TrailStatus::NoTrail);
    }

    #[test]
    fn test_hysteresis_approaching() {
        let trails = vec![single_node_trail(1, "Road Apple")];
        let (first, state) = run(&MatcherState::default(), 150.0, &trails);
        assert_eq!(first.status, TrailStatus::Approaching);

        let (second, _) = run(&state, 100.0, &trails);
        assert_eq!(second.status, TrailStatus::Approaching);
    }

    #[test]
    fn test_hysteresis_leaving() {
        let trails = vec![single_node_trail(1, "Road Apple")];
        let (_, state) = run(&MatcherState::default(), 100.0, &trails);
        let (second, _) = run(&state, 150.0, &trails);
        assert_eq!(second.status, TrailStatus::Leaving);
    }

    #[test]
    fn test_equal_distance_counts_as_leaving() {
        let trails = vec![single_node_trail(1, "Road Apple")];
        let (_, state) = run(&MatcherState::default(), 100.0, &trails);
        let (second, _) = run(&state, 100.0, &trails);
        assert_eq!(second.status, TrailStatus::Leaving);
    }

    #[test]
    fn test_hysteresis_resets_on_different_trail() {
        let a = single_node_trail(1, "Road Apple");
        let b = single_node_trail(2, "Hippie Highway");

        let (_, state) = run(&MatcherState::default(), 100.0, &[a]);
        // Farther than before, but a different trail: default to approaching
        let (m, _) = run(&state, 150.0, &[b]);
        assert_eq!(m.status, TrailStatus::Approaching);
    }

    #[test]
    fn test_previous_no_trail_defaults_to_approaching() {
        let trails = vec![single_node_trail(1, "Road Apple")];
        let (far, state) = run(&MatcherState::default(), 100.0, &trails);
        assert_eq!(far.status, TrailStatus::Approaching);

        let (gone, state) = run(&state, 300.0, &trails);
        assert_eq!(gone.status, TrailStatus::NoTrail);

        // Previous match has no trail, so the trend is unknown
        let (back, _) = run(&state, 190.0, &trails);
        assert_eq!(back.status, TrailStatus::Approaching);
    }

    #[test]
    fn test_state_input_is_not_mutated() {
        let trails = vec![single_node_trail(1, "Road Apple")];
        let (_, state) = run(&MatcherState::default(), 100.0, &trails);
        let snapshot = state.clone();
        let _ = run(&state, 150.0, &trails);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_tie_goes_to_first_trail() {
        let first = single_node_trail(7, "First");
        let second = single_node_trail(8, "Second");
        let (m, _) = run(&MatcherState::default(), 20.0, &[first, second]);
        assert_eq!(m.trail.map(|t| t.id), Some(7));
    }

    #[test]
    fn test_nearest_node_across_trails() {
        let far = Trail::new(1, "Far", vec![north_of_base(400.0), north_of_base(300.0)]);
        let near = Trail::new(2, "Near", vec![north_of_base(180.0), north_of_base(30.0)]);
        let (m, _) = run(&MatcherState::default(), 0.0, &[far, near]);
        assert_eq!(m.status, TrailStatus::OnTrail);
        assert_eq!(m.trail.map(|t| t.id), Some(2));
        assert!((m.distance - 30.0).abs() < 0.01);
    }

    #[test]
    fn test_bearing_and_compass_to_nearest_node() {
        // Trail node due east of the rider
        let east = GeoPoint::new(BASE.lat, BASE.lon + 0.001);
        let trails = vec![Trail::new(1, "East", vec![east])];
        let (m, _) = evaluate(
            &MatcherState::default(),
            &LocationSample::new(BASE, None),
            &trails,
            &MatchConfig::default(),
        );
        assert!((m.bearing_to_trail - 90.0).abs() < 0.1);
        assert_eq!(m.compass, Compass::E);
        assert!(m.relative_direction.is_none());
    }

    #[test]
    fn test_relative_direction_requires_known_heading() {
        let east = GeoPoint::new(BASE.lat, BASE.lon + 0.001);
        let trails = vec![Trail::new(1, "East", vec![east])];
        let config = MatchConfig::default();
        let state = MatcherState::default();

        let (m, _) = evaluate(&state, &LocationSample::new(BASE, Some(0.0)), &trails, &config);
        assert!(m.relative_direction.is_none());

        // Riding north, trail to the east
        let (m, _) = evaluate(&state, &LocationSample::new(BASE, Some(1.0)), &trails, &config);
        assert_eq!(m.relative_direction, Some(RelativeDirection::Right));

        // Riding east, trail ahead
        let (m, _) = evaluate(&state, &LocationSample::new(BASE, Some(80.0)), &trails, &config);
        assert_eq!(m.relative_direction, Some(RelativeDirection::Ahead));

        // Riding south, trail to the left
        let (m, _) = evaluate(&state, &LocationSample::new(BASE, Some(180.0)), &trails, &config);
        assert_eq!(m.relative_direction, Some(RelativeDirection::Left));

        // Riding west, trail behind
        let (m, _) = evaluate(&state, &LocationSample::new(BASE, Some(270.0)), &trails, &config);
        assert_eq!(m.relative_direction, Some(RelativeDirection::Behind));
    }

    #[test]
    fn test_relative_direction_omitted_without_candidates() {
        let (m, _) = evaluate(
            &MatcherState::default(),
            &LocationSample::new(BASE, Some(90.0)),
            &[],
            &MatchConfig::default(),
        );
        assert!(m.relative_direction.is_none());
    }

    #[test]
    fn test_no_trail_keeps_distance_but_drops_trail() {
        let trails = vec![single_node_trail(1, "Road Apple")];
        let (m, _) = run(&MatcherState::default(), 1000.0, &trails);
        assert!(m.trail.is_none());
        assert!(m.distance.is_finite());
    }

    #[test]
    fn test_matched_trail_keeps_absent_difficulty() {
        let trails = vec![single_node_trail(1, "Road Apple")];
        let (m, _) = run(&MatcherState::default(), 5.0, &trails);
        assert_eq!(m.trail.and_then(|t| t.difficulty), None);
    }

    #[test]
    fn test_custom_thresholds() {
        let trails = vec![single_node_trail(1, "Road Apple")];
        let config = MatchConfig {
            on_trail_meters: 10.0,
            nearby_meters: 40.0,
        };
        let (m, _) = evaluate(&MatcherState::default(), &sample_at(20.0), &trails, &config);
        assert_eq!(m.status, TrailStatus::Approaching);
        let (m, _) = evaluate(&MatcherState::default(), &sample_at(45.0), &trails, &config);
        assert_eq!(m.status, TrailStatus::NoTrail);
    }
}
