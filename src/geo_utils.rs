//! # Geographic Utilities
//!
//! Core geographic computation utilities for trail matching.
//!
//! All functions are pure and treat coordinates as opaque numeric input: no
//! range validation is performed, so out-of-range or non-finite values flow
//! through the math without panicking.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`distance_meters`] | Great-circle distance between two points |
//! | [`initial_bearing_degrees`] | Forward azimuth from one point to another |
//! | [`compass_octant`] | Bucket a bearing into one of 8 compass points |
//! | [`relative_direction`] | Classify a target bearing relative to the heading of travel |
//! | [`polyline_length`] | Total length of a trail in meters |
//!
//! ## Example
//!
//! ```rust
//! use trail_matcher::{GeoPoint, geo_utils};
//!
//! let trailhead = GeoPoint::new(36.8800, -107.8550);
//! let junction = GeoPoint::new(36.8850, -107.8550);
//!
//! let dist = geo_utils::distance_meters(&trailhead, &junction);
//! let bearing = geo_utils::initial_bearing_degrees(&trailhead, &junction);
//!
//! assert!((dist - 556.0).abs() < 1.0);
//! assert_eq!(geo_utils::compass_octant(bearing), geo_utils::Compass::N);
//! ```
//!
//! ## Algorithm Notes
//!
//! Distances use the haversine formula on a sphere of radius 6,371,000 m
//! with no ellipsoidal correction. Bearings use the standard forward-azimuth
//! formula and are normalized into `[0, 360)`.

use std::fmt;

use geo::{Distance, Haversine, Point};

use crate::GeoPoint;

/// Earth radius used for all matching distances, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two points in meters.
///
/// Symmetric: `distance_meters(a, b) == distance_meters(b, a)` up to
/// floating-point rounding.
///
/// # Example
///
/// ```rust
/// use trail_matcher::{GeoPoint, geo_utils};
///
/// let a = GeoPoint::new(0.0, 0.0);
/// let b = GeoPoint::new(0.0, 1.0);
///
/// // One degree of longitude at the equator
/// let d = geo_utils::distance_meters(&a, &b);
/// assert!((d - 111_194.9).abs() < 1.0);
/// ```
#[inline]
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial bearing (forward azimuth) from `from` to `to`, in degrees `[0, 360)`.
///
/// North is 0°, east is 90°. Identical points yield 0°.
#[inline]
pub fn initial_bearing_degrees(from: &GeoPoint, to: &GeoPoint) -> f32 {
    let d_lon = (to.lon - from.lon).to_radians();
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    // Normalize after narrowing so rounding can never produce 360.0
    let bearing = y.atan2(x).to_degrees() as f32;
    (bearing + 360.0) % 360.0
}

/// Total length of a polyline in meters.
///
/// Sums the great-circle length of consecutive segments. Empty and
/// single-node polylines have zero length. Uses the `geo` mean Earth radius,
/// so results are for display and summaries rather than matching.
pub fn polyline_length(nodes: &[GeoPoint]) -> f64 {
    nodes
        .windows(2)
        .map(|w| {
            let p1 = Point::new(w[0].lon, w[0].lat);
            let p2 = Point::new(w[1].lon, w[1].lat);
            Haversine::distance(p1, p2)
        })
        .sum()
}

// =============================================================================
// Direction Cues
// =============================================================================

/// One of the 8 principal compass points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum Compass {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Compass {
    const ORDER: [Compass; 8] = [
        Compass::N,
        Compass::NE,
        Compass::E,
        Compass::SE,
        Compass::S,
        Compass::SW,
        Compass::W,
        Compass::NW,
    ];

    /// Short label, e.g. `"NE"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Compass::N => "N",
            Compass::NE => "NE",
            Compass::E => "E",
            Compass::SE => "SE",
            Compass::S => "S",
            Compass::SW => "SW",
            Compass::W => "W",
            Compass::NW => "NW",
        }
    }
}

impl fmt::Display for Compass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket a bearing into a compass octant.
///
/// Buckets are 45° wide and centered on the principal points, so
/// `[337.5, 22.5)` is north. Bearings outside `[0, 360)` wrap around.
///
/// ```rust
/// use trail_matcher::geo_utils::{compass_octant, Compass};
///
/// assert_eq!(compass_octant(22.4), Compass::N);
/// assert_eq!(compass_octant(44.0), Compass::NE);
/// assert_eq!(compass_octant(359.0), Compass::N);
/// ```
pub fn compass_octant(bearing: f32) -> Compass {
    let bucket = ((bearing as f64 + 22.5) / 45.0).floor() as i64;
    Compass::ORDER[bucket.rem_euclid(8) as usize]
}

/// Where a target lies relative to the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum RelativeDirection {
    Ahead,
    Right,
    Left,
    Behind,
}

impl RelativeDirection {
    /// Arrow glyph used in status text.
    pub fn arrow(&self) -> &'static str {
        match self {
            RelativeDirection::Ahead => "↑",
            RelativeDirection::Right => "→",
            RelativeDirection::Left => "←",
            RelativeDirection::Behind => "↓",
        }
    }
}

impl fmt::Display for RelativeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.arrow())
    }
}

/// Classify `bearing_to_target` relative to `heading`.
///
/// The signed difference is normalized into `(-180, 180]`:
/// `[-30, 30]` is ahead, `(30, 150)` right, `(-150, -30)` left, anything
/// else behind.
///
/// Callers are responsible for skipping this when the heading is unknown;
/// see [`heading_is_known`].
pub fn relative_direction(heading: f32, bearing_to_target: f32) -> RelativeDirection {
    let mut diff = bearing_to_target - heading;
    if diff.is_finite() {
        diff %= 360.0;
        if diff > 180.0 {
            diff -= 360.0;
        } else if diff <= -180.0 {
            diff += 360.0;
        }
    }

    if (-30.0..=30.0).contains(&diff) {
        RelativeDirection::Ahead
    } else if diff > 30.0 && diff < 150.0 {
        RelativeDirection::Right
    } else if diff < -30.0 && diff > -150.0 {
        RelativeDirection::Left
    } else {
        RelativeDirection::Behind
    }
}

/// Whether a reported heading carries direction information.
///
/// Location providers report 0 when no bearing is available, so zero,
/// negative and non-finite headings are all treated as unknown.
#[inline]
pub fn heading_is_known(heading: Option<f32>) -> bool {
    matches!(heading, Some(h) if h.is_finite() && h > 0.0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    /// Textbook haversine, kept separate from the implementation under test.
    fn reference_haversine(a: &GeoPoint, b: &GeoPoint) -> f64 {
        let phi1 = a.lat.to_radians();
        let phi2 = b.lat.to_radians();
        let d_phi = (b.lat - a.lat).to_radians();
        let d_lambda = (b.lon - a.lon).to_radians();
        let h = (d_phi / 2.0).sin() * (d_phi / 2.0).sin()
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin() * (d_lambda / 2.0).sin();
        6_371_000.0 * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
    }

    #[test]
    fn test_distance_same_point() {
        let p = GeoPoint::new(36.88, -107.855);
        assert_eq!(distance_meters(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_matches_reference() {
        let pairs = [
            (GeoPoint::new(36.88, -107.855), GeoPoint::new(36.881, -107.856)),
            (GeoPoint::new(51.5074, -0.1278), GeoPoint::new(48.8566, 2.3522)),
            (GeoPoint::new(-33.86, 151.21), GeoPoint::new(40.71, -74.0)),
        ];
        for (a, b) in pairs {
            let expected = reference_haversine(&a, &b);
            assert!(approx_eq(distance_meters(&a, &b), expected, expected * 1e-12 + 1e-9));
        }
    }

    #[test]
    fn test_distance_symmetry() {
        let a = GeoPoint::new(36.8812, -107.8433);
        let b = GeoPoint::new(36.9021, -107.8710);
        let ab = distance_meters(&a, &b);
        let ba = distance_meters(&b, &a);
        assert!((ab - ba).abs() <= ab * 1e-6);
    }

    #[test]
    fn test_distance_tolerates_out_of_range_input() {
        let a = GeoPoint::new(95.0, 200.0);
        let b = GeoPoint::new(-91.0, -190.0);
        assert!(distance_meters(&a, &b).is_finite());

        let nan = GeoPoint::new(f64::NAN, 0.0);
        assert!(distance_meters(&nan, &b).is_nan());
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert!((initial_bearing_degrees(&origin, &GeoPoint::new(1.0, 0.0)) - 0.0).abs() < 1e-3);
        assert!((initial_bearing_degrees(&origin, &GeoPoint::new(0.0, 1.0)) - 90.0).abs() < 1e-3);
        assert!((initial_bearing_degrees(&origin, &GeoPoint::new(-1.0, 0.0)) - 180.0).abs() < 1e-3);
        assert!((initial_bearing_degrees(&origin, &GeoPoint::new(0.0, -1.0)) - 270.0).abs() < 1e-3);
    }

    #[test]
    fn test_bearing_is_normalized() {
        let origin = GeoPoint::new(36.88, -107.855);
        for i in 0..36 {
            let angle = (i as f64 * 10.0).to_radians();
            let target = GeoPoint::new(36.88 + 0.01 * angle.cos(), -107.855 + 0.01 * angle.sin());
            let b = initial_bearing_degrees(&origin, &target);
            assert!((0.0..360.0).contains(&b), "bearing {} out of range", b);
        }
    }

    #[test]
    fn test_compass_octants() {
        assert_eq!(compass_octant(0.0), Compass::N);
        assert_eq!(compass_octant(22.4), Compass::N);
        assert_eq!(compass_octant(22.5), Compass::NE);
        assert_eq!(compass_octant(44.0), Compass::NE);
        assert_eq!(compass_octant(46.0), Compass::NE);
        assert_eq!(compass_octant(337.4), Compass::NW);
        assert_eq!(compass_octant(337.5), Compass::N);
        assert_eq!(compass_octant(90.0), Compass::E);
        assert_eq!(compass_octant(180.0), Compass::S);
        assert_eq!(compass_octant(225.0), Compass::SW);
        assert_eq!(compass_octant(300.0), Compass::NW);
        assert_eq!(compass_octant(359.0), Compass::N);
        assert_eq!(compass_octant(-10.0), Compass::N);
        assert_eq!(compass_octant(f32::NAN), Compass::N);
    }

    #[test]
    fn test_relative_direction_buckets() {
        assert_eq!(relative_direction(90.0, 90.0), RelativeDirection::Ahead);
        assert_eq!(relative_direction(90.0, 120.0), RelativeDirection::Ahead);
        assert_eq!(relative_direction(90.0, 60.0), RelativeDirection::Ahead);
        assert_eq!(relative_direction(90.0, 180.0), RelativeDirection::Right);
        assert_eq!(relative_direction(90.0, 0.0), RelativeDirection::Left);
        assert_eq!(relative_direction(90.0, 270.0), RelativeDirection::Behind);
        assert_eq!(relative_direction(90.0, 240.0), RelativeDirection::Behind);
    }

    #[test]
    fn test_relative_direction_edges() {
        assert_eq!(relative_direction(0.0, 30.0), RelativeDirection::Ahead);
        assert_eq!(relative_direction(0.0, 330.0), RelativeDirection::Ahead);
        assert_eq!(relative_direction(0.0, 149.9), RelativeDirection::Right);
        assert_eq!(relative_direction(0.0, 150.0), RelativeDirection::Behind);
        assert_eq!(relative_direction(0.0, 180.0), RelativeDirection::Behind);
        // -150 sits on the behind side of the left edge
        assert_eq!(relative_direction(0.0, 210.0), RelativeDirection::Behind);
        assert_eq!(relative_direction(0.0, 210.1), RelativeDirection::Left);
    }

    #[test]
    fn test_relative_direction_wraps_around_north() {
        // Heading 350, target 10: 20 degrees to the right
        assert_eq!(relative_direction(350.0, 10.0), RelativeDirection::Ahead);
        // Heading 10, target 300: 70 degrees to the left
        assert_eq!(relative_direction(10.0, 300.0), RelativeDirection::Left);
        // Heading 300, target 60: 120 degrees to the right
        assert_eq!(relative_direction(300.0, 60.0), RelativeDirection::Right);
    }

    #[test]
    fn test_heading_is_known() {
        assert!(heading_is_known(Some(12.5)));
        assert!(!heading_is_known(Some(0.0)));
        assert!(!heading_is_known(Some(f32::NAN)));
        assert!(!heading_is_known(None));
    }

    #[test]
    fn test_polyline_length() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[GeoPoint::new(36.88, -107.855)]), 0.0);

        let nodes = vec![
            GeoPoint::new(36.880, -107.855),
            GeoPoint::new(36.881, -107.855),
            GeoPoint::new(36.882, -107.855),
        ];
        let length = polyline_length(&nodes);
        assert!(approx_eq(length, 222.4, 1.0));
    }
}
