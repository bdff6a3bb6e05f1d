//! Status text for the live data field.

use crate::{Match, TrailStatus};

/// Status shown when no trail is within range.
pub const NO_TRAIL_STATUS: &str = "No Trail";

/// Status shown when no trails are loaded at all.
pub const NO_TRAILS_STATUS: &str = "No Trails";

/// Turn a match into a short status string.
///
/// - on trail: `On: {name}`
/// - approaching/leaving: `{arrow }{name} ({compass})\n{meters}m`, with the
///   distance truncated toward zero and the arrow only when the heading was known
/// - otherwise: `No Trail`
///
/// ```
/// use trail_matcher::{format_status, Compass, Match, RelativeDirection, Trail, TrailStatus};
///
/// let m = Match {
///     trail: Some(Trail::new(1, "Road Apple", vec![])),
///     distance: 123.9,
///     status: TrailStatus::Approaching,
///     bearing_to_trail: 270.0,
///     compass: Compass::W,
///     relative_direction: Some(RelativeDirection::Left),
/// };
/// assert_eq!(format_status(&m), "← Road Apple (W)\n123m");
/// ```
pub fn format_status(matched: &Match) -> String {
    let name = matched.trail.as_ref().map_or("", |t| t.name.as_str());

    match matched.status {
        TrailStatus::OnTrail => format!("On: {}", name),
        TrailStatus::Approaching | TrailStatus::Leaving => {
            let arrow = matched
                .relative_direction
                .map(|d| format!("{} ", d.arrow()))
                .unwrap_or_default();
            format!(
                "{}{} ({})\n{}m",
                arrow,
                name,
                matched.compass,
                matched.distance.trunc() as i64
            )
        }
        TrailStatus::NoTrail => NO_TRAIL_STATUS.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Compass, RelativeDirection, Trail};

    fn matched(status: TrailStatus, distance: f64, direction: Option<RelativeDirection>) -> Match {
        Match {
            trail: Some(Trail::new(3, "Lucky Stone", vec![])),
            distance,
            status,
            bearing_to_trail: 45.0,
            compass: Compass::NE,
            relative_direction: direction,
        }
    }

    #[test]
    fn test_on_trail() {
        let m = matched(TrailStatus::OnTrail, 12.0, Some(RelativeDirection::Ahead));
        assert_eq!(format_status(&m), "On: Lucky Stone");
    }

    #[test]
    fn test_approaching_without_heading() {
        let m = matched(TrailStatus::Approaching, 87.99, None);
        assert_eq!(format_status(&m), "Lucky Stone (NE)\n87m");
    }

    #[test]
    fn test_leaving_with_arrow() {
        let m = matched(TrailStatus::Leaving, 150.5, Some(RelativeDirection::Behind));
        assert_eq!(format_status(&m), "↓ Lucky Stone (NE)\n150m");
    }

    #[test]
    fn test_no_trail() {
        let mut m = matched(TrailStatus::NoTrail, f64::INFINITY, None);
        m.trail = None;
        assert_eq!(format_status(&m), "No Trail");
    }

    #[test]
    fn test_formatting_is_pure() {
        let m = matched(TrailStatus::Approaching, 99.4, Some(RelativeDirection::Right));
        assert_eq!(format_status(&m), format_status(&m));
        assert_eq!(format_status(&m), "→ Lucky Stone (NE)\n99m");
    }
}
