//! Pure geo and unit helpers plus the distance gate that decides when a
//! new point gets logged.

use crate::domain::model::{DistanceReference, Position};

const EARTH_RADIUS_M: f64 = 6_371_008.8;
const METRES_PER_FOOT: f64 = 0.3048;
const MPS_TO_MPH: f64 = 2.23694;
const METRES_TO_FEET: f64 = 3.28084;

/// Great-circle distance in feet (Haversine, mean earth radius).
pub fn distance_feet(a: Position, b: Position) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c / METRES_PER_FOOT
}

/// Degrees, minutes and hundredths of a second of `|deg|`, truncated.
/// The hemisphere travels separately in the EXIF ref tag.
pub fn dec_to_dms(deg: f64) -> (u32, u32, u32) {
    let deg = deg.abs();
    let degrees = deg.trunc();
    let minutes_f = 60.0 * (deg - degrees);
    let minutes = minutes_f.trunc();
    let hundredths = (6000.0 * (minutes_f - minutes)).trunc();

    (degrees as u32, minutes as u32, hundredths as u32)
}

pub fn latitude_ref(latitude: f64) -> &'static str {
    if latitude < 0.0 {
        "S"
    } else {
        "N"
    }
}

pub fn longitude_ref(longitude: f64) -> &'static str {
    if longitude < 0.0 {
        "W"
    } else {
        "E"
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn mps_to_mph(speed: f64) -> f64 {
    round1(speed * MPS_TO_MPH)
}

pub fn metres_to_feet(metres: f64) -> f64 {
    round1(metres * METRES_TO_FEET)
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    round1(celsius * 9.0 / 5.0 + 32.0)
}

/// Lenient numeric parse: anything unparseable, NaN or infinite is 0.0.
pub fn parse_number(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

pub fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Decides whether an observed position is far enough from the reference
/// to log a new point, and hands out the point index when it is.
#[derive(Debug, Clone)]
pub struct DistanceTracker {
    reference: Position,
    last_index: u32,
    threshold_feet: f64,
    mode: DistanceReference,
}

impl DistanceTracker {
    pub fn new(threshold_feet: f64, mode: DistanceReference) -> Self {
        Self {
            reference: Position::default(),
            last_index: 0,
            threshold_feet,
            mode,
        }
    }

    /// Returns the index `position` would be logged under, without
    /// committing it. Under `LastPoll` a rejected position still becomes the
    /// reference.
    pub fn candidate(&mut self, position: Position) -> Option<u32> {
        let travelled = distance_feet(self.reference, position);
        let accepted = travelled > self.threshold_feet;

        tracing::debug!(
            "Travelled {:.1}ft since reference (threshold {}ft)",
            travelled,
            self.threshold_feet
        );

        if accepted {
            Some(self.last_index + 1)
        } else {
            if self.mode == DistanceReference::LastPoll {
                self.reference = position;
            }
            None
        }
    }

    /// Makes `position` the latest logged point. Call only once it has
    /// been recorded.
    pub fn commit(&mut self, position: Position) -> u32 {
        self.reference = position;
        self.last_index += 1;
        self.last_index
    }

    pub fn observe(&mut self, position: Position) -> Option<u32> {
        self.candidate(position)?;
        Some(self.commit(position))
    }

    pub fn last_index(&self) -> u32 {
        self.last_index
    }

    pub fn reference(&self) -> Position {
        self.reference
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_feet_known_pair() {
        // one arc-minute of latitude is roughly one nautical mile
        let a = Position::new(40.0, -90.0);
        let b = Position::new(40.0 + 1.0 / 60.0, -90.0);
        let feet = distance_feet(a, b);
        assert!((feet - 6080.0).abs() < 15.0, "got {}", feet);
    }

    #[test]
    fn test_distance_feet_is_symmetric_and_zero_on_same_point() {
        let a = Position::new(41.8781, -87.6298);
        let b = Position::new(41.8790, -87.6310);
        assert_eq!(distance_feet(a, a), 0.0);
        assert!((distance_feet(a, b) - distance_feet(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_dec_to_dms_truncates_and_drops_sign() {
        assert_eq!(dec_to_dms(41.8781), (41, 52, 4116));
        assert_eq!(dec_to_dms(-87.6298), (87, 37, 4728));
        assert_eq!(dec_to_dms(0.0), (0, 0, 0));
    }

    #[test]
    fn test_hemisphere_refs() {
        assert_eq!(latitude_ref(-0.5), "S");
        assert_eq!(latitude_ref(0.0), "N");
        assert_eq!(longitude_ref(-87.0), "W");
        assert_eq!(longitude_ref(12.0), "E");
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(mps_to_mph(10.0), 22.4);
        assert_eq!(metres_to_feet(100.0), 328.1);
        assert_eq!(celsius_to_fahrenheit(21.5), 70.7);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
    }

    #[test]
    fn test_parse_number_is_lenient() {
        assert_eq!(parse_number("12.5"), 12.5);
        assert_eq!(parse_number("nan"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
        assert_eq!(parse_number("n/a"), 0.0);
        assert_eq!(finite_or_zero(Some(f64::NAN)), 0.0);
        assert_eq!(finite_or_zero(None), 0.0);
    }

    #[test]
    fn test_tracker_last_logged_accumulates_slow_movement() {
        let mut tracker = DistanceTracker::new(100.0, DistanceReference::LastLogged);
        let start = Position::new(41.0, -87.0);
        assert_eq!(tracker.observe(start), Some(1));

        // ~60ft steps north; each poll alone is under the threshold
        let step = 60.0 * METRES_PER_FOOT / 111_195.0;
        assert_eq!(tracker.observe(Position::new(41.0 + step, -87.0)), None);
        assert_eq!(tracker.observe(Position::new(41.0 + 2.0 * step, -87.0)), Some(2));
        assert_eq!(tracker.last_index(), 2);
    }

    #[test]
    fn test_tracker_last_poll_resets_every_observation() {
        let mut tracker = DistanceTracker::new(100.0, DistanceReference::LastPoll);
        let start = Position::new(41.0, -87.0);
        assert_eq!(tracker.observe(start), Some(1));

        let step = 60.0 * METRES_PER_FOOT / 111_195.0;
        assert_eq!(tracker.observe(Position::new(41.0 + step, -87.0)), None);
        assert_eq!(tracker.observe(Position::new(41.0 + 2.0 * step, -87.0)), None);
        assert_eq!(tracker.reference(), Position::new(41.0 + 2.0 * step, -87.0));
    }

    #[test]
    fn test_tracker_requires_strictly_greater_distance() {
        let mut tracker = DistanceTracker::new(0.0, DistanceReference::LastLogged);
        let p = Position::new(10.0, 10.0);
        assert_eq!(tracker.observe(p), Some(1));
        assert_eq!(tracker.observe(p), None);
    }

    #[test]
    fn test_uncommitted_candidate_is_offered_again() {
        let mut tracker = DistanceTracker::new(100.0, DistanceReference::LastLogged);
        let p = Position::new(41.0, -87.0);

        assert_eq!(tracker.candidate(p), Some(1));
        // recording failed: nothing moved
        assert_eq!(tracker.reference(), Position::default());
        assert_eq!(tracker.last_index(), 0);

        assert_eq!(tracker.candidate(p), Some(1));
        assert_eq!(tracker.commit(p), 1);
        assert_eq!(tracker.candidate(p), None);
        assert_eq!(tracker.candidate(Position::new(42.0, -87.0)), Some(2));
    }

    #[test]
    fn test_last_poll_keeps_reference_on_uncommitted_candidate() {
        let mut tracker = DistanceTracker::new(100.0, DistanceReference::LastPoll);
        let p = Position::new(41.0, -87.0);

        assert_eq!(tracker.candidate(p), Some(1));
        assert_eq!(tracker.candidate(p), Some(1));
    }
}
