//! Plane and great-circle geometry.
//!
//! [`Point`] lives in the normalized 0-100 dispatch plane used by the fleet
//! simulation. [`GeoFix`] is a latitude/longitude sample from a location
//! source, and [`MileageTracker`] turns a stream of fixes into trip miles.

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Fixes closer than this to the anchor are treated as GPS jitter.
pub const DEFAULT_JITTER_THRESHOLD_MILES: f64 = 0.005;

/// A position in the 0-100 dispatch plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Move `step` units along the straight line toward `target`.
    ///
    /// The move is clamped to the remaining distance, so the result never
    /// passes `target`.
    pub fn step_toward(&self, target: Point, step: f64) -> Point {
        let d = self.distance_to(target);
        if d == 0.0 {
            return *self;
        }
        let travel = step.min(d);
        Point {
            x: self.x + (target.x - self.x) / d * travel,
            y: self.y + (target.y - self.y) / d * travel,
        }
    }
}

/// A single latitude/longitude sample, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub lat: f64,
    pub lon: f64,
}

impl GeoFix {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Great-circle distance between two fixes using the haversine formula.
pub fn haversine_miles(from: GeoFix, to: GeoFix) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

/// What happened to a fix handed to [`MileageTracker::record`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FixOutcome {
    /// First fix of the session; it became the anchor.
    Anchored,
    /// Distance was above the jitter threshold and was added to the total.
    Accepted { miles: f64 },
    /// Distance was within the jitter threshold; anchor and total unchanged.
    Jitter { miles: f64 },
    /// Non-finite coordinates; ignored.
    Invalid,
}

/// Accumulates trip miles from a stream of location fixes.
///
/// Only fixes that move more than the jitter threshold away from the anchor
/// are counted, and only those replace the anchor. Small repeated noise can
/// therefore never add up to phantom mileage.
#[derive(Debug, Clone, PartialEq)]
pub struct MileageTracker {
    anchor: Option<GeoFix>,
    total_miles: f64,
    jitter_threshold: f64,
    accepted: u64,
    discarded: u64,
}

impl Default for MileageTracker {
    fn default() -> Self {
        Self::new(DEFAULT_JITTER_THRESHOLD_MILES)
    }
}

impl MileageTracker {
    pub fn new(jitter_threshold: f64) -> Self {
        Self {
            anchor: None,
            total_miles: 0.0,
            jitter_threshold,
            accepted: 0,
            discarded: 0,
        }
    }

    pub fn record(&mut self, fix: GeoFix) -> FixOutcome {
        if !fix.is_finite() {
            self.discarded += 1;
            return FixOutcome::Invalid;
        }

        let Some(anchor) = self.anchor else {
            self.anchor = Some(fix);
            return FixOutcome::Anchored;
        };

        let miles = haversine_miles(anchor, fix);
        if miles > self.jitter_threshold {
            self.total_miles += miles;
            self.anchor = Some(fix);
            self.accepted += 1;
            FixOutcome::Accepted { miles }
        } else {
            trace!(miles, "discarding jitter fix");
            self.discarded += 1;
            FixOutcome::Jitter { miles }
        }
    }

    pub fn total_miles(&self) -> f64 {
        self.total_miles
    }

    /// Forget the anchor but keep the total, so the next fix re-anchors
    /// instead of counting the distance travelled while tracking was off.
    pub fn suspend(&mut self) {
        self.anchor = None;
    }

    pub fn anchor(&self) -> Option<GeoFix> {
        self.anchor
    }

    /// Number of fixes that moved the anchor.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Number of fixes dropped as jitter or invalid.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}
