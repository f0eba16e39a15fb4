pub mod linalg;

pub use linalg::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};

/// A single timestamped geodetic sample from a positioning sensor.
///
/// Only `latitude`, `longitude`, `altitude` and `timestamp` feed the filter.
/// The accuracy, course and speed fields are carried through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub horizontal_accuracy: Option<f64>,
    #[serde(default)]
    pub vertical_accuracy: Option<f64>,
    #[serde(default)]
    pub course: Option<f64>,
    #[serde(default)]
    pub course_accuracy: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub speed_accuracy: Option<f64>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, altitude: f64, timestamp: DateTime<Utc>) -> Self {
        Fix {
            latitude,
            longitude,
            altitude,
            timestamp,
            horizontal_accuracy: None,
            vertical_accuracy: None,
            course: None,
            course_accuracy: None,
            speed: None,
            speed_accuracy: None,
        }
    }

    pub fn with_accuracy(mut self, horizontal: f64, vertical: f64) -> Self {
        self.horizontal_accuracy = Some(horizontal);
        self.vertical_accuracy = Some(vertical);
        self
    }

    pub fn with_course(mut self, course: f64, accuracy: f64) -> Self {
        self.course = Some(course);
        self.course_accuracy = Some(accuracy);
        self
    }

    pub fn with_speed(mut self, speed: f64, accuracy: f64) -> Self {
        self.speed = Some(speed);
        self.speed_accuracy = Some(accuracy);
        self
    }

    /// Reject non-finite coordinates before they reach the filter.
    ///
    /// No range check is applied: callers may feed degrees or a local metric frame.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("latitude", self.latitude),
            ("longitude", self.longitude),
            ("altitude", self.altitude),
        ] {
            if !value.is_finite() {
                return Err(FilterError::InvalidCoordinate { field, value });
            }
        }
        Ok(())
    }

    /// Coordinates in state order (lat, lon, alt)
    pub fn coordinates(&self) -> [f64; AXIS_COUNT] {
        [self.latitude, self.longitude, self.altitude]
    }

    /// Copy of this fix with the coordinates replaced; every other field is kept.
    pub fn with_coordinates(&self, latitude: f64, longitude: f64, altitude: f64) -> Self {
        Fix {
            latitude,
            longitude,
            altitude,
            ..self.clone()
        }
    }

    /// Signed seconds elapsed from `earlier` to this fix
    pub fn seconds_since(&self, earlier: &Fix) -> f64 {
        let delta = self.timestamp.signed_duration_since(earlier.timestamp);
        match delta.num_nanoseconds() {
            Some(ns) => ns as f64 * 1e-9,
            // Beyond ~292 years the nanosecond count overflows
            None => delta.num_milliseconds() as f64 * 1e-3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_validate_accepts_finite() {
        let fix = Fix::new(45.0, 15.0, 100.0, t0());
        assert!(fix.validate().is_ok());

        // Metric local frames are allowed, so out-of-range degrees pass
        let fix = Fix::new(1200.0, -4000.0, 0.0, t0());
        assert!(fix.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let fix = Fix::new(45.0, f64::NAN, 100.0, t0());
        match fix.validate() {
            Err(FilterError::InvalidCoordinate { field, .. }) => assert_eq!(field, "longitude"),
            other => panic!("unexpected result: {:?}", other),
        }

        let fix = Fix::new(45.0, 15.0, f64::INFINITY, t0());
        assert!(matches!(
            fix.validate(),
            Err(FilterError::InvalidCoordinate { field: "altitude", .. })
        ));
    }

    #[test]
    fn test_seconds_since() {
        let a = Fix::new(0.0, 0.0, 0.0, t0());
        let b = Fix::new(0.0, 0.0, 0.0, t0() + Duration::milliseconds(1500));
        assert!((b.seconds_since(&a) - 1.5).abs() < 1e-12);
        assert!((a.seconds_since(&b) + 1.5).abs() < 1e-12);
        assert_eq!(a.seconds_since(&a), 0.0);
    }

    #[test]
    fn test_with_coordinates_keeps_passthrough() {
        let fix = Fix::new(45.0, 15.0, 100.0, t0())
            .with_accuracy(5.0, 8.0)
            .with_course(90.0, 2.0)
            .with_speed(3.5, 0.4);
        let moved = fix.with_coordinates(46.0, 16.0, 110.0);

        assert_eq!(moved.latitude, 46.0);
        assert_eq!(moved.altitude, 110.0);
        assert_eq!(moved.timestamp, fix.timestamp);
        assert_eq!(moved.horizontal_accuracy, Some(5.0));
        assert_eq!(moved.course, Some(90.0));
        assert_eq!(moved.speed_accuracy, Some(0.4));
    }

    #[test]
    fn test_fix_json_defaults() {
        let json = r#"{
            "latitude": 45.0,
            "longitude": 15.0,
            "altitude": 100.0,
            "timestamp": "2024-05-01T12:00:00Z"
        }"#;
        let fix: Fix = serde_json::from_str(json).unwrap();
        assert_eq!(fix.timestamp, t0());
        assert_eq!(fix.speed, None);
    }
}
