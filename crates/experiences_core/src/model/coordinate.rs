//! Geographic coordinate value.

use super::ModelValidationError;
use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees (WGS84).
///
/// Only constructible through [`Coordinate::new`], so every live value is
/// within range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinateWire")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct CoordinateWire {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<CoordinateWire> for Coordinate {
    type Error = ModelValidationError;

    fn try_from(value: CoordinateWire) -> Result<Self, Self::Error> {
        Self::new(value.latitude, value.longitude)
    }
}

impl Coordinate {
    /// Builds a coordinate, rejecting non-finite or out-of-range degrees.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ModelValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ModelValidationError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ModelValidationError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[cfg(test)]
mod tests {
    use super::Coordinate;
    use crate::model::ModelValidationError;

    #[test]
    fn accepts_boundary_values() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_and_non_finite() {
        assert_eq!(
            Coordinate::new(90.5, 0.0).unwrap_err(),
            ModelValidationError::LatitudeOutOfRange(90.5)
        );
        assert_eq!(
            Coordinate::new(0.0, -181.0).unwrap_err(),
            ModelValidationError::LongitudeOutOfRange(-181.0)
        );
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }
}
