//! Geographic value types shared by the projections and the globe.

use serde::{Deserialize, Serialize};

use crate::error::ProjError;

/// Latitude/longitude in degrees, altitude in metres above the ellipsoid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeographicPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GeographicPosition {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Reject latitudes outside [-90, 90] and non-finite components.
    pub fn validate(&self) -> Result<(), ProjError> {
        check_geographic(self.latitude, self.longitude, self.altitude)
    }
}

/// Shared argument check for the forward transforms.
pub(crate) fn check_geographic(lat: f64, lon: f64, alt: f64) -> Result<(), ProjError> {
    if lat.is_nan() {
        return Err(ProjError::NonFinite("latitude"));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ProjError::LatitudeOutOfRange(lat));
    }
    if !lon.is_finite() {
        return Err(ProjError::NonFinite("longitude"));
    }
    if !alt.is_finite() {
        return Err(ProjError::NonFinite("altitude"));
    }
    Ok(())
}

/// Wrap a longitude in degrees into (-180, 180].
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// A latitude/longitude rectangle in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl Sector {
    pub fn new(
        min_latitude: f64,
        max_latitude: f64,
        min_longitude: f64,
        max_longitude: f64,
    ) -> Self {
        Self {
            min_latitude,
            max_latitude,
            min_longitude,
            max_longitude,
        }
    }

    /// The whole globe.
    pub fn full_sphere() -> Self {
        Self::new(-90.0, 90.0, -180.0, 180.0)
    }

    pub fn delta_latitude(&self) -> f64 {
        self.max_latitude - self.min_latitude
    }

    pub fn delta_longitude(&self) -> f64 {
        self.max_longitude - self.min_longitude
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        latitude >= self.min_latitude
            && latitude <= self.max_latitude
            && longitude >= self.min_longitude
            && longitude <= self.max_longitude
    }

    pub fn centroid(&self) -> (f64, f64) {
        (
            0.5 * (self.min_latitude + self.max_latitude),
            0.5 * (self.min_longitude + self.max_longitude),
        )
    }
}
