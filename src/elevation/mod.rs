//! Elevation providers consumed by the globe.
//!
//! The transforms never fetch terrain themselves; they ask an
//! [`ElevationModel`] for a height at a geographic location.

pub mod raster;

use serde::{Deserialize, Serialize};

pub use raster::RasterElevation;

/// Synchronous source of terrain height above the ellipsoid.
pub trait ElevationModel: Send + Sync {
    /// Height in metres at (lat°, lon°), or `None` where no data exists.
    fn elevation_at(&self, latitude: f64, longitude: f64) -> Option<f64>;
}

/// The same height everywhere.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConstantElevation(pub f64);

impl ElevationModel for ConstantElevation {
    fn elevation_at(&self, _latitude: f64, _longitude: f64) -> Option<f64> {
        Some(self.0)
    }
}

impl<F> ElevationModel for F
where
    F: Fn(f64, f64) -> Option<f64> + Send + Sync,
{
    fn elevation_at(&self, latitude: f64, longitude: f64) -> Option<f64> {
        self(latitude, longitude)
    }
}

/// How a raster is sampled between cell centres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMethod {
    Nearest,
    #[default]
    Bilinear,
}

impl SampleMethod {
    /// Parse from a string name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Some(Self::Nearest),
            "bilinear" => Some(Self::Bilinear),
            _ => None,
        }
    }
}
