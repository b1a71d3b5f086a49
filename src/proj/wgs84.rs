//! Geodetic (WGS84 ellipsoid) ↔ Earth-centred, Earth-fixed transforms.
//!
//! forward: x = (N + h)·cos φ·cos λ
//!          y = (N + h)·cos φ·sin λ
//!          z = (N·(1 - e²) + h)·sin φ
//! inverse: λ = atan2(y, x); φ by fixed-point iteration
//!          φ ← atan2(z + e²·N(φ)·sin φ, p), p = √(x² + y²);
//!          h = p·cos φ + (z + e²·N·sin φ)·sin φ - N
//!
//! The altitude expression is the polar-safe form of `p / cos φ - N`.

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::elevation::ElevationModel;
use crate::error::ProjError;
use crate::geo::{check_geographic, GeographicPosition};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::grid::{fill_row, Grid, RowTerms};
use crate::proj::{check_cartesian, enu_frame, GlobeProjection};

/// Convergence controls for the Cartesian → geographic iteration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InverseSettings {
    /// Stop once successive latitude estimates differ by less than this (radians).
    pub tolerance: f64,
    /// Hard bound on iterations; the last estimate is returned when reached.
    pub max_iterations: usize,
}

impl Default for InverseSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 16,
        }
    }
}

/// Geodetic inverse result in radians, before conversion to degrees.
#[derive(Clone, Copy, Debug)]
struct Geodetic {
    lat: f64,
    lon: f64,
    alt: f64,
}

/// The WGS84 globe projection: geodetic coordinates on an ellipsoid of
/// revolution mapped to ECEF.
#[derive(Clone, Copy, Debug, Default)]
pub struct Wgs84Projection {
    settings: InverseSettings,
}

impl Wgs84Projection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: InverseSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &InverseSettings {
        &self.settings
    }

    fn geodetic(&self, ellipsoid: &Ellipsoid, point: DVec3) -> Result<Geodetic, ProjError> {
        check_cartesian(point)?;
        if point == DVec3::ZERO {
            return Err(ProjError::DegenerateCartesian);
        }

        let DVec3 { x, y, z } = point;
        let e2 = ellipsoid.e2;
        let p = x.hypot(y);
        let lon = y.atan2(x);

        // Spherical first guess, then refine against the prime-vertical radius.
        // With p == 0 the atan2 pins φ to ±90° on the first pass.
        let mut lat = z.atan2(p);
        let mut converged = false;
        for _ in 0..self.settings.max_iterations {
            let sin_lat = lat.sin();
            let n = ellipsoid.prime_vertical_from_sin(sin_lat);
            let next = (z + e2 * n * sin_lat).atan2(p);
            let delta = (next - lat).abs();
            lat = next;
            if delta < self.settings.tolerance {
                converged = true;
                break;
            }
        }
        if !converged {
            tracing::warn!(
                x,
                y,
                z,
                max_iterations = self.settings.max_iterations,
                "geodetic latitude did not converge, returning last estimate"
            );
        }

        let (sin_lat, cos_lat) = lat.sin_cos();
        let n = ellipsoid.prime_vertical_from_sin(sin_lat);
        let alt = p * cos_lat + (z + e2 * n * sin_lat) * sin_lat - n;

        Ok(Geodetic { lat, lon, alt })
    }
}

impl GlobeProjection for Wgs84Projection {
    fn name(&self) -> &'static str {
        "wgs84"
    }

    fn geographic_to_cartesian(
        &self,
        ellipsoid: &Ellipsoid,
        lat: f64,
        lon: f64,
        alt: f64,
    ) -> Result<DVec3, ProjError> {
        check_geographic(lat, lon, alt)?;
        let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
        Ok(RowTerms::new(ellipsoid, lat).point(sin_lon, cos_lon, alt))
    }

    fn cartesian_to_geographic(
        &self,
        ellipsoid: &Ellipsoid,
        point: DVec3,
    ) -> Result<GeographicPosition, ProjError> {
        let g = self.geodetic(ellipsoid, point)?;
        Ok(GeographicPosition::new(
            g.lat.to_degrees(),
            g.lon.to_degrees(),
            g.alt,
        ))
    }

    fn cartesian_to_local_transform(
        &self,
        ellipsoid: &Ellipsoid,
        point: DVec3,
    ) -> Result<DMat4, ProjError> {
        let g = self.geodetic(ellipsoid, point)?;
        Ok(enu_frame(g.lat, g.lon, point))
    }

    /// Row-cached grid path: sin φ, cos φ and N are evaluated once per row.
    fn geographic_to_cartesian_grid(
        &self,
        ellipsoid: &Ellipsoid,
        grid: &Grid,
        elevation: Option<&dyn ElevationModel>,
        out: &mut [DVec3],
    ) -> Result<(), ProjError> {
        grid.check_output(out.len())?;
        tracing::trace!(rows = grid.rows, columns = grid.columns, "wgs84 grid transform");
        for (row, row_out) in out.chunks_exact_mut(grid.columns).enumerate() {
            fill_row(ellipsoid, grid, row, elevation, None, row_out)?;
        }
        Ok(())
    }

    fn geographic_to_local_transform(
        &self,
        ellipsoid: &Ellipsoid,
        lat: f64,
        lon: f64,
        alt: f64,
    ) -> Result<DMat4, ProjError> {
        // The geodetic angles are already known, skip the inverse.
        let point = self.geographic_to_cartesian(ellipsoid, lat, lon, alt)?;
        Ok(enu_frame(lat.to_radians(), lon.to_radians(), point))
    }
}
