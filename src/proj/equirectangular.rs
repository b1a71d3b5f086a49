//! Flat (equirectangular, Plate Carrée) globe projection.
//!
//! forward: x = a·λ·cos(φ₁), y = a·φ, z = h
//! inverse: λ = x/(a·cos(φ₁)), φ = y/a, h = z
//!
//! The map lies in the z = 0 plane with altitude along +z, so the local frame
//! is the same everywhere: East = +x, North = +y, Up = +z.

use glam::{DMat4, DVec3};

use crate::error::ProjError;
use crate::geo::{check_geographic, GeographicPosition};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::{check_cartesian, GlobeProjection};

#[derive(Clone, Copy, Debug)]
pub struct EquirectangularProjection {
    cos_lat_ts: f64,
}

impl EquirectangularProjection {
    /// `lat_ts` is the standard parallel in degrees.
    pub fn new(lat_ts: f64) -> Self {
        Self {
            cos_lat_ts: lat_ts.to_radians().cos(),
        }
    }
}

impl Default for EquirectangularProjection {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl GlobeProjection for EquirectangularProjection {
    fn name(&self) -> &'static str {
        "equirectangular"
    }

    fn geographic_to_cartesian(
        &self,
        ellipsoid: &Ellipsoid,
        lat: f64,
        lon: f64,
        alt: f64,
    ) -> Result<DVec3, ProjError> {
        check_geographic(lat, lon, alt)?;
        let x = ellipsoid.a * lon.to_radians() * self.cos_lat_ts;
        let y = ellipsoid.a * lat.to_radians();
        Ok(DVec3::new(x, y, alt))
    }

    fn cartesian_to_geographic(
        &self,
        ellipsoid: &Ellipsoid,
        point: DVec3,
    ) -> Result<GeographicPosition, ProjError> {
        check_cartesian(point)?;
        let lon = (point.x / (ellipsoid.a * self.cos_lat_ts)).to_degrees();
        let lat = (point.y / ellipsoid.a).to_degrees();
        if lat.abs() > 90.0 {
            return Err(ProjError::LatitudeOutOfRange(lat));
        }
        Ok(GeographicPosition::new(lat, lon, point.z))
    }

    fn cartesian_to_local_transform(
        &self,
        _ellipsoid: &Ellipsoid,
        point: DVec3,
    ) -> Result<DMat4, ProjError> {
        check_cartesian(point)?;
        Ok(DMat4::from_translation(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::WGS84;
    use crate::proj::grid::Grid;
    use approx::assert_relative_eq;

    #[test]
    fn test_roundtrip() {
        let proj = EquirectangularProjection::default();
        let p = proj.geographic_to_cartesian(&WGS84, 45.0, 10.0, 250.0).unwrap();
        let g = proj.cartesian_to_geographic(&WGS84, p).unwrap();
        assert_relative_eq!(g.latitude, 45.0, epsilon = 1e-12);
        assert_relative_eq!(g.longitude, 10.0, epsilon = 1e-12);
        assert_relative_eq!(g.altitude, 250.0);
    }

    #[test]
    fn test_origin() {
        let proj = EquirectangularProjection::default();
        let p = proj.geographic_to_cartesian(&WGS84, 0.0, 0.0, 0.0).unwrap();
        assert_eq!(p, DVec3::ZERO);
        // The map origin is an ordinary point here, unlike the ellipsoid centre.
        assert!(proj.cartesian_to_geographic(&WGS84, p).is_ok());
    }

    #[test]
    fn test_with_standard_parallel() {
        // With standard parallel at 30°, x should be scaled by cos(30°)
        let proj = EquirectangularProjection::new(30.0);
        let p = proj.geographic_to_cartesian(&WGS84, 0.0, 1.0, 0.0).unwrap();
        let expected_x = WGS84.a * 1.0_f64.to_radians() * 30.0_f64.to_radians().cos();
        assert_relative_eq!(p.x, expected_x, epsilon = 1e-6);
    }

    #[test]
    fn test_dateline() {
        let proj = EquirectangularProjection::default();
        let east = proj.geographic_to_cartesian(&WGS84, 0.0, 180.0, 0.0).unwrap();
        let west = proj.geographic_to_cartesian(&WGS84, 0.0, -180.0, 0.0).unwrap();
        assert_relative_eq!(east.x, -west.x, epsilon = 1e-6);
    }

    #[test]
    fn test_inverse_rejects_beyond_pole() {
        let proj = EquirectangularProjection::default();
        let err = proj
            .cartesian_to_geographic(&WGS84, DVec3::new(0.0, WGS84.a * 2.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, ProjError::LatitudeOutOfRange(_)));
    }

    #[test]
    fn test_local_transform_is_translation() {
        let proj = EquirectangularProjection::default();
        let point = DVec3::new(1000.0, -2000.0, 30.0);
        let m = proj.cartesian_to_local_transform(&WGS84, point).unwrap();
        assert_eq!(m.w_axis.truncate(), point);
        assert_eq!(m.x_axis.truncate(), DVec3::X);
        assert_eq!(m.y_axis.truncate(), DVec3::Y);
        assert_eq!(m.z_axis.truncate(), DVec3::Z);
    }

    #[test]
    fn test_default_grid_path() {
        let proj = EquirectangularProjection::default();
        let grid = Grid::new(-10.0, -20.0, 3, 2, 10.0, 40.0).with_altitude(5.0);
        let mut out = vec![DVec3::ZERO; grid.len()];
        proj.geographic_to_cartesian_grid(&WGS84, &grid, None, &mut out)
            .unwrap();
        let expected = proj.geographic_to_cartesian(&WGS84, 10.0, 20.0, 5.0).unwrap();
        assert_eq!(out[5], expected);
    }
}
