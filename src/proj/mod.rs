pub mod ellipsoid;
pub mod equirectangular;
pub mod grid;
pub mod wgs84;

use glam::{DMat4, DVec3};

use crate::elevation::ElevationModel;
use crate::error::ProjError;
use crate::geo::GeographicPosition;
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::grid::{sample_height, Grid};

pub use equirectangular::EquirectangularProjection;
pub use grid::GridTransformer;
pub use wgs84::{InverseSettings, Wgs84Projection};

/// Trait for globe projections mapping geographic positions into a 3D
/// Cartesian frame and back.
///
/// Angles are in degrees and lengths in metres at this boundary. Every
/// operation is a pure function of its inputs and the supplied ellipsoid.
pub trait GlobeProjection: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Forward: (lat°, lon°, altitude m) -> Cartesian point
    fn geographic_to_cartesian(
        &self,
        ellipsoid: &Ellipsoid,
        lat: f64,
        lon: f64,
        alt: f64,
    ) -> Result<DVec3, ProjError>;

    /// Inverse: Cartesian point -> (lat°, lon°, altitude m)
    fn cartesian_to_geographic(
        &self,
        ellipsoid: &Ellipsoid,
        point: DVec3,
    ) -> Result<GeographicPosition, ProjError>;

    /// Local East-North-Up frame at `point`, as a 4×4 affine matrix whose
    /// first three columns are the E, N, U unit vectors and whose translation
    /// is `point`.
    fn cartesian_to_local_transform(
        &self,
        ellipsoid: &Ellipsoid,
        point: DVec3,
    ) -> Result<DMat4, ProjError>;

    /// Batch forward transform over a grid, written row-major into `out`.
    ///
    /// When `elevation` is given it replaces `grid.altitude` for every
    /// sample. Default: loop over the single-point transform, override to
    /// share per-row terms.
    fn geographic_to_cartesian_grid(
        &self,
        ellipsoid: &Ellipsoid,
        grid: &Grid,
        elevation: Option<&dyn ElevationModel>,
        out: &mut [DVec3],
    ) -> Result<(), ProjError> {
        grid.check_output(out.len())?;
        for (row, row_out) in out.chunks_exact_mut(grid.columns).enumerate() {
            let lat = grid.latitude(row);
            for (col, slot) in row_out.iter_mut().enumerate() {
                let lon = grid.longitude(col);
                let h = sample_height(elevation, lat, lon, grid.altitude);
                *slot = self.geographic_to_cartesian(ellipsoid, lat, lon, h)?;
            }
        }
        Ok(())
    }

    /// Local frame at a geographic position.
    fn geographic_to_local_transform(
        &self,
        ellipsoid: &Ellipsoid,
        lat: f64,
        lon: f64,
        alt: f64,
    ) -> Result<DMat4, ProjError> {
        let point = self.geographic_to_cartesian(ellipsoid, lat, lon, alt)?;
        self.cartesian_to_local_transform(ellipsoid, point)
    }
}

/// Assemble the ENU frame at geodetic (lat, lon) in radians, anchored at `origin`.
///
/// Up is the ellipsoid surface normal, East is horizontal and North = Up × East,
/// so the rotation is right-handed.
pub fn enu_frame(lat: f64, lon: f64, origin: DVec3) -> DMat4 {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    let up = DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);
    let east = DVec3::new(-sin_lon, cos_lon, 0.0).normalize();
    let north = up.cross(east);

    DMat4::from_cols(
        east.extend(0.0),
        north.extend(0.0),
        up.extend(0.0),
        origin.extend(1.0),
    )
}

/// Reject NaN and infinite components of a Cartesian input.
pub(crate) fn check_cartesian(point: DVec3) -> Result<(), ProjError> {
    if !point.is_finite() {
        return Err(ProjError::NonFinite("cartesian coordinate"));
    }
    Ok(())
}
