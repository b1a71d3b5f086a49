use crate::error::GlobeError;
use crate::geo::Sector;

/// A 2D affine geotransform for rasters in geographic coordinates.
///
/// Maps raster coordinates (col, row) to (longitude, latitude) in degrees:
///   lon = a * col + b * row + c
///   lat = d * col + e * row + f
///
/// Raster coordinates are corner-based: pixel (0, 0) spans [0, 1) × [0, 1)
/// and its centre is (0.5, 0.5). In GDAL order the coefficients are
/// [c, a, b, f, d, e].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up grid whose upper-left corner is (`west`, `north`) and whose
    /// pixels measure `lon_step` × `lat_step` degrees.
    pub fn north_up(west: f64, north: f64, lon_step: f64, lat_step: f64) -> Self {
        Self::new(lon_step, 0.0, west, 0.0, -lat_step, north)
    }

    /// Create from a GDAL-style geotransform array [c, a, b, f, d, e].
    pub fn from_gdal(gt: &[f64; 6]) -> Self {
        Self::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    /// Apply the transform to (u, v).
    pub fn apply(&self, u: f64, v: f64) -> (f64, f64) {
        (
            self.a * u + self.b * v + self.c,
            self.d * u + self.e * v + self.f,
        )
    }

    /// (col, row) -> (lon, lat)
    pub fn to_geographic(&self, col: f64, row: f64) -> (f64, f64) {
        self.apply(col, row)
    }

    /// Geographic coordinates of the centre of pixel (col, row).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.to_geographic(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// True when there is no rotation or shear term.
    pub fn is_rectilinear(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }

    /// Compute the inverse transform, (lon, lat) -> (col, row).
    pub fn inverse(&self) -> Result<Affine, GlobeError> {
        let det = self.a * self.e - self.b * self.d;
        if !det.is_finite() || det.abs() < f64::EPSILON * f64::EPSILON {
            return Err(GlobeError::Affine(format!(
                "geotransform is singular (determinant {det})"
            )));
        }
        let inv_det = 1.0 / det;
        Ok(Affine {
            a: self.e * inv_det,
            b: -self.b * inv_det,
            c: (self.b * self.f - self.e * self.c) * inv_det,
            d: -self.d * inv_det,
            e: self.a * inv_det,
            f: (self.d * self.c - self.a * self.f) * inv_det,
        })
    }

    /// Bounding sector of a `columns × rows` raster placed by this transform.
    pub fn extent(&self, columns: usize, rows: usize) -> Sector {
        let (w, h) = (columns as f64, rows as f64);
        let corners = [
            self.to_geographic(0.0, 0.0),
            self.to_geographic(w, 0.0),
            self.to_geographic(0.0, h),
            self.to_geographic(w, h),
        ];
        let mut sector = Sector::new(
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
        );
        for (lon, lat) in corners {
            sector.min_latitude = sector.min_latitude.min(lat);
            sector.max_latitude = sector.max_latitude.max(lat);
            sector.min_longitude = sector.min_longitude.min(lon);
            sector.max_longitude = sector.max_longitude.max(lon);
        }
        sector
    }
}
