//! Rectangular sample grids and the row-cached forward transform used to
//! fill them.
//!
//! A grid sample (row, col) sits at
//!   lat = origin_latitude  + row·latitude_delta
//!   lon = origin_longitude + col·longitude_delta
//! and results are stored row-major at `row·columns + col`.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::elevation::ElevationModel;
use crate::error::ProjError;
use crate::geo::Sector;
use crate::proj::ellipsoid::Ellipsoid;

/// Slack allowed when a row lands past a pole through accumulated rounding.
const POLE_SLACK_DEG: f64 = 1e-9;

/// Description of a rectangular block of geographic samples (degrees).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub origin_latitude: f64,
    pub origin_longitude: f64,
    pub rows: usize,
    pub columns: usize,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
    /// Height used for every sample when no elevation model is supplied.
    #[serde(default)]
    pub altitude: f64,
}

impl Grid {
    pub fn new(
        origin_latitude: f64,
        origin_longitude: f64,
        rows: usize,
        columns: usize,
        latitude_delta: f64,
        longitude_delta: f64,
    ) -> Self {
        Self {
            origin_latitude,
            origin_longitude,
            rows,
            columns,
            latitude_delta,
            longitude_delta,
            altitude: 0.0,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    /// Sample `sector` with `rows × columns` points, edges included.
    ///
    /// Row 0 lies on `min_latitude` and column 0 on `min_longitude`; a single
    /// row or column collapses onto the minimum edge.
    pub fn from_sector(sector: &Sector, rows: usize, columns: usize) -> Result<Self, ProjError> {
        if rows == 0 || columns == 0 {
            return Err(ProjError::InvalidGrid(format!(
                "grid must have at least one row and column, got {rows}x{columns}"
            )));
        }
        let latitude_delta = if rows > 1 {
            sector.delta_latitude() / (rows - 1) as f64
        } else {
            0.0
        };
        let longitude_delta = if columns > 1 {
            sector.delta_longitude() / (columns - 1) as f64
        } else {
            0.0
        };
        let grid = Self::new(
            sector.min_latitude,
            sector.min_longitude,
            rows,
            columns,
            latitude_delta,
            longitude_delta,
        );
        grid.validate()?;
        Ok(grid)
    }

    /// Number of samples, saturating for dimensions that fail [`Grid::validate`].
    pub fn len(&self) -> usize {
        self.rows.saturating_mul(self.columns)
    }

    /// Length of the flat `[x, y, z, ...]` buffer for this grid.
    pub fn packed_len(&self) -> Result<usize, ProjError> {
        self.rows
            .checked_mul(self.columns)
            .and_then(|n| n.checked_mul(3))
            .ok_or_else(|| {
                ProjError::InvalidGrid(format!(
                    "{}x{} grid overflows the coordinate buffer",
                    self.rows, self.columns
                ))
            })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Latitude of `row` in degrees, pinned to ±90 when rounding overshoots a pole.
    #[inline]
    pub fn latitude(&self, row: usize) -> f64 {
        (self.origin_latitude + row as f64 * self.latitude_delta).clamp(-90.0, 90.0)
    }

    #[inline]
    pub fn longitude(&self, col: usize) -> f64 {
        self.origin_longitude + col as f64 * self.longitude_delta
    }

    /// (latitude, longitude) of sample (row, col).
    pub fn coordinate(&self, row: usize, col: usize) -> (f64, f64) {
        (self.latitude(row), self.longitude(col))
    }

    pub fn validate(&self) -> Result<(), ProjError> {
        if self.rows == 0 || self.columns == 0 {
            return Err(ProjError::InvalidGrid(format!(
                "grid must have at least one row and column, got {}x{}",
                self.rows, self.columns
            )));
        }
        if self.rows.checked_mul(self.columns).is_none() {
            return Err(ProjError::InvalidGrid(format!(
                "{}x{} grid has more samples than fit in memory",
                self.rows, self.columns
            )));
        }
        let finite = [
            self.origin_latitude,
            self.origin_longitude,
            self.latitude_delta,
            self.longitude_delta,
            self.altitude,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(ProjError::NonFinite("grid parameter"));
        }
        let first = self.origin_latitude;
        let last = self.origin_latitude + (self.rows - 1) as f64 * self.latitude_delta;
        for lat in [first, last] {
            if lat.abs() > 90.0 + POLE_SLACK_DEG {
                return Err(ProjError::LatitudeOutOfRange(lat));
            }
        }
        Ok(())
    }

    /// Validate the grid and check that `actual` output slots match it.
    pub(crate) fn check_output(&self, actual: usize) -> Result<(), ProjError> {
        self.validate()?;
        let expected = self.len();
        if actual != expected {
            return Err(ProjError::BufferSize { expected, actual });
        }
        Ok(())
    }
}

/// Latitude-dependent forward terms, computed once per grid row.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RowTerms {
    sin_lat: f64,
    cos_lat: f64,
    /// Prime-vertical radius N(φ)
    n: f64,
    /// N(φ)·(1 - e²)
    n_polar: f64,
}

impl RowTerms {
    /// `lat` is in degrees.
    #[inline]
    pub(crate) fn new(ellipsoid: &Ellipsoid, lat: f64) -> Self {
        let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
        let n = ellipsoid.prime_vertical_from_sin(sin_lat);
        Self {
            sin_lat,
            cos_lat,
            n,
            n_polar: n * (1.0 - ellipsoid.e2),
        }
    }

    #[inline]
    pub(crate) fn point(&self, sin_lon: f64, cos_lon: f64, h: f64) -> DVec3 {
        let r = (self.n + h) * self.cos_lat;
        DVec3::new(r * cos_lon, r * sin_lon, (self.n_polar + h) * self.sin_lat)
    }
}

/// Resolve the height of a sample: an elevation model overrides `fallback`,
/// with missing data read as 0.
#[inline]
pub(crate) fn sample_height(
    elevation: Option<&dyn ElevationModel>,
    lat: f64,
    lon: f64,
    fallback: f64,
) -> f64 {
    match elevation {
        Some(model) => model.elevation_at(lat, lon).unwrap_or(0.0),
        None => fallback,
    }
}

/// Fill one output row. Longitude trig comes from `columns` when a cache is
/// supplied, otherwise it is evaluated per sample.
///
/// A non-finite sampled height fails the row with the same error the
/// single-point transform reports.
#[inline]
pub(crate) fn fill_row(
    ellipsoid: &Ellipsoid,
    grid: &Grid,
    row: usize,
    elevation: Option<&dyn ElevationModel>,
    columns: Option<&[(f64, f64)]>,
    out: &mut [DVec3],
) -> Result<(), ProjError> {
    let lat = grid.latitude(row);
    let terms = RowTerms::new(ellipsoid, lat);
    for (col, slot) in out.iter_mut().enumerate() {
        let lon = grid.longitude(col);
        let (sin_lon, cos_lon) = match columns {
            Some(cache) => cache[col],
            None => lon.to_radians().sin_cos(),
        };
        let h = sample_height(elevation, lat, lon, grid.altitude);
        if !h.is_finite() {
            return Err(ProjError::NonFinite("altitude"));
        }
        *slot = terms.point(sin_lon, cos_lon, h);
    }
    Ok(())
}

/// Reusable grid filler that also caches the longitude terms of each column.
///
/// The per-row path already evaluates latitude trig once per row; keeping a
/// `GridTransformer` across frames removes the per-sample longitude trig as
/// well, at the cost of one scratch buffer that is only regrown when a wider
/// grid arrives.
#[derive(Debug, Default)]
pub struct GridTransformer {
    columns: Vec<(f64, f64)>,
}

impl GridTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill `out` (row-major, `grid.len()` slots) with ECEF points.
    pub fn transform(
        &mut self,
        ellipsoid: &Ellipsoid,
        grid: &Grid,
        elevation: Option<&dyn ElevationModel>,
        out: &mut [DVec3],
    ) -> Result<(), ProjError> {
        grid.check_output(out.len())?;
        self.columns.clear();
        self.columns
            .extend((0..grid.columns).map(|col| grid.longitude(col).to_radians().sin_cos()));

        tracing::trace!(rows = grid.rows, columns = grid.columns, "cached grid transform");
        for (row, row_out) in out.chunks_exact_mut(grid.columns).enumerate() {
            fill_row(ellipsoid, grid, row, elevation, Some(&self.columns), row_out)?;
        }
        Ok(())
    }
}
