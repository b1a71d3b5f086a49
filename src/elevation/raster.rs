//! Gridded elevation (DEM) sampled through a geotransform.

use ndarray::Array2;
use num_traits::NumCast;

use crate::affine::Affine;
use crate::elevation::{ElevationModel, SampleMethod};
use crate::error::GlobeError;
use crate::formats::geotiff::GeoTiffMetadata;
use crate::geo::Sector;

/// Elevation raster in geographic coordinates.
///
/// Cells equal to `nodata`, NaN cells and locations outside the raster yield
/// no height. Bilinear sampling skips invalid corners and reweights the
/// remaining ones; positions in the outer half-cell ring clamp to the edge.
pub struct RasterElevation<T> {
    data: Array2<T>,
    to_geo: Affine,
    to_pixel: Affine,
    nodata: Option<T>,
    method: SampleMethod,
}

impl<T> RasterElevation<T>
where
    T: Copy + NumCast + PartialEq,
{
    pub fn new(data: Array2<T>, to_geo: Affine, method: SampleMethod) -> Result<Self, GlobeError> {
        if data.is_empty() {
            return Err(GlobeError::Shape("elevation raster is empty".into()));
        }
        let to_pixel = to_geo.inverse()?;
        tracing::debug!(
            rows = data.nrows(),
            columns = data.ncols(),
            ?method,
            "raster elevation loaded"
        );
        Ok(Self {
            data,
            to_geo,
            to_pixel,
            nodata: None,
            method,
        })
    }

    /// Build from decoded GeoTIFF samples and their metadata.
    pub fn from_geotiff(
        data: Array2<T>,
        metadata: &GeoTiffMetadata,
        method: SampleMethod,
    ) -> Result<Self, GlobeError> {
        if let (Some(w), Some(h)) = (metadata.image_width, metadata.image_length) {
            if (h as usize, w as usize) != data.dim() {
                return Err(GlobeError::Shape(format!(
                    "metadata describes {h}x{w} samples, got {:?}",
                    data.dim()
                )));
            }
        }
        let to_geo = metadata.geotransform().ok_or_else(|| {
            GlobeError::Elevation("GeoTIFF metadata has no usable georeferencing".into())
        })?;
        let mut raster = Self::new(data, to_geo, method)?;
        raster.nodata = metadata.no_data_value().and_then(|v| <T as NumCast>::from(v));
        Ok(raster)
    }

    pub fn with_nodata(mut self, nodata: T) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn method(&self) -> SampleMethod {
        self.method
    }

    pub fn extent(&self) -> Sector {
        self.to_geo.extent(self.data.ncols(), self.data.nrows())
    }

    /// Cell value as f64, or `None` for no-data and NaN.
    fn cell(&self, row: usize, col: usize) -> Option<f64> {
        let v = self.data[(row, col)];
        if self.nodata == Some(v) {
            return None;
        }
        let h: f64 = NumCast::from(v)?;
        (!h.is_nan()).then_some(h)
    }

    fn nearest(&self, x: f64, y: f64) -> Option<f64> {
        let (rows, cols) = self.data.dim();
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let (col, row) = (x.floor() as usize, y.floor() as usize);
        if col >= cols || row >= rows {
            return None;
        }
        self.cell(row, col)
    }

    fn bilinear(&self, x: f64, y: f64) -> Option<f64> {
        let (rows, cols) = self.data.dim();
        if x < 0.0 || y < 0.0 || x > cols as f64 || y > rows as f64 {
            return None;
        }
        // Centre-based position, clamped so the border half-cell reads the edge.
        let cx = (x - 0.5).clamp(0.0, (cols - 1) as f64);
        let cy = (y - 0.5).clamp(0.0, (rows - 1) as f64);
        let (c0, r0) = (cx.floor() as usize, cy.floor() as usize);
        let (c1, r1) = ((c0 + 1).min(cols - 1), (r0 + 1).min(rows - 1));
        let (tx, ty) = (cx - c0 as f64, cy - r0 as f64);

        let corners = [
            (r0, c0, (1.0 - tx) * (1.0 - ty)),
            (r0, c1, tx * (1.0 - ty)),
            (r1, c0, (1.0 - tx) * ty),
            (r1, c1, tx * ty),
        ];
        let mut sum = 0.0;
        let mut weight = 0.0;
        for (r, c, w) in corners {
            if w == 0.0 {
                continue;
            }
            if let Some(h) = self.cell(r, c) {
                sum += h * w;
                weight += w;
            }
        }
        (weight > 0.0).then(|| sum / weight)
    }
}

impl<T> ElevationModel for RasterElevation<T>
where
    T: Copy + NumCast + PartialEq + Send + Sync,
{
    fn elevation_at(&self, latitude: f64, longitude: f64) -> Option<f64> {
        let (x, y) = self.to_pixel.apply(longitude, latitude);
        match self.method {
            SampleMethod::Nearest => self.nearest(x, y),
            SampleMethod::Bilinear => self.bilinear(x, y),
        }
    }
}
