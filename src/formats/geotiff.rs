//! TIFF and GeoTIFF tag values for a single image.
//!
//! This is a plain record filled in by whatever decoder reads the file. The
//! helpers only interpret the georeferencing tags.

use serde::{Deserialize, Serialize};

use crate::affine::Affine;
use crate::geo::Sector;

/// GTModelTypeGeoKey
pub const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
/// GTRasterTypeGeoKey
pub const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
/// ProjectedCSTypeGeoKey
pub const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_POINT: u16 = 2;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoTiffMetadata {
    /// Bits per component, one entry per sample.
    pub bits_per_sample: Option<Vec<u16>>,
    /// RGB lookup table for palette-colour images.
    pub color_map: Option<Vec<u16>>,
    pub compression: Option<u16>,
    /// Number of rows in the image.
    pub image_length: Option<u32>,
    /// Number of columns in the image.
    pub image_width: Option<u32>,
    pub photometric_interpretation: Option<u16>,
    pub planar_configuration: Option<u16>,
    pub rows_per_strip: Option<u32>,
    /// Components per pixel.
    pub samples_per_pixel: Option<u16>,
    /// 1 = unsigned integer, 2 = signed integer, 3 = IEEE float, 4 = undefined.
    pub sample_format: Option<Vec<u16>>,
    /// Compressed byte count of each strip.
    pub strip_byte_counts: Option<Vec<u64>>,
    /// Byte offset of each strip.
    pub strip_offsets: Option<Vec<u64>>,
    /// Byte offset of each tile.
    pub tile_offsets: Option<Vec<u64>>,
    /// ASCII-valued GeoKeys referenced by the key directory.
    pub geo_ascii_params: Option<Vec<String>>,
    /// DOUBLE-valued GeoKeys referenced by the key directory.
    pub geo_double_params: Option<Vec<f64>>,
    /// Raw GeoKeyDirectoryTag: a 4-value header followed by
    /// (key id, tag location, count, value) quadruples.
    pub geo_key_directory: Option<Vec<u16>>,
    /// ModelPixelScaleTag (sx, sy, sz).
    pub model_pixel_scale: Option<Vec<f64>>,
    /// ModelTiepointTag (I, J, K, X, Y, Z) sextuples.
    pub model_tiepoint: Option<Vec<f64>>,
    /// ModelTransformationTag, a row-major 4×4 matrix.
    pub model_transformation: Option<Vec<f64>>,
    /// GDAL_NODATA, stored as text.
    pub no_data: Option<String>,
    pub bbox: Option<Sector>,
    /// EPSG code of the projected coordinate system.
    pub projected_cs_type: Option<u16>,
}

impl GeoTiffMetadata {
    /// Inline SHORT value of `key` in the GeoKey directory.
    ///
    /// Keys stored in another tag (non-zero location) are not resolved.
    pub fn geo_key(&self, key: u16) -> Option<u16> {
        let dir = self.geo_key_directory.as_deref()?;
        let header = dir.get(..4)?;
        let count = header[3] as usize;
        dir[4..]
            .chunks_exact(4)
            .take(count)
            .find(|entry| entry[0] == key && entry[1] == 0)
            .map(|entry| entry[3])
    }

    /// Whether the model space is latitude/longitude.
    pub fn is_geographic(&self) -> bool {
        self.geo_key(GT_MODEL_TYPE_GEO_KEY) == Some(MODEL_TYPE_GEOGRAPHIC)
    }

    pub fn is_pixel_is_point(&self) -> bool {
        self.geo_key(GT_RASTER_TYPE_GEO_KEY) == Some(RASTER_PIXEL_IS_POINT)
    }

    /// EPSG code of the projected CS, from the tag field or the key directory.
    pub fn epsg(&self) -> Option<u16> {
        self.projected_cs_type
            .or_else(|| self.geo_key(PROJECTED_CS_TYPE_GEO_KEY))
    }

    /// Raster → model transform in corner-based pixel coordinates.
    ///
    /// Uses ModelTransformationTag when present, otherwise the first tiepoint
    /// with the pixel scale. PixelIsPoint rasters are shifted half a pixel so
    /// that the result is always corner-based.
    pub fn geotransform(&self) -> Option<Affine> {
        let mut affine = if let Some(m) = self.model_transformation.as_deref() {
            if m.len() < 16 {
                return None;
            }
            Affine::new(m[0], m[1], m[3], m[4], m[5], m[7])
        } else {
            let scale = self.model_pixel_scale.as_deref()?;
            let tie = self.model_tiepoint.as_deref()?;
            if scale.len() < 2 || tie.len() < 6 {
                return None;
            }
            let (sx, sy) = (scale[0], scale[1]);
            let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
            Affine::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy)
        };

        if self.is_pixel_is_point() {
            let (c, f) = affine.apply(-0.5, -0.5);
            affine.c = c;
            affine.f = f;
        }
        Some(affine)
    }

    /// Geographic extent: the explicit bbox, else derived from the geotransform.
    pub fn extent(&self) -> Option<Sector> {
        if let Some(bbox) = self.bbox {
            return Some(bbox);
        }
        let affine = self.geotransform()?;
        let (w, h) = (self.image_width?, self.image_length?);
        Some(affine.extent(w as usize, h as usize))
    }

    /// GDAL_NODATA parsed as a number.
    pub fn no_data_value(&self) -> Option<f64> {
        self.no_data
            .as_deref()?
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .parse()
            .ok()
    }
}
