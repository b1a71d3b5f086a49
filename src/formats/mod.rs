//! Raster file metadata.

pub mod geotiff;

pub use geotiff::GeoTiffMetadata;
