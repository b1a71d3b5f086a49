pub mod affine;
pub mod elevation;
pub mod error;
pub mod formats;
pub mod geo;
pub mod globe;
pub mod proj;
#[cfg(feature = "python")]
mod py;

pub use elevation::{ConstantElevation, ElevationModel, RasterElevation, SampleMethod};
pub use error::{GlobeError, ProjError};
pub use geo::{GeographicPosition, Sector};
pub use globe::Globe;
pub use proj::ellipsoid::{Ellipsoid, WGS84};
pub use proj::grid::Grid;
pub use proj::{EquirectangularProjection, GlobeProjection, GridTransformer, Wgs84Projection};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// A Python module implemented in Rust.
#[cfg(feature = "python")]
#[pymodule]
fn wgs84_globe(m: &Bound<'_, PyModule>) -> PyResult<()> {
    py::register(m)?;
    Ok(())
}
