use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::GlobeError;

mod transform;

/// Register all Python-visible functions.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(transform::geographic_to_cartesian, m)?)?;
    m.add_function(wrap_pyfunction!(transform::cartesian_to_geographic, m)?)?;
    m.add_function(wrap_pyfunction!(transform::local_transform, m)?)?;
    m.add_function(wrap_pyfunction!(transform::cartesian_grid, m)?)?;
    Ok(())
}

fn to_py_err(e: GlobeError) -> PyErr {
    PyValueError::new_err(e.to_string())
}
