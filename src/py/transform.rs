//! PyO3 bindings for the WGS84 globe transforms.

use glam::DVec3;
use ndarray::{Array2, Array3};
use numpy::{PyArray2, PyArray3, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use super::to_py_err;
use crate::globe::Globe;
use crate::proj::grid::Grid;

fn points_to_array(points: &[DVec3]) -> Array2<f64> {
    let flat: &[f64] = bytemuck::cast_slice(points);
    Array2::from_shape_fn((points.len(), 3), |(i, k)| flat[i * 3 + k])
}

/// Convert geographic positions to ECEF.
///
/// Args:
///     lat: 1D array of latitudes in degrees.
///     lon: 1D array of longitudes in degrees.
///     alt: 1D array of heights above the ellipsoid in metres.
///
/// Returns:
///     (N, 3) array of ECEF x, y, z in metres.
#[pyfunction]
pub fn geographic_to_cartesian<'py>(
    py: Python<'py>,
    lat: PyReadonlyArray1<'py, f64>,
    lon: PyReadonlyArray1<'py, f64>,
    alt: PyReadonlyArray1<'py, f64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let (lat, lon, alt) = (lat.as_array(), lon.as_array(), alt.as_array());
    let n = lat.len();
    if lon.len() != n || alt.len() != n {
        return Err(PyValueError::new_err(format!(
            "lat, lon and alt must have same length, got {}, {} and {}",
            n,
            lon.len(),
            alt.len()
        )));
    }
    let positions: Vec<(f64, f64, f64)> = (0..n).map(|i| (lat[i], lon[i], alt[i])).collect();

    let result = py.allow_threads(move || -> PyResult<Array2<f64>> {
        let globe = Globe::wgs84();
        let points = positions
            .into_iter()
            .map(|(lat, lon, alt)| globe.geographic_to_cartesian(lat, lon, alt, None))
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_py_err)?;
        Ok(points_to_array(&points))
    })?;

    Ok(PyArray2::from_owned_array(py, result))
}

/// Convert ECEF points to geographic positions.
///
/// Args:
///     points: (N, 3) array of ECEF x, y, z in metres.
///
/// Returns:
///     (N, 3) array of latitude°, longitude°, altitude m.
#[pyfunction]
pub fn cartesian_to_geographic<'py>(
    py: Python<'py>,
    points: PyReadonlyArray2<'py, f64>,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let view = points.as_array();
    if view.ncols() != 3 {
        return Err(PyValueError::new_err(format!(
            "points must have shape (N, 3), got {:?}",
            view.shape()
        )));
    }
    let points: Vec<DVec3> = view
        .rows()
        .into_iter()
        .map(|r| DVec3::new(r[0], r[1], r[2]))
        .collect();

    let result = py.allow_threads(move || -> PyResult<Array2<f64>> {
        let globe = Globe::wgs84();
        let mut out = Array2::zeros((points.len(), 3));
        for (i, p) in points.into_iter().enumerate() {
            let g = globe.cartesian_to_geographic(p).map_err(to_py_err)?;
            out[(i, 0)] = g.latitude;
            out[(i, 1)] = g.longitude;
            out[(i, 2)] = g.altitude;
        }
        Ok(out)
    })?;

    Ok(PyArray2::from_owned_array(py, result))
}

/// East-North-Up frame at an ECEF point as a 4x4 matrix.
///
/// Columns 0..3 are the East, North and Up unit vectors and column 3 holds
/// the point, so `m @ [e, n, u, 1]` maps local offsets to ECEF.
#[pyfunction]
pub fn local_transform<'py>(
    py: Python<'py>,
    x: f64,
    y: f64,
    z: f64,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let m = Globe::wgs84()
        .cartesian_to_local_transform(DVec3::new(x, y, z))
        .map_err(to_py_err)?;
    let cols = m.to_cols_array_2d();
    let result = Array2::from_shape_fn((4, 4), |(row, col)| cols[col][row]);
    Ok(PyArray2::from_owned_array(py, result))
}

/// ECEF points of a regular latitude/longitude grid.
///
/// Returns:
///     (rows, columns, 3) array; row r lies at origin_lat + r * lat_step.
#[pyfunction]
#[pyo3(signature = (origin_lat, origin_lon, rows, columns, lat_step, lon_step, altitude=0.0))]
#[allow(clippy::too_many_arguments)]
pub fn cartesian_grid<'py>(
    py: Python<'py>,
    origin_lat: f64,
    origin_lon: f64,
    rows: usize,
    columns: usize,
    lat_step: f64,
    lon_step: f64,
    altitude: f64,
) -> PyResult<Bound<'py, PyArray3<f64>>> {
    let grid = Grid::new(origin_lat, origin_lon, rows, columns, lat_step, lon_step)
        .with_altitude(altitude);

    let result = py.allow_threads(move || -> PyResult<Array3<f64>> {
        let globe = Globe::wgs84();
        grid.validate().map_err(|e| to_py_err(e.into()))?;
        let len = grid.packed_len().map_err(|e| to_py_err(e.into()))?;
        let mut flat = vec![0.0; len];
        globe
            .geographic_to_cartesian_grid_packed(&grid, None, &mut flat)
            .map_err(to_py_err)?;
        Array3::from_shape_vec((rows, columns, 3), flat)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    })?;

    Ok(PyArray3::from_owned_array(py, result))
}
