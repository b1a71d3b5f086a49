//! The globe: an ellipsoid, the projection that maps it into Cartesian space
//! and an optional terrain source.

use std::fmt;
use std::sync::Arc;

use glam::{DMat4, DVec3};
use rayon::prelude::*;

use crate::elevation::ElevationModel;
use crate::error::{GlobeError, ProjError};
use crate::geo::{check_geographic, GeographicPosition};
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::grid::{sample_height, Grid};
use crate::proj::{GlobeProjection, Wgs84Projection};

#[derive(Clone)]
pub struct Globe {
    ellipsoid: Ellipsoid,
    projection: Arc<dyn GlobeProjection>,
    elevation: Option<Arc<dyn ElevationModel>>,
}

impl Globe {
    /// Globe on the WGS84 ellipsoid using `projection`.
    pub fn new(projection: Arc<dyn GlobeProjection>) -> Self {
        tracing::debug!(projection = projection.name(), "globe created");
        Self {
            ellipsoid: Ellipsoid::default(),
            projection,
            elevation: None,
        }
    }

    /// WGS84 ellipsoid with the geodetic ECEF projection.
    pub fn wgs84() -> Self {
        Self::new(Arc::new(Wgs84Projection::new()))
    }

    pub fn with_ellipsoid(mut self, ellipsoid: Ellipsoid) -> Result<Self, GlobeError> {
        ellipsoid.validate()?;
        tracing::debug!(a = ellipsoid.a, f = ellipsoid.f, "globe ellipsoid set");
        self.ellipsoid = ellipsoid;
        Ok(self)
    }

    /// Terrain used by [`Globe::terrain_point`] and [`Globe::terrain_grid`].
    pub fn with_elevation_model(mut self, elevation: Arc<dyn ElevationModel>) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    pub fn projection(&self) -> &dyn GlobeProjection {
        self.projection.as_ref()
    }

    pub fn elevation_model(&self) -> Option<&dyn ElevationModel> {
        self.elevation.as_deref()
    }

    /// Forward transform of one position. A supplied elevation model replaces
    /// `alt` with the sampled terrain height (0 where it has no data).
    ///
    /// The position is validated before the model is queried.
    pub fn geographic_to_cartesian(
        &self,
        lat: f64,
        lon: f64,
        alt: f64,
        elevation: Option<&dyn ElevationModel>,
    ) -> Result<DVec3, GlobeError> {
        let fallback = if elevation.is_some() { 0.0 } else { alt };
        check_geographic(lat, lon, fallback)?;
        let h = sample_height(elevation, lat, lon, alt);
        Ok(self
            .projection
            .geographic_to_cartesian(&self.ellipsoid, lat, lon, h)?)
    }

    pub fn cartesian_to_geographic(&self, point: DVec3) -> Result<GeographicPosition, GlobeError> {
        Ok(self
            .projection
            .cartesian_to_geographic(&self.ellipsoid, point)?)
    }

    /// East-North-Up frame at a Cartesian point.
    pub fn cartesian_to_local_transform(&self, point: DVec3) -> Result<DMat4, GlobeError> {
        Ok(self
            .projection
            .cartesian_to_local_transform(&self.ellipsoid, point)?)
    }

    pub fn geographic_to_local_transform(
        &self,
        lat: f64,
        lon: f64,
        alt: f64,
    ) -> Result<DMat4, GlobeError> {
        Ok(self
            .projection
            .geographic_to_local_transform(&self.ellipsoid, lat, lon, alt)?)
    }

    /// Forward transform of every grid sample into `out`, row-major.
    pub fn geographic_to_cartesian_grid(
        &self,
        grid: &Grid,
        elevation: Option<&dyn ElevationModel>,
        out: &mut [DVec3],
    ) -> Result<(), GlobeError> {
        self.projection
            .geographic_to_cartesian_grid(&self.ellipsoid, grid, elevation, out)?;
        Ok(())
    }

    /// Grid transform into a flat `[x0, y0, z0, x1, ...]` buffer, as handed
    /// to vertex buffers.
    pub fn geographic_to_cartesian_grid_packed(
        &self,
        grid: &Grid,
        elevation: Option<&dyn ElevationModel>,
        out: &mut [f64],
    ) -> Result<(), GlobeError> {
        grid.validate()?;
        let expected = grid.packed_len()?;
        if out.len() != expected {
            return Err(ProjError::BufferSize {
                expected,
                actual: out.len(),
            }
            .into());
        }
        let points: &mut [DVec3] = bytemuck::try_cast_slice_mut(out)
            .map_err(|e| GlobeError::Shape(format!("cannot view buffer as points: {e}")))?;
        self.geographic_to_cartesian_grid(grid, elevation, points)
    }

    /// Grid transform with rows spread over the rayon pool.
    ///
    /// Each row is handed to the projection as a one-row grid, so results are
    /// identical to [`Globe::geographic_to_cartesian_grid`].
    pub fn geographic_to_cartesian_grid_par(
        &self,
        grid: &Grid,
        elevation: Option<&dyn ElevationModel>,
        out: &mut [DVec3],
    ) -> Result<(), GlobeError> {
        grid.check_output(out.len())?;
        tracing::trace!(rows = grid.rows, columns = grid.columns, "parallel grid transform");
        out.par_chunks_mut(grid.columns)
            .enumerate()
            .try_for_each(|(row, row_out)| {
                let row_grid = Grid {
                    origin_latitude: grid.latitude(row),
                    rows: 1,
                    ..*grid
                };
                self.projection
                    .geographic_to_cartesian_grid(&self.ellipsoid, &row_grid, elevation, row_out)
            })?;
        Ok(())
    }

    /// Terrain height from the globe's own elevation model.
    pub fn elevation_at(&self, lat: f64, lon: f64) -> Option<f64> {
        self.elevation.as_ref()?.elevation_at(lat, lon)
    }

    /// Cartesian point on the terrain surface. Without an elevation model
    /// this is the ellipsoid surface.
    pub fn terrain_point(&self, lat: f64, lon: f64) -> Result<DVec3, GlobeError> {
        self.geographic_to_cartesian(lat, lon, 0.0, self.elevation_model())
    }

    /// Grid of terrain surface points, sampled from the globe's elevation model.
    pub fn terrain_grid(&self, grid: &Grid, out: &mut [DVec3]) -> Result<(), GlobeError> {
        self.geographic_to_cartesian_grid(grid, self.elevation_model(), out)
    }
}

impl Default for Globe {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl fmt::Debug for Globe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Globe")
            .field("ellipsoid", &self.ellipsoid)
            .field("projection", &self.projection.name())
            .field("elevation", &self.elevation.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::Affine;
    use crate::elevation::{ConstantElevation, RasterElevation, SampleMethod};
    use crate::proj::{EquirectangularProjection, GridTransformer};
    use approx::assert_relative_eq;
    use ndarray::array;
    use quickcheck::{quickcheck, Arbitrary, Gen};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn assert_points_close(a: DVec3, b: DVec3, eps: f64) {
        assert_relative_eq!(a.x, b.x, epsilon = eps);
        assert_relative_eq!(a.y, b.y, epsilon = eps);
        assert_relative_eq!(a.z, b.z, epsilon = eps);
    }

    #[test]
    fn test_default_is_wgs84() {
        let globe = Globe::default();
        assert_eq!(globe.projection().name(), "wgs84");
        assert_eq!(globe.ellipsoid().a, 6_378_137.0);
        assert!(globe.elevation_model().is_none());
    }

    #[test]
    fn test_round_trip_through_globe() {
        let globe = Globe::wgs84();
        let p = globe.geographic_to_cartesian(47.5, -122.3, 120.0, None).unwrap();
        let g = globe.cartesian_to_geographic(p).unwrap();
        assert_relative_eq!(g.latitude, 47.5, epsilon = 1e-9);
        assert_relative_eq!(g.longitude, -122.3, epsilon = 1e-9);
        assert_relative_eq!(g.altitude, 120.0, epsilon = 1e-6);
    }

    #[test]
    fn test_elevation_overrides_altitude() {
        let globe = Globe::wgs84();
        let terrain = ConstantElevation(300.0);
        let with = globe.geographic_to_cartesian(0.0, 0.0, 9999.0, Some(&terrain)).unwrap();
        assert_relative_eq!(with.x, 6_378_437.0, epsilon = 1e-6);

        let no_data = |_: f64, _: f64| -> Option<f64> { None };
        let missing = globe.geographic_to_cartesian(0.0, 0.0, 9999.0, Some(&no_data)).unwrap();
        assert_relative_eq!(missing.x, 6_378_137.0, epsilon = 1e-6);
    }

    #[test]
    fn test_errors_are_wrapped() {
        let globe = Globe::wgs84();
        assert!(matches!(
            globe.geographic_to_cartesian(91.0, 0.0, 0.0, None),
            Err(GlobeError::Projection(ProjError::LatitudeOutOfRange(_)))
        ));
        assert!(matches!(
            globe.cartesian_to_local_transform(DVec3::ZERO),
            Err(GlobeError::Projection(ProjError::DegenerateCartesian))
        ));
    }

    #[test]
    fn test_rejects_bad_ellipsoid() {
        let result = Globe::wgs84().with_ellipsoid(Ellipsoid::new(-1.0, 0.0));
        assert!(matches!(
            result,
            Err(GlobeError::Projection(ProjError::InvalidEllipsoid(_)))
        ));
    }

    #[test]
    fn test_local_transforms_agree() {
        let globe = Globe::wgs84();
        let from_geo = globe.geographic_to_local_transform(-33.9, 18.4, 10.0).unwrap();
        let p = globe.geographic_to_cartesian(-33.9, 18.4, 10.0, None).unwrap();
        let from_point = globe.cartesian_to_local_transform(p).unwrap();
        assert!(from_geo.abs_diff_eq(from_point, 1e-9));
    }

    #[test]
    fn test_grid_variants_match() {
        let globe = Globe::wgs84();
        let grid = Grid::new(-60.0, -170.0, 13, 35, 10.0, 10.0).with_altitude(42.0);

        let mut serial = vec![DVec3::ZERO; grid.len()];
        globe.geographic_to_cartesian_grid(&grid, None, &mut serial).unwrap();

        let mut parallel = vec![DVec3::ZERO; grid.len()];
        globe
            .geographic_to_cartesian_grid_par(&grid, None, &mut parallel)
            .unwrap();
        assert_eq!(serial, parallel);

        let mut packed = vec![0.0; grid.len() * 3];
        globe
            .geographic_to_cartesian_grid_packed(&grid, None, &mut packed)
            .unwrap();
        for (i, p) in serial.iter().enumerate() {
            assert_eq!(&packed[i * 3..i * 3 + 3], &p.to_array());
        }

        let (lat, lon) = grid.coordinate(7, 20);
        let single = globe.geographic_to_cartesian(lat, lon, 42.0, None).unwrap();
        assert_eq!(serial[7 * grid.columns + 20], single);
    }

    #[test]
    fn test_parallel_grid_other_projection() {
        let globe = Globe::new(Arc::new(EquirectangularProjection::new(20.0)));
        let grid = Grid::new(0.0, 0.0, 4, 5, 1.0, 2.0);
        let mut serial = vec![DVec3::ZERO; grid.len()];
        let mut parallel = vec![DVec3::ZERO; grid.len()];
        globe.geographic_to_cartesian_grid(&grid, None, &mut serial).unwrap();
        globe
            .geographic_to_cartesian_grid_par(&grid, None, &mut parallel)
            .unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_grid_buffer_mismatch() {
        let globe = Globe::wgs84();
        let grid = Grid::new(0.0, 0.0, 2, 2, 1.0, 1.0);

        let mut short = vec![DVec3::ZERO; 3];
        assert!(matches!(
            globe.geographic_to_cartesian_grid_par(&grid, None, &mut short),
            Err(GlobeError::Projection(ProjError::BufferSize { expected: 4, actual: 3 }))
        ));

        let mut flat = vec![0.0; 11];
        assert!(matches!(
            globe.geographic_to_cartesian_grid_packed(&grid, None, &mut flat),
            Err(GlobeError::Projection(ProjError::BufferSize { expected: 12, actual: 11 }))
        ));
    }

    #[test]
    fn test_terrain_from_raster() {
        // 2x2 DEM of 1° cells covering 0..2°E, 0..2°N
        let dem = RasterElevation::new(
            array![[100.0f32, 100.0], [100.0, 100.0]],
            Affine::north_up(0.0, 2.0, 1.0, 1.0),
            SampleMethod::Nearest,
        )
        .unwrap();
        let globe = Globe::wgs84().with_elevation_model(Arc::new(dem));

        assert_eq!(globe.elevation_at(1.0, 1.0), Some(100.0));
        assert_eq!(globe.elevation_at(10.0, 10.0), None);

        let on_dem = globe.terrain_point(1.0, 1.0).unwrap();
        let expected = globe.geographic_to_cartesian(1.0, 1.0, 100.0, None).unwrap();
        assert_points_close(on_dem, expected, 1e-9);

        // Outside the raster the surface falls back to the ellipsoid.
        let off_dem = globe.terrain_point(10.0, 10.0).unwrap();
        let g = globe.cartesian_to_geographic(off_dem).unwrap();
        assert_relative_eq!(g.altitude, 0.0, epsilon = 1e-6);

        let grid = Grid::new(0.5, 0.5, 2, 2, 1.0, 1.0);
        let mut out = vec![DVec3::ZERO; grid.len()];
        globe.terrain_grid(&grid, &mut out).unwrap();
        for p in out {
            let g = globe.cartesian_to_geographic(p).unwrap();
            assert_relative_eq!(g.altitude, 100.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_non_finite_terrain_fails_every_path() {
        let nan = |_: f64, _: f64| -> Option<f64> { Some(f64::NAN) };
        let inf = |_: f64, _: f64| -> Option<f64> { Some(f64::INFINITY) };
        let grid = Grid::new(10.0, 20.0, 2, 3, 1.0, 1.0);
        let non_finite = |r: Result<(), GlobeError>| {
            matches!(
                r,
                Err(GlobeError::Projection(ProjError::NonFinite("altitude")))
            )
        };

        for globe in [
            Globe::wgs84(),
            Globe::new(Arc::new(EquirectangularProjection::default())),
        ] {
            for model in [&nan as &dyn ElevationModel, &inf] {
                assert!(matches!(
                    globe.geographic_to_cartesian(10.0, 20.0, 0.0, Some(model)),
                    Err(GlobeError::Projection(ProjError::NonFinite("altitude")))
                ));

                let mut out = vec![DVec3::ZERO; grid.len()];
                assert!(non_finite(globe.geographic_to_cartesian_grid(
                    &grid,
                    Some(model),
                    &mut out
                )));
                assert!(non_finite(globe.geographic_to_cartesian_grid_par(
                    &grid,
                    Some(model),
                    &mut out
                )));
                let mut flat = vec![0.0; grid.len() * 3];
                assert!(non_finite(globe.geographic_to_cartesian_grid_packed(
                    &grid,
                    Some(model),
                    &mut flat
                )));
            }
        }

        let mut out = vec![DVec3::ZERO; grid.len()];
        let err = GridTransformer::new()
            .transform(&Ellipsoid::default(), &grid, Some(&nan), &mut out)
            .unwrap_err();
        assert_eq!(err, ProjError::NonFinite("altitude"));
    }

    #[test]
    fn test_terrain_not_sampled_for_invalid_position() {
        let calls = AtomicUsize::new(0);
        let counting = |_: f64, _: f64| -> Option<f64> {
            calls.fetch_add(1, Ordering::Relaxed);
            Some(10.0)
        };
        let globe = Globe::wgs84();

        for (lat, lon) in [(91.0, 0.0), (f64::NAN, 0.0), (0.0, f64::INFINITY)] {
            assert!(globe
                .geographic_to_cartesian(lat, lon, 0.0, Some(&counting))
                .is_err());
        }
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        // The caller altitude is ignored once a terrain model is supplied.
        assert!(globe
            .geographic_to_cartesian(0.0, 0.0, f64::NAN, Some(&counting))
            .is_ok());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let globe = Globe::wgs84();

        let huge = Grid::new(0.0, 0.0, usize::MAX, 2, 0.0, 0.0);
        assert!(matches!(huge.validate(), Err(ProjError::InvalidGrid(_))));
        let mut out = vec![DVec3::ZERO; 4];
        assert!(matches!(
            globe.geographic_to_cartesian_grid(&huge, None, &mut out),
            Err(GlobeError::Projection(ProjError::InvalidGrid(_)))
        ));

        // Fits as points but not as packed coordinates.
        let tall = Grid::new(0.0, 0.0, usize::MAX / 2, 1, 0.0, 0.0);
        assert!(tall.validate().is_ok());
        let mut flat = vec![0.0; 3];
        assert!(matches!(
            globe.geographic_to_cartesian_grid_packed(&tall, None, &mut flat),
            Err(GlobeError::Projection(ProjError::InvalidGrid(_)))
        ));
    }

    /// Random grid that stays inside the latitude range.
    #[derive(Clone, Debug)]
    struct GridSample(Grid);

    impl Arbitrary for GridSample {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut unit = || f64::from(u32::arbitrary(g)) / f64::from(u32::MAX);
            let origin_lat = unit() * 180.0 - 90.0;
            let last_lat = unit() * 180.0 - 90.0;
            let origin_lon = unit() * 360.0 - 180.0;
            let lon_delta = unit() * 20.0 - 10.0;
            let altitude = unit() * 11_000.0 - 1_000.0;
            let rows = usize::arbitrary(g) % 12 + 1;
            let columns = usize::arbitrary(g) % 12 + 1;
            let lat_delta = if rows > 1 {
                (last_lat - origin_lat) / (rows - 1) as f64
            } else {
                0.0
            };
            let grid = Grid::new(origin_lat, origin_lon, rows, columns, lat_delta, lon_delta)
                .with_altitude(altitude);
            Self(grid)
        }
    }

    fn grid_matches_single_points(GridSample(grid): GridSample) -> bool {
        let globe = Globe::wgs84();
        let mut serial = vec![DVec3::ZERO; grid.len()];
        let mut cached = vec![DVec3::ZERO; grid.len()];
        let mut parallel = vec![DVec3::ZERO; grid.len()];
        let ok = globe.geographic_to_cartesian_grid(&grid, None, &mut serial).is_ok()
            && GridTransformer::new()
                .transform(globe.ellipsoid(), &grid, None, &mut cached)
                .is_ok()
            && globe
                .geographic_to_cartesian_grid_par(&grid, None, &mut parallel)
                .is_ok();
        if !ok {
            return false;
        }
        (0..grid.rows).all(|row| {
            (0..grid.columns).all(|col| {
                let (lat, lon) = grid.coordinate(row, col);
                let i = row * grid.columns + col;
                match globe.geographic_to_cartesian(lat, lon, grid.altitude, None) {
                    Ok(single) => {
                        serial[i] == single && cached[i] == single && parallel[i] == single
                    }
                    Err(_) => false,
                }
            })
        })
    }

    quickcheck! {
        fn prop_grid_equals_single_point(s: GridSample) -> bool {
            grid_matches_single_points(s)
        }
    }
}
