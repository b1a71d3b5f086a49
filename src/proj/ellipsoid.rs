use crate::error::ProjError;

/// Reference ellipsoid parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (metres)
    pub a: f64,
    /// Flattening (dimensionless)
    pub f: f64,
    /// Semi-minor axis: a * (1 - f)
    pub b: f64,
    /// First eccentricity squared: 2f - f^2
    pub e2: f64,
    /// Second eccentricity squared: e^2 / (1 - e^2)
    pub ep2: f64,
}

impl Ellipsoid {
    pub const fn new(a: f64, f: f64) -> Self {
        let b = a * (1.0 - f);
        let e2 = 2.0 * f - f * f;
        let ep2 = e2 / (1.0 - e2);
        Self { a, f, b, e2, ep2 }
    }

    /// Check `a > 0` and `0 <= e² < 1`.
    pub fn validate(&self) -> Result<(), ProjError> {
        if !(self.a.is_finite() && self.a > 0.0) {
            return Err(ProjError::InvalidEllipsoid(format!(
                "semi-major axis must be positive, got {}",
                self.a
            )));
        }
        if !(0.0..1.0).contains(&self.e2) {
            return Err(ProjError::InvalidEllipsoid(format!(
                "eccentricity squared must lie in [0, 1), got {}",
                self.e2
            )));
        }
        Ok(())
    }

    pub fn semi_major_axis(&self) -> f64 {
        self.a
    }

    pub fn semi_minor_axis(&self) -> f64 {
        self.b
    }

    pub fn eccentricity_squared(&self) -> f64 {
        self.e2
    }

    /// Get the first eccentricity (computed at runtime).
    pub fn eccentricity(&self) -> f64 {
        self.e2.sqrt()
    }

    /// Prime-vertical radius of curvature N(φ) = a / sqrt(1 - e²·sin²φ).
    ///
    /// `lat` is in radians.
    #[inline]
    pub fn radius_of_curvature_in_prime_vertical(&self, lat: f64) -> f64 {
        self.prime_vertical_from_sin(lat.sin())
    }

    /// Same as [`Self::radius_of_curvature_in_prime_vertical`] for callers that
    /// already hold sin φ.
    #[inline]
    pub(crate) fn prime_vertical_from_sin(&self, sin_lat: f64) -> f64 {
        self.a / (1.0 - self.e2 * sin_lat * sin_lat).sqrt()
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        WGS84
    }
}

pub const WGS84: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_223_563);
