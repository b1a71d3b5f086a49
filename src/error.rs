use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlobeError {
    #[error("Projection error: {0}")]
    Projection(#[from] ProjError),

    #[error("Invalid affine transform: {0}")]
    Affine(String),

    #[error("Elevation error: {0}")]
    Elevation(String),

    #[error("Invalid shape: {0}")]
    Shape(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjError {
    #[error("Latitude out of range [-90, 90]: {0}")]
    LatitudeOutOfRange(f64),

    #[error("Non-finite {0}")]
    NonFinite(&'static str),

    #[error("Cartesian point (0, 0, 0) has no geographic position")]
    DegenerateCartesian,

    #[error("Output buffer holds {actual} elements, grid needs {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid ellipsoid: {0}")]
    InvalidEllipsoid(String),
}
