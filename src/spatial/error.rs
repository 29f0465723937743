use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("Grid contains no cells")]
    EmptyGrid,

    #[error("Coordinate array has {found} values, expected {expected} for a {nrows}x{ncols} grid")]
    ShapeMismatch {
        nrows: usize,
        ncols: usize,
        expected: usize,
        found: usize,
    },

    #[error("Search radius must be positive and finite, got {0} km")]
    InvalidRadius(f64),
}
