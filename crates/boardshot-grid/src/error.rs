use boardshot_core::Axis;

/// Errors returned by the region locator.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocateError {
    #[error("no board-like contour found after {strategies} strategies")]
    NoBoardFound { strategies: usize },
}

/// Errors returned by the grid detector.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("no equally spaced grid lines found along the {axis} axis")]
    GridNotFound { axis: Axis },
    #[error("region {width}x{height} is too small for grid detection (min side {min})")]
    ImageTooSmall {
        width: usize,
        height: usize,
        min: usize,
    },
}

/// Precondition failures of the square extractor.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    #[error("grid lines are not strictly increasing")]
    MalformedGrid,
    #[error("cell ({row}, {col}) has no pixels inside the region")]
    DegenerateCell { row: usize, col: usize },
}
