use boardshot_classify::ClassifyError;
use boardshot_core::{Axis, Region};
use boardshot_fen::FenError;
use boardshot_grid::SquareError;
use image::error::LimitErrorKind;
use image::ImageError;
use serde::{Deserialize, Serialize};

/// Whether a failure is the image's fault or ours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The input cannot be read as a chess board; retrying the same image
    /// gives the same answer.
    InputQuality,
    /// Broken models or an internal fault; the caller may retry.
    Internal,
}

/// Errors surfaced by [`crate::Pipeline`].
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("input is {size} bytes, limit is {max}")]
    InputTooLarge { size: usize, max: usize },
    #[error("unsupported image format (expected PNG, JPEG or WebP)")]
    UnsupportedFormat,
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("no board found in the image")]
    NoBoardFound,
    #[error("no grid found along the {axis} axis in region {region:?}")]
    GridNotFound { axis: Axis, region: Region },
    #[error("board region {region:?} is too small (min side {min}px)")]
    RegionTooSmall { region: Region, min: usize },
    #[error(transparent)]
    Squares(#[from] SquareError),
    #[error(transparent)]
    Classification(#[from] ClassifyError),
    #[error(transparent)]
    Fen(#[from] FenError),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Decode(err) => decode_kind(err),
            PipelineError::InputTooLarge { .. }
            | PipelineError::UnsupportedFormat
            | PipelineError::NoBoardFound
            | PipelineError::GridNotFound { .. }
            | PipelineError::RegionTooSmall { .. } => ErrorKind::InputQuality,
            PipelineError::Squares(_) | PipelineError::Classification(_) | PipelineError::Fen(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }

    /// Region that was analysed, for grid failures.
    pub fn region(&self) -> Option<Region> {
        match self {
            PipelineError::GridNotFound { region, .. } | PipelineError::RegionTooSmall { region, .. } => {
                Some(*region)
            }
            _ => None,
        }
    }
}

/// Running out of memory or a failing reader is transient; anything else
/// the decoder reports is a property of the bytes.
fn decode_kind(err: &ImageError) -> ErrorKind {
    match err {
        ImageError::IoError(_) => ErrorKind::Internal,
        ImageError::Limits(limit) => match limit.kind() {
            LimitErrorKind::InsufficientMemory => ErrorKind::Internal,
            _ => ErrorKind::InputQuality,
        },
        _ => ErrorKind::InputQuality,
    }
}
