//! Core types and utilities for the boardshot pipeline.
//!
//! This crate is intentionally small. It does *not* depend on any concrete
//! image-decoding crate: detectors work on the lightweight [`GrayImageView`]
//! and [`FloatImage`] buffers defined here, and the facade crate adapts
//! decoded `image` buffers into them.

mod filters;
mod image;
mod logger;
mod piece;
mod region;
mod threshold;

pub use filters::{
    convolve_same, equalize_histogram, gaussian_blur, gaussian_kernel, sobel,
    sobel_derivative_kernel, sobel_smoothing_kernel, Axis,
};
pub use image::{FloatImage, GrayImage, GrayImageView};
pub use piece::{
    ParseSquareClassError, Piece, PieceColor, PieceKind, SquareClass, NUM_CLASSES,
};
pub use region::Region;
pub use threshold::{histogram, otsu_threshold};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};
