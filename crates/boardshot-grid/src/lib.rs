//! Board geometry for screenshots: where the board is, where its grid lines
//! are, and the 64 tiles they delimit.
//!
//! The three stages are independent and composable:
//!
//! - [`RegionLocator`] finds a board-like rectangle with edge/contour
//!   analysis.
//! - [`GridDetector`] finds the 9 + 9 boundary lines inside a region with
//!   gradient projection and peak analysis.
//! - [`extract_squares`] cuts the grid into fixed-size colour tiles.
//!
//! ```no_run
//! use boardshot_core::GrayImage;
//! use boardshot_grid::{GridDetector, RegionLocator};
//!
//! # fn demo(gray: &GrayImage) -> Result<(), Box<dyn std::error::Error>> {
//! let located = RegionLocator::default().locate(&gray.view())?;
//! let crop = gray.view().crop(&located.region);
//! let lines = GridDetector::default().detect(&crop.view())?;
//! println!("square size {:.1}px", lines.vertical.step());
//! # Ok(())
//! # }
//! ```

mod detector;
mod error;
mod lines;
mod locator;
mod params;
mod peaks;
mod squares;

pub use detector::{projection_signal, AxisSummary, GridAnalysis, GridDetector};
pub use error::{GridError, LocateError, SquareError};
pub use lines::{AxisDetection, AxisLines, GridLines};
pub use locator::{LocatedRegion, LocatorStrategy, RegionLocator};
pub use params::{GridParams, RegionLocatorParams, SquareParams};
pub use squares::{extract_squares, Squares, Tile};
