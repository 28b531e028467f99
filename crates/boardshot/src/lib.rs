//! High-level facade for the `boardshot-*` workspace: chess screenshot in,
//! FEN out.
//!
//! This crate provides:
//! - re-exports of the stage crates (`core`, `grid`, `classify`, `fen`)
//! - [`Pipeline`], which runs region location, grid detection, square
//!   extraction, ensemble classification and FEN encoding on a decoded image
//! - an annotated overlay, a confidence report and named diagnostic stages
//! - JSON config/report helpers used by the `boardshot` binary
//!
//! ## Quickstart
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use boardshot::classify::EnsembleWeights;
//! use boardshot::fen::GameState;
//! use boardshot::{Pipeline, PipelineParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ensemble = EnsembleWeights::load_json("models.json")?.build()?;
//! let pipeline = Pipeline::new(PipelineParams::default(), Arc::new(ensemble));
//!
//! let bytes = std::fs::read("screenshot.png")?;
//! let out = pipeline.run_bytes(&bytes, &GameState::default())?;
//! println!("{} ({:.1}%)", out.fen, 100.0 * out.summary().mean);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `boardshot::core`: raster buffers, filters, piece classes.
//! - `boardshot::grid`: board locator, grid detector, square extractor.
//! - `boardshot::classify`: tile classifiers and the averaging ensemble.
//! - `boardshot::fen`: positions, FEN records, game-state overrides, links.

pub use boardshot_classify as classify;
pub use boardshot_core as core;
pub use boardshot_fen as fen;
pub use boardshot_grid as grid;

mod diagnostics;
mod draw;
mod error;
pub mod io;
mod overlay;
mod pipeline;
mod report;

pub use diagnostics::{PipelineStage, StageKey};
pub use error::{ErrorKind, PipelineError};
pub use overlay::render_overlay;
pub use pipeline::{DiagnosticRun, Pipeline, PipelineOutput, PipelineParams, PredictionResponse};
pub use report::{
    assemble, summarize, ConfidenceBand, ConfidenceSummary, ConfidenceThresholds, DetectionReport,
    SquareAlert,
};

pub use boardshot_fen::{FenRecord, GameState, Position};
