//! End-to-end screenshot → FEN pipeline.

use std::sync::Arc;

use boardshot_classify::{Classification, Ensemble};
use boardshot_core::{Axis, GrayImage, Region};
use boardshot_fen::{AnalysisLinks, FenRecord, GameState, Position};
use boardshot_grid::{
    extract_squares, AxisSummary, GridDetector, GridError, GridLines, GridParams, LocatedRegion,
    RegionLocator, RegionLocatorParams, SquareParams,
};
use image::{imageops, DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{self, PipelineStage};
use crate::overlay::render_overlay;
use crate::report::{assemble, summarize, ConfidenceSummary, ConfidenceThresholds, DetectionReport, SquareAlert};
use crate::PipelineError;

#[cfg(feature = "tracing")]
use tracing::instrument;

fn default_max_input_bytes() -> usize {
    10 * 1024 * 1024
}

/// Every policy knob of a pipeline run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub locator: RegionLocatorParams,
    pub grid: GridParams,
    pub squares: SquareParams,
    pub thresholds: ConfidenceThresholds,
    /// Analyse the whole image when no board contour is found.
    pub fallback_to_full_image: bool,
    /// Upper bound on encoded input size for [`Pipeline::run_bytes`].
    pub max_input_bytes: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            locator: RegionLocatorParams::default(),
            grid: GridParams::default(),
            squares: SquareParams::default(),
            thresholds: ConfidenceThresholds::default(),
            fallback_to_full_image: true,
            max_input_bytes: default_max_input_bytes(),
        }
    }
}

/// Result of a successful run.
///
/// Everything derived from the [`GameState`] (FEN, links, square names) is
/// rebuilt by [`PipelineOutput::refen`]; nothing is patched in place.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub state: GameState,
    pub position: Position,
    pub fen: FenRecord,
    pub links: AnalysisLinks,
    /// Row-major, as oriented in the image.
    pub classifications: Vec<Classification>,
    pub report: DetectionReport,
    /// Region handed to the grid detector.
    pub region: Region,
    /// Locator result, `None` when the full-image fallback was used.
    pub located: Option<LocatedRegion>,
    /// Grid lines in full-image coordinates.
    pub grid: GridLines,
    pub axes: [AxisSummary; 2],
}

impl PipelineOutput {
    /// Re-encode with different overrides. Classifications are untouched.
    pub fn refen(&self, state: &GameState) -> Self {
        let fen = FenRecord::new(&self.position, state);
        let links = AnalysisLinks::from_fen(&fen.standard());
        let summary = summarize(
            &self.classifications,
            self.report.summary.thresholds,
            state.perspective,
        );
        Self {
            state: *state,
            fen,
            links,
            report: DetectionReport {
                summary,
                annotated: self.report.annotated.clone(),
            },
            ..self.clone()
        }
    }

    /// Bounding box of the detected grid.
    pub fn bbox(&self) -> Region {
        grid_bbox(&self.grid)
    }

    pub fn summary(&self) -> &ConfidenceSummary {
        &self.report.summary
    }

    pub fn response(&self) -> PredictionResponse {
        let summary = self.summary();
        PredictionResponse {
            fen: self.fen.simplified(),
            fen_standard: self.fen.standard(),
            confidence: summary.mean,
            min_confidence: summary.min,
            high_confidence: summary.high_confidence(),
            bbox: self.bbox(),
            low_confidence_squares: summary.alerts.clone(),
            links: self.links.clone(),
        }
    }
}

/// Serialisable primary output. The annotated raster travels separately.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Board field with `-` between ranks.
    pub fen: String,
    pub fen_standard: String,
    pub confidence: f64,
    pub min_confidence: f64,
    pub high_confidence: bool,
    pub bbox: Region,
    pub low_confidence_squares: Vec<SquareAlert>,
    pub links: AnalysisLinks,
}

/// Stages recorded by [`Pipeline::run_with_diagnostics`], plus the outcome.
#[derive(Debug)]
pub struct DiagnosticRun {
    pub stages: Vec<PipelineStage>,
    pub result: Result<PipelineOutput, PipelineError>,
}

fn grid_bbox(grid: &GridLines) -> Region {
    let x0 = grid.vertical.first().round().max(0.0);
    let y0 = grid.horizontal.first().round().max(0.0);
    Region::new(
        x0 as usize,
        y0 as usize,
        (grid.vertical.last().round() - x0).max(0.0) as usize,
        (grid.horizontal.last().round() - y0).max(0.0) as usize,
    )
}

/// Render a stage only when diagnostics were requested.
fn record(stages: &mut Option<&mut Vec<PipelineStage>>, stage: impl FnOnce() -> PipelineStage) {
    if let Some(stages) = stages.as_deref_mut() {
        stages.push(stage());
    }
}

fn to_luma(rgb: &RgbImage) -> GrayImage {
    let luma = imageops::grayscale(rgb);
    GrayImage {
        width: luma.width() as usize,
        height: luma.height() as usize,
        data: luma.into_raw(),
    }
}

/// Request-scoped pipeline over a shared, immutable ensemble.
///
/// A `Pipeline` holds no per-request state; one instance can serve any
/// number of concurrent runs.
#[derive(Clone, Debug)]
pub struct Pipeline {
    params: PipelineParams,
    locator: RegionLocator,
    detector: GridDetector,
    ensemble: Arc<Ensemble>,
}

impl Pipeline {
    pub fn new(params: PipelineParams, ensemble: Arc<Ensemble>) -> Self {
        Self {
            locator: RegionLocator::new(params.locator.clone()),
            detector: GridDetector::new(params.grid.clone()),
            params,
            ensemble,
        }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    /// Check size and format, then decode an encoded image.
    pub fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
        let max = self.params.max_input_bytes;
        if bytes.len() > max {
            return Err(PipelineError::InputTooLarge {
                size: bytes.len(),
                max,
            });
        }
        let format = match image::guess_format(bytes) {
            Ok(f @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP)) => f,
            _ => return Err(PipelineError::UnsupportedFormat),
        };
        Ok(image::load_from_memory_with_format(bytes, format)?)
    }

    pub fn run_bytes(&self, bytes: &[u8], state: &GameState) -> Result<PipelineOutput, PipelineError> {
        let image = self.decode(bytes)?;
        self.run(&image, state)
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, image, state), fields(width = image.width(), height = image.height()))
    )]
    pub fn run(&self, image: &DynamicImage, state: &GameState) -> Result<PipelineOutput, PipelineError> {
        self.execute(image, state, None)
    }

    /// Run and record every stage reached, successful or not.
    pub fn run_with_diagnostics(&self, image: &DynamicImage, state: &GameState) -> DiagnosticRun {
        let mut stages = Vec::new();
        let result = self.execute(image, state, Some(&mut stages));
        DiagnosticRun { stages, result }
    }

    fn execute(
        &self,
        image: &DynamicImage,
        state: &GameState,
        mut stages: Option<&mut Vec<PipelineStage>>,
    ) -> Result<PipelineOutput, PipelineError> {
        let rgb = image.to_rgb8();
        let gray = to_luma(&rgb);

        let located = match self.locator.locate(&gray.view()) {
            Ok(found) => {
                log::info!(
                    "board region {:?} via {:?} (score {:.3})",
                    found.region,
                    found.strategy,
                    found.score
                );
                Some(found)
            }
            Err(err) if self.params.fallback_to_full_image => {
                log::warn!("{err}; analysing the whole image");
                None
            }
            Err(err) => {
                log::warn!("{err}");
                record(&mut stages, || diagnostics::rough_crop(&rgb, None));
                return Err(PipelineError::NoBoardFound);
            }
        };
        record(&mut stages, || diagnostics::rough_crop(&rgb, located.as_ref()));

        let region = located.map_or(Region::full(gray.width, gray.height), |f| f.region);
        let crop = gray.view().crop(&region);
        let grid_error = |err: GridError| match err {
            GridError::GridNotFound { axis } => PipelineError::GridNotFound { axis, region },
            GridError::ImageTooSmall { min, .. } => PipelineError::RegionTooSmall { region, min },
        };
        let analysis = self.detector.analyze(&crop.view()).map_err(grid_error)?;
        record(&mut stages, || diagnostics::equalized(&analysis));
        record(&mut stages, || {
            diagnostics::gradients(&analysis, self.params.grid.sobel_ksize)
        });
        record(&mut stages, || diagnostics::projections(&analysis));

        let lines = analysis.lines();
        record(&mut stages, || {
            let crop_rgb = imageops::crop_imm(
                &rgb,
                region.x as u32,
                region.y as u32,
                region.width as u32,
                region.height as u32,
            )
            .to_image();
            diagnostics::grid_lines(&crop_rgb, lines.as_ref().ok())
        });
        let local = lines.map_err(grid_error)?;
        let axes = [
            AxisSummary::from((Axis::X, analysis.vertical.as_ref())),
            AxisSummary::from((Axis::Y, analysis.horizontal.as_ref())),
        ];

        let tiles: Vec<RgbImage> = extract_squares(&rgb, &region, &local, &self.params.squares)?
            .into_tiles()
            .into_iter()
            .map(|t| t.image)
            .collect();
        let classifications = self.ensemble.classify(&tiles)?;
        record(&mut stages, || {
            diagnostics::classification(self.ensemble.len(), self.params.squares.tile_size)
        });

        let thresholds = self.params.thresholds;
        let (position, summary) = assemble(&classifications, thresholds, state.perspective)?;
        let grid = local.offset(region.x as f64, region.y as f64);
        let annotated = render_overlay(&rgb, &grid_bbox(&grid), &grid, &classifications, &thresholds);

        let fen = FenRecord::new(&position, state);
        let links = AnalysisLinks::from_fen(&fen.standard());
        log::info!(
            "{} (mean confidence {:.3}, min {:.3}, {} alerts)",
            fen,
            summary.mean,
            summary.min,
            summary.alerts.len()
        );

        Ok(PipelineOutput {
            state: *state,
            position,
            fen,
            links,
            classifications,
            report: DetectionReport { summary, annotated },
            region,
            located,
            grid,
            axes,
        })
    }
}
