//! Named pipeline stages with rendered intermediates.

use boardshot_core::Region;
use boardshot_grid::{AxisDetection, GridAnalysis, GridLines, LocatedRegion};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::draw::{fit_width, gray_to_rgb, heatmap, hline, outline, segment, vline, GREEN};

/// Rendered stage images are at most this wide.
const VIEW_WIDTH: u32 = 600;

const PLOT_BG: Rgb<u8> = Rgb([26, 26, 26]);
const PLOT_FRAME: Rgb<u8> = Rgb([51, 51, 51]);
const PLOT_SIGNAL: Rgb<u8> = Rgb([212, 160, 23]);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    RoughCrop,
    Equalized,
    Gradients,
    Projections,
    GridLines,
    Classification,
}

impl StageKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKey::RoughCrop => "rough_crop",
            StageKey::Equalized => "equalized",
            StageKey::Gradients => "gradients",
            StageKey::Projections => "projections",
            StageKey::GridLines => "grid_lines",
            StageKey::Classification => "classification",
        }
    }
}

/// One step of a diagnostic run.
#[derive(Clone, Debug)]
pub struct PipelineStage {
    pub key: StageKey,
    pub title: &'static str,
    pub description: String,
    pub image: Option<RgbImage>,
}

impl PipelineStage {
    fn new(key: StageKey, title: &'static str, description: impl Into<String>) -> Self {
        Self {
            key,
            title,
            description: description.into(),
            image: None,
        }
    }

    fn with_image(mut self, image: RgbImage) -> Self {
        self.image = Some(fit_width(image, VIEW_WIDTH));
        self
    }
}

pub(crate) fn rough_crop(source: &RgbImage, located: Option<&LocatedRegion>) -> PipelineStage {
    let mut vis = source.clone();
    let description = match located {
        Some(found) => {
            let thickness = (source.width().min(source.height()) / 200).max(2);
            outline(&mut vis, &found.region, thickness, GREEN);
            format!(
                "Edge detection and contour analysis located the board region at {}x{}+{}+{} ({:?} strategy), \
                 filtering out browser chrome, sidebars and evaluation bars.",
                found.region.width, found.region.height, found.region.x, found.region.y, found.strategy
            )
        }
        None => "No board-like contour was found; the whole image is analysed instead.".to_owned(),
    };
    PipelineStage::new(StageKey::RoughCrop, "Finding the Board", description).with_image(vis)
}

pub(crate) fn equalized(analysis: &GridAnalysis) -> PipelineStage {
    PipelineStage::new(
        StageKey::Equalized,
        "Enhancing Contrast",
        "Histogram equalization normalizes lighting so grid lines stand out regardless of board theme.",
    )
    .with_image(gray_to_rgb(&analysis.equalized))
}

pub(crate) fn gradients(analysis: &GridAnalysis, ksize: usize) -> PipelineStage {
    PipelineStage::new(
        StageKey::Gradients,
        "Computing Edge Gradients",
        format!("A large Sobel kernel ({ksize}x{ksize}) detects edges while smoothing out piece-level detail."),
    )
    .with_image(heatmap(&analysis.gradient))
}

pub(crate) fn projections(analysis: &GridAnalysis) -> PipelineStage {
    const W: u32 = 800;
    const PANEL: u32 = 200;
    let mut plot = RgbImage::from_pixel(W, 2 * PANEL, PLOT_BG);
    plot_signal(&mut plot, 0, PANEL, &analysis.signal_x, analysis.vertical.as_ref());
    plot_signal(&mut plot, PANEL, PANEL, &analysis.signal_y, analysis.horizontal.as_ref());
    PipelineStage::new(
        StageKey::Projections,
        "Projecting Gradients",
        "Positive and negative gradients are multiplied along each axis. Only real grid lines, \
         which have both dark-to-light and light-to-dark transitions, produce strong peaks.",
    )
    .with_image(plot)
}

/// Signal polyline with the accepted lines dashed on top.
fn plot_signal(plot: &mut RgbImage, top: u32, height: u32, signal: &[f64], det: Option<&AxisDetection>) {
    let width = plot.width();
    let pad = 10.0;
    let region = Region::new(0, top as usize, width as usize, height as usize);
    outline(plot, &region, 1, PLOT_FRAME);
    if signal.len() < 2 {
        return;
    }
    let max = signal.iter().copied().fold(0.0f64, f64::max);
    let scale_y = if max > 0.0 { (height as f64 - 2.0 * pad) / max } else { 0.0 };
    let scale_x = (width as f64 - 2.0 * pad) / signal.len() as f64;
    let base = (top + height) as f64 - pad;
    let point = |i: usize, v: f64| {
        (
            (pad + i as f64 * scale_x).round() as i64,
            (base - v * scale_y).round() as i64,
        )
    };
    for (i, w) in signal.windows(2).enumerate() {
        segment(plot, point(i, w[0]), point(i + 1, w[1]), PLOT_SIGNAL);
    }
    let Some(det) = det else { return };
    for &line in &det.lines.0 {
        let x = pad + line * scale_x;
        let mut y = top as f64 + pad;
        while y < base {
            vline(plot, x, y, (y + 4.0).min(base), 1, GREEN);
            y += 8.0;
        }
    }
}

pub(crate) fn grid_lines(crop: &RgbImage, lines: Option<&GridLines>) -> PipelineStage {
    let title = "Detecting Grid Lines";
    let Some(lines) = lines else {
        return PipelineStage::new(
            StageKey::GridLines,
            title,
            "Grid line detection was unsuccessful: no threshold level produced 7 equally spaced \
             interior lines on both axes.",
        );
    };
    let mut vis = crop.clone();
    let thickness = (crop.width().min(crop.height()) / 300).max(1);
    let (w, h) = (crop.width() as f64, crop.height() as f64);
    for &x in &lines.vertical.0 {
        vline(&mut vis, x.clamp(0.0, w - 1.0), 0.0, h - 1.0, thickness, GREEN);
    }
    for &y in &lines.horizontal.0 {
        hline(&mut vis, y.clamp(0.0, h - 1.0), 0.0, w - 1.0, thickness, GREEN);
    }
    PipelineStage::new(
        StageKey::GridLines,
        title,
        "An adaptive threshold finds 7 equally spaced interior lines per axis. Adding the outer \
         boundaries gives the full 9x9 grid.",
    )
    .with_image(vis)
}

pub(crate) fn classification(members: usize, tile_size: u32) -> PipelineStage {
    PipelineStage::new(
        StageKey::Classification,
        "Classifying Squares",
        format!(
            "The board is divided into 64 squares ({tile_size}x{tile_size} pixels each). An ensemble of \
             {members} models classifies each square as one of 13 classes: 6 white pieces, 6 black \
             pieces, or empty."
        ),
    )
}
