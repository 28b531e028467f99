//! Annotated overlay for visual audit.

use boardshot_classify::Classification;
use boardshot_core::Region;
use boardshot_grid::GridLines;
use image::{Rgb, RgbImage};

use crate::draw::{hline, outline, vline, AMBER, GREEN, RED};
use crate::report::{ConfidenceBand, ConfidenceThresholds};

const GRID: Rgb<u8> = Rgb([120, 220, 150]);

/// Draw the board box, the 9 + 9 grid lines and an outline on every square
/// below the advisory threshold (amber, or red below the alert threshold).
///
/// `grid` is in full-image coordinates. The source image is not modified.
pub fn render_overlay(
    image: &RgbImage,
    board: &Region,
    grid: &GridLines,
    classifications: &[Classification],
    thresholds: &ConfidenceThresholds,
) -> RgbImage {
    let mut out = image.clone();
    let thickness = (image.width().min(image.height()) / 300).max(1);

    let (top, bottom) = (grid.horizontal.first(), grid.horizontal.last());
    let (left, right) = (grid.vertical.first(), grid.vertical.last());
    for &x in &grid.vertical.0 {
        vline(&mut out, x, top, bottom, thickness, GRID);
    }
    for &y in &grid.horizontal.0 {
        hline(&mut out, y, left, right, thickness, GRID);
    }

    for (i, c) in classifications.iter().enumerate().take(64) {
        let color = match thresholds.band(c.confidence) {
            ConfidenceBand::High => continue,
            ConfidenceBand::Medium => AMBER,
            ConfidenceBand::Low => RED,
        };
        let (x0, y0, x1, y1) = grid.cell(i / 8, i % 8);
        let inset = 2.0;
        let cell = Region::new(
            (x0 + inset).max(0.0) as usize,
            (y0 + inset).max(0.0) as usize,
            (x1 - x0 - 2.0 * inset).max(1.0) as usize,
            (y1 - y0 - 2.0 * inset).max(1.0) as usize,
        );
        outline(&mut out, &cell, thickness + 1, color);
    }

    outline(&mut out, board, 3, GREEN);
    out
}
