//! Gradient-projection grid detector.
//!
//! Each axis is solved independently: the equalized region is differentiated
//! with a large Sobel kernel, the positive and negative parts of the gradient
//! are projected onto the axis, and their product peaks only where both a
//! dark-to-light and a light-to-dark transition line up, i.e. on grid lines
//! between alternating squares. The product is then searched for seven
//! equally spaced interior lines over an escalating threshold ladder.

use boardshot_core::{
    equalize_histogram, gaussian_kernel, sobel, Axis, FloatImage, GrayImage, GrayImageView,
};
use serde::{Deserialize, Serialize};

use crate::peaks::{find_peaks, fit_lines, prune_margin, select_interior, Interior};
use crate::{AxisDetection, GridError, GridLines, GridParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Signals below this carry only filter round-off.
const FLAT_SIGNAL_EPS: f64 = 1e-12;

/// Product of the projected positive and negative gradient parts.
///
/// For `Axis::X` the result has one sample per column, normalised by
/// `height²`; for `Axis::Y` one per row, normalised by `width²`.
pub fn projection_signal(grad: &FloatImage, axis: Axis) -> Vec<f64> {
    let (w, h) = (grad.width, grad.height);
    let (n, norm) = match axis {
        Axis::X => (w, (h * h) as f64),
        Axis::Y => (h, (w * w) as f64),
    };
    let mut pos = vec![0f64; n];
    let mut neg = vec![0f64; n];
    for y in 0..h {
        for x in 0..w {
            let v = grad.data[y * w + x] as f64;
            let i = match axis {
                Axis::X => x,
                Axis::Y => y,
            };
            if v > 0.0 {
                pos[i] += v;
            } else {
                neg[i] -= v;
            }
        }
    }
    if norm == 0.0 {
        return vec![0.0; n];
    }
    pos.iter().zip(&neg).map(|(p, q)| p * q / norm).collect()
}

/// Intermediate products of a grid detection run.
#[derive(Clone, Debug)]
pub struct GridAnalysis {
    pub equalized: GrayImage,
    /// `|Gx| + |Gy|` of the equalized region.
    pub gradient: FloatImage,
    /// Column signal (finds vertical lines).
    pub signal_x: Vec<f64>,
    /// Row signal (finds horizontal lines).
    pub signal_y: Vec<f64>,
    pub vertical: Option<AxisDetection>,
    pub horizontal: Option<AxisDetection>,
}

impl GridAnalysis {
    /// Grid lines, or the first axis that failed.
    pub fn lines(&self) -> Result<GridLines, GridError> {
        let vertical = self
            .vertical
            .as_ref()
            .ok_or(GridError::GridNotFound { axis: Axis::X })?;
        let horizontal = self
            .horizontal
            .as_ref()
            .ok_or(GridError::GridNotFound { axis: Axis::Y })?;
        Ok(GridLines {
            vertical: vertical.lines,
            horizontal: horizontal.lines,
        })
    }
}

/// Summary of one axis, suitable for reports.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AxisSummary {
    pub axis: Axis,
    pub found: bool,
    pub level: Option<usize>,
    pub interpolated: bool,
}

impl From<(Axis, Option<&AxisDetection>)> for AxisSummary {
    fn from((axis, det): (Axis, Option<&AxisDetection>)) -> Self {
        Self {
            axis,
            found: det.is_some(),
            level: det.map(|d| d.level),
            interpolated: det.is_some_and(|d| d.interpolated),
        }
    }
}

/// Finds the 9 + 9 boundary lines of the board inside a region.
#[derive(Clone, Debug, Default)]
pub struct GridDetector {
    params: GridParams,
}

impl GridDetector {
    pub fn new(params: GridParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &GridParams {
        &self.params
    }

    /// Detect grid lines in region coordinates.
    pub fn detect(&self, img: &GrayImageView<'_>) -> Result<GridLines, GridError> {
        self.analyze(img)?.lines()
    }

    /// Run detection and keep the intermediate images and signals.
    ///
    /// Only fails when the region is too small to analyse; per-axis failures
    /// are reported through [`GridAnalysis::lines`].
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, img), fields(width = img.width, height = img.height))
    )]
    pub fn analyze(&self, img: &GrayImageView<'_>) -> Result<GridAnalysis, GridError> {
        let min = self.params.min_region_px;
        if img.width < min || img.height < min {
            return Err(GridError::ImageTooSmall {
                width: img.width,
                height: img.height,
                min,
            });
        }

        let equalized = equalize_histogram(img);
        let norm = equalized.view().to_float();
        let gx = sobel(&norm, Axis::X, self.params.sobel_ksize);
        let gy = sobel(&norm, Axis::Y, self.params.sobel_ksize);

        let signal_x = projection_signal(&gx, Axis::X);
        let signal_y = projection_signal(&gy, Axis::Y);

        let vertical = self.solve_axis(Axis::X, &signal_x);
        let horizontal = self.solve_axis(Axis::Y, &signal_y);

        let gradient = FloatImage {
            width: gx.width,
            height: gx.height,
            data: gx
                .data
                .iter()
                .zip(&gy.data)
                .map(|(a, b)| a.abs() + b.abs())
                .collect(),
        };

        Ok(GridAnalysis {
            equalized,
            gradient,
            signal_x,
            signal_y,
            vertical,
            horizontal,
        })
    }

    fn attempt(&self, signal: &[f64], max: f64, level: usize, kernel: &[f64]) -> Option<Interior> {
        let threshold = max * level as f64 / self.params.threshold_levels as f64;
        let peaks = find_peaks(signal, threshold, kernel);
        let peaks = prune_margin(&peaks, signal.len() as f64, self.params.edge_margin_px);
        select_interior(&peaks, signal.len() as f64, &self.params)
    }

    /// Walk the threshold ladder; the first accepted level is replaced by the
    /// next stricter one when that also matches with an agreeing step.
    fn solve_axis(&self, axis: Axis, signal: &[f64]) -> Option<AxisDetection> {
        let max = signal.iter().copied().fold(0.0f64, f64::max);
        if max <= FLAT_SIGNAL_EPS {
            log::debug!("{axis} axis: flat projection signal");
            return None;
        }
        let kernel = gaussian_kernel(self.params.smoothing_window, self.params.smoothing_sigma);
        let levels = self.params.threshold_levels;

        for level in 1..levels {
            let Some(found) = self.attempt(signal, max, level, &kernel) else {
                continue;
            };
            let stricter = (level + 1 < levels)
                .then(|| self.attempt(signal, max, level + 1, &kernel))
                .flatten()
                .filter(|next| {
                    (next.step() - found.step()).abs() <= self.params.spacing_tol(found.step())
                });
            let (level, found) = match stricter {
                Some(next) => (level + 1, next),
                None => (level, found),
            };

            if found.interpolated {
                log::info!("{axis} axis: interpolated one missing grid line at level {level}");
            }
            let lines = fit_lines(&found.positions);
            log::debug!(
                "{axis} axis: accepted level {level}/{levels}, step {:.2}px, lines {:.1}..{:.1}",
                lines.step(),
                lines.first(),
                lines.last()
            );
            return Some(AxisDetection {
                axis,
                lines,
                level,
                interior: found.positions.to_vec(),
                interpolated: found.interpolated,
            });
        }

        log::debug!("{axis} axis: no threshold level produced 7 equally spaced lines");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_multiplies_opposite_parts() {
        let grad = FloatImage {
            width: 2,
            height: 2,
            data: vec![1.0, 3.0, -2.0, 0.5],
        };
        let sx = projection_signal(&grad, Axis::X);
        assert_eq!(sx, vec![1.0 * 2.0 / 4.0, 0.0]);
        let sy = projection_signal(&grad, Axis::Y);
        assert_eq!(sy, vec![0.0, 0.5 * 2.0 / 4.0]);
    }

    #[test]
    fn tiny_region_is_rejected() {
        let img = GrayImage::new(20, 200);
        let err = GridDetector::default().detect(&img.view()).unwrap_err();
        assert!(matches!(err, GridError::ImageTooSmall { width: 20, .. }));
    }

    #[test]
    fn flat_region_has_no_grid() {
        let img = GrayImage::from_fn(120, 120, |_, _| 90);
        let err = GridDetector::default().detect(&img.view()).unwrap_err();
        assert_eq!(err, GridError::GridNotFound { axis: Axis::X });
    }

    #[test]
    fn stricter_level_replaces_weak_match() {
        // Eight peaks of which the first is weak: level 1 sees an 8-run
        // (first dropped as border), level 2 sees the clean 7-run.
        let mut signal = vec![0.0; 420];
        let mut bump = |c: usize, h: f64| {
            for i in c - 2..c + 2 {
                signal[i] = h;
            }
        };
        bump(20, 0.3);
        for k in 1..=7 {
            bump(20 + 50 * k, 1.0);
        }
        let det = GridDetector::default();
        let axis = det.solve_axis(Axis::X, &signal).unwrap();
        assert_eq!(axis.level, 2);
        assert!((axis.interior[0] - 70.0).abs() < 1e-6);
        assert!((axis.lines.first() - 20.0).abs() < 1e-6);
    }
}
