use serde::{Deserialize, Serialize};

/// Parameters for the contour-based board region locator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionLocatorParams {
    /// Gaussian pre-blur kernel size (odd).
    pub blur_ksize: usize,
    /// Fixed Canny hysteresis thresholds on the 3×3 L1 gradient magnitude.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Closing kernel side is `max(closing_min_px, min(w, h) / closing_divisor)`.
    pub closing_min_px: usize,
    pub closing_divisor: usize,
    /// Number of largest contours considered per strategy.
    pub max_candidates: usize,
    /// Minimum bounding-box area as a fraction of the image area.
    pub min_area_frac: f64,
    /// Accepted bounding-box aspect range (width / height).
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Weight of the area bonus in the boardness score.
    pub area_weight: f64,
    /// Padding added to each side of the winning box, relative to its size.
    pub padding_frac: f64,
}

impl Default for RegionLocatorParams {
    fn default() -> Self {
        Self {
            blur_ksize: 5,
            canny_low: 50.0,
            canny_high: 150.0,
            closing_min_px: 10,
            closing_divisor: 80,
            max_candidates: 20,
            min_area_frac: 0.05,
            min_aspect: 0.5,
            max_aspect: 2.0,
            area_weight: 0.5,
            padding_frac: 0.02,
        }
    }
}

/// Parameters for the gradient-projection grid detector.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Sobel aperture; large enough to respond to board-scale edges only.
    pub sobel_ksize: usize,
    /// Threshold ladder size. Level `a` thresholds the signal at
    /// `max * a / threshold_levels` for `a` in `1..threshold_levels`.
    pub threshold_levels: usize,
    /// Gaussian window applied to the binarised signal.
    pub smoothing_window: usize,
    pub smoothing_sigma: f64,
    /// Peaks closer than this to either end of the axis are discarded.
    pub edge_margin_px: f64,
    /// Relative spacing tolerance for equally spaced peaks.
    pub spacing_tol_frac: f64,
    /// Absolute floor of the spacing tolerance.
    pub min_spacing_tol_px: f64,
    /// Gap tolerances used when interpolating one missing interior line.
    pub fill_step_tol_frac: f64,
    pub fill_double_tol_frac: f64,
    /// Smallest accepted square size. Below about twice the smoothing
    /// sigma neighbouring lines merge and the fit drifts.
    pub min_step_px: f64,
    /// Smallest region side the detector will analyse.
    pub min_region_px: usize,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            sobel_ksize: 31,
            threshold_levels: 5,
            smoothing_window: 21,
            smoothing_sigma: 8.0,
            edge_margin_px: 10.0,
            spacing_tol_frac: 0.06,
            min_spacing_tol_px: 5.0,
            fill_step_tol_frac: 0.08,
            fill_double_tol_frac: 0.15,
            min_step_px: 18.0,
            min_region_px: 48,
        }
    }
}

impl GridParams {
    /// Spacing tolerance for a given step.
    #[inline]
    pub fn spacing_tol(&self, step: f64) -> f64 {
        (self.spacing_tol_frac * step).max(self.min_spacing_tol_px)
    }
}

/// Parameters for cutting the located grid into tiles.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SquareParams {
    /// Output tile side in pixels.
    pub tile_size: u32,
}

impl Default for SquareParams {
    fn default() -> Self {
        Self { tile_size: 40 }
    }
}
