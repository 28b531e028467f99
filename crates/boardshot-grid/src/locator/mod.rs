//! Contour-based board region locator.
//!
//! Screenshots carry sidebars, move lists and evaluation bars around the
//! board. The locator runs several edge/contour strategies, keeps the most
//! board-like bounding box of each, and returns the best one padded by a
//! small margin so later stages see the whole grid.

mod canny;
mod contours;
mod morphology;

use boardshot_core::{gaussian_blur, otsu_threshold, GrayImage, GrayImageView, Region};
use serde::{Deserialize, Serialize};

use crate::{LocateError, RegionLocatorParams};
use contours::{find_contours, Retrieval};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Edge/contour strategy that produced a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    /// Fixed Canny thresholds, closing, outer contours only.
    ClosedExternal,
    /// Fixed Canny thresholds, closing, full contour tree.
    ClosedTree,
    /// Fixed Canny thresholds without closing, outer contours only.
    RawExternal,
    /// Otsu-derived Canny thresholds, closing, outer contours only.
    AdaptiveExternal,
}

impl LocatorStrategy {
    pub const ALL: [LocatorStrategy; 4] = [
        LocatorStrategy::ClosedExternal,
        LocatorStrategy::ClosedTree,
        LocatorStrategy::RawExternal,
        LocatorStrategy::AdaptiveExternal,
    ];
}

/// A located board region with the strategy and score that won.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocatedRegion {
    /// Padded region, clamped to the image.
    pub region: Region,
    /// Unpadded bounding box of the winning contour.
    pub contour_bbox: Region,
    pub strategy: LocatorStrategy,
    /// Boardness score, lower is better.
    pub score: f64,
}

/// Finds the sub-rectangle of a screenshot most likely to hold the board.
#[derive(Clone, Debug, Default)]
pub struct RegionLocator {
    params: RegionLocatorParams,
}

impl RegionLocator {
    pub fn new(params: RegionLocatorParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &RegionLocatorParams {
        &self.params
    }

    /// Boardness of a `width × height` box in an image of `image_area`
    /// pixels: squared aspect deviation minus an area bonus.
    pub fn score(&self, width: usize, height: usize, image_area: usize) -> f64 {
        let aspect = if height > 0 {
            width as f64 / height as f64
        } else {
            0.0
        };
        let area_frac = (width * height) as f64 / image_area.max(1) as f64;
        (1.0 - aspect).powi(2) - self.params.area_weight * area_frac
    }

    /// Locate the board in a grayscale screenshot.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, gray), fields(width = gray.width, height = gray.height))
    )]
    pub fn locate(&self, gray: &GrayImageView<'_>) -> Result<LocatedRegion, LocateError> {
        let best = self
            .candidates(gray)
            .into_iter()
            .min_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or(LocateError::NoBoardFound {
                strategies: LocatorStrategy::ALL.len(),
            })?;
        log::info!(
            "board region {}x{} at ({}, {}) via {:?} (score {:.3})",
            best.region.width,
            best.region.height,
            best.region.x,
            best.region.y,
            best.strategy,
            best.score
        );
        Ok(best)
    }

    /// Best candidate of every strategy that found one, in strategy order.
    pub fn candidates(&self, gray: &GrayImageView<'_>) -> Vec<LocatedRegion> {
        let (w, h) = (gray.width, gray.height);
        if w == 0 || h == 0 {
            return Vec::new();
        }
        let p = &self.params;
        let blurred = gaussian_blur(gray, p.blur_ksize, 0.0);
        let k = p.closing_min_px.max(w.min(h) / p.closing_divisor.max(1));

        let edges = canny::canny(&blurred.view(), p.canny_low, p.canny_high);
        let closed = morphology::close(&edges, k);

        let otsu = otsu_threshold(&blurred.view()) as f32;
        let adaptive = canny::canny(&blurred.view(), 0.5 * otsu, otsu);
        let adaptive_closed = morphology::close(&adaptive, k);

        let sources: [(LocatorStrategy, &GrayImage, Retrieval); 4] = [
            (LocatorStrategy::ClosedExternal, &closed, Retrieval::External),
            (LocatorStrategy::ClosedTree, &closed, Retrieval::Tree),
            (LocatorStrategy::RawExternal, &edges, Retrieval::External),
            (LocatorStrategy::AdaptiveExternal, &adaptive_closed, Retrieval::External),
        ];

        sources
            .into_iter()
            .filter_map(|(strategy, img, retrieval)| {
                let found = self.best_box(img, retrieval);
                log::debug!("locator strategy {strategy:?}: {found:?}");
                found.map(|(bbox, score)| LocatedRegion {
                    region: bbox.padded(p.padding_frac, w, h),
                    contour_bbox: bbox,
                    strategy,
                    score,
                })
            })
            .collect()
    }

    fn best_box(&self, img: &GrayImage, retrieval: Retrieval) -> Option<(Region, f64)> {
        let p = &self.params;
        let image_area = img.width * img.height;
        find_contours(img, retrieval)
            .into_iter()
            .take(p.max_candidates)
            .filter(|c| {
                let bbox = c.bbox;
                let aspect = bbox.aspect();
                bbox.area() as f64 >= p.min_area_frac * image_area as f64
                    && aspect >= p.min_aspect
                    && aspect <= p.max_aspect
            })
            .map(|c| (c.bbox, self.score(c.bbox.width, c.bbox.height, image_area)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
