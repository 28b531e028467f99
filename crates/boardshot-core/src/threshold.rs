//! Histogram and global thresholding.

use crate::GrayImageView;

/// 256-bin intensity histogram.
pub fn histogram(img: &GrayImageView<'_>) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for &v in img.data {
        hist[v as usize] += 1;
    }
    hist
}

/// Otsu threshold of an image: the level maximising between-class variance.
///
/// Degenerate inputs are handled without a search: an empty image yields
/// 127, a constant image its only value, and a two-level image the midpoint.
pub fn otsu_threshold(img: &GrayImageView<'_>) -> u8 {
    if img.data.is_empty() {
        return 127;
    }
    let hist = histogram(img);

    let lo = hist.iter().position(|&h| h > 0).unwrap_or(0);
    let hi = hist.iter().rposition(|&h| h > 0).unwrap_or(255);
    if lo == hi {
        return lo as u8;
    }
    if hist.iter().filter(|&&h| h > 0).count() <= 2 {
        return ((lo + hi) / 2) as u8;
    }

    let total = img.data.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_bg = 0.0;
    let mut weight_bg = 0.0;
    let mut best = (f64::MIN, 127u8);

    for (t, &h) in hist.iter().enumerate().take(hi) {
        weight_bg += h as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        sum_bg += t as f64 * h as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_total - sum_bg) / weight_fg;
        let between = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        if between > best.0 {
            best = (between, t as u8);
        }
    }
    best.1
}
