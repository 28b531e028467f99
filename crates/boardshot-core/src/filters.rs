//! Separable image filters and 1D signal helpers.
//!
//! All 2D filters use reflect-101 borders (`dcb|abcd|cba`). Kernels are
//! normalised so that large supports stay well inside `f32` range.

use serde::{Deserialize, Serialize};

use crate::{threshold::histogram, FloatImage, GrayImage, GrayImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Image axis. `X` runs along columns, `Y` along rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

/// Histogram equalization with a cumulative lookup table.
///
/// The darkest present level maps to 0 and the brightest to 255; a constant
/// image is returned unchanged.
pub fn equalize_histogram(img: &GrayImageView<'_>) -> GrayImage {
    let hist = histogram(img);
    let total = img.data.len();
    let Some(first) = hist.iter().position(|&h| h > 0) else {
        return GrayImage::new(img.width, img.height);
    };
    if hist[first] as usize == total {
        return GrayImage {
            width: img.width,
            height: img.height,
            data: img.data.to_vec(),
        };
    }

    let scale = 255.0 / (total - hist[first] as usize) as f64;
    let mut lut = [0u8; 256];
    let mut cum = 0usize;
    for (v, &h) in hist.iter().enumerate().skip(first + 1) {
        cum += h as usize;
        lut[v] = (cum as f64 * scale).round().clamp(0.0, 255.0) as u8;
    }

    GrayImage {
        width: img.width,
        height: img.height,
        data: img.data.iter().map(|&v| lut[v as usize]).collect(),
    }
}

/// Normalised 1D Gaussian of odd length `ksize`.
///
/// A non-positive `sigma` is derived from the size as
/// `0.3 * ((ksize - 1) / 2 - 1) + 0.8`.
pub fn gaussian_kernel(ksize: usize, sigma: f64) -> Vec<f64> {
    let ksize = ksize.max(1) | 1;
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let c = (ksize / 2) as f64;
    let mut k: Vec<f64> = (0..ksize)
        .map(|i| {
            let d = i as f64 - c;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = k.iter().sum();
    k.iter_mut().for_each(|v| *v /= sum);
    k
}

fn binomial_row(order: usize) -> Vec<f64> {
    let mut row = vec![1.0f64];
    for _ in 0..order {
        let mut next = vec![1.0; row.len() + 1];
        for i in 1..row.len() {
            next[i] = row[i - 1] + row[i];
        }
        row = next;
    }
    row
}

/// Sobel smoothing kernel of odd length `ksize` (binomial, sums to 1).
pub fn sobel_smoothing_kernel(ksize: usize) -> Vec<f64> {
    let ksize = ksize.max(3) | 1;
    let row = binomial_row(ksize - 1);
    let norm = 2f64.powi(ksize as i32 - 1);
    row.into_iter().map(|v| v / norm).collect()
}

/// Sobel first-derivative kernel of odd length `ksize`, applied as a
/// correlation: positive response for intensity increasing with the index.
pub fn sobel_derivative_kernel(ksize: usize) -> Vec<f64> {
    let ksize = ksize.max(3) | 1;
    let b = binomial_row(ksize - 2);
    let norm = 2f64.powi(ksize as i32 - 2);
    (0..ksize)
        .map(|j| {
            let left = if j >= 1 { b[j - 1] } else { 0.0 };
            let right = b.get(j).copied().unwrap_or(0.0);
            (left - right) / norm
        })
        .collect()
}

#[inline]
fn reflect101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n as isize - 1);
    let m = i.rem_euclid(period);
    if m >= n as isize {
        (period - m) as usize
    } else {
        m as usize
    }
}

/// Correlate rows with `kx`, then columns with `ky`.
fn separable_filter(src: &FloatImage, kx: &[f64], ky: &[f64]) -> FloatImage {
    let (w, h) = (src.width, src.height);
    let cx = (kx.len() / 2) as isize;
    let cy = (ky.len() / 2) as isize;

    let mut tmp = vec![0f32; w * h];
    for y in 0..h {
        let row = &src.data[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0f64;
            for (j, &k) in kx.iter().enumerate() {
                let xx = reflect101(x as isize + j as isize - cx, w);
                acc += k * row[xx] as f64;
            }
            tmp[y * w + x] = acc as f32;
        }
    }

    let mut out = FloatImage::zeros(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0f64;
            for (j, &k) in ky.iter().enumerate() {
                let yy = reflect101(y as isize + j as isize - cy, h);
                acc += k * tmp[yy * w + x] as f64;
            }
            out.data[y * w + x] = acc as f32;
        }
    }
    out
}

/// First derivative along `axis` with a `ksize`-tap Sobel operator.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src), fields(width = src.width, height = src.height))
)]
pub fn sobel(src: &FloatImage, axis: Axis, ksize: usize) -> FloatImage {
    if src.width == 0 || src.height == 0 {
        return src.clone();
    }
    let smooth = sobel_smoothing_kernel(ksize);
    let deriv = sobel_derivative_kernel(ksize);
    match axis {
        Axis::X => separable_filter(src, &deriv, &smooth),
        Axis::Y => separable_filter(src, &smooth, &deriv),
    }
}

/// Gaussian blur of an 8-bit image.
pub fn gaussian_blur(img: &GrayImageView<'_>, ksize: usize, sigma: f64) -> GrayImage {
    if img.width == 0 || img.height == 0 {
        return GrayImage::new(img.width, img.height);
    }
    let k = gaussian_kernel(ksize, sigma);
    let src = FloatImage {
        width: img.width,
        height: img.height,
        data: img.data.iter().map(|&v| v as f32).collect(),
    };
    separable_filter(&src, &k, &k).to_gray_saturating()
}

/// Discrete convolution returning the central `signal.len()` samples of the
/// full result, with zeros outside the signal.
pub fn convolve_same(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let m = kernel.len();
    if n == 0 || m == 0 {
        return vec![0.0; n];
    }
    let shift = (m - 1) / 2;
    (0..n)
        .map(|i| {
            let t = i + shift;
            kernel
                .iter()
                .enumerate()
                .filter_map(|(j, &k)| t.checked_sub(j).and_then(|s| signal.get(s)).map(|&s| k * s))
                .sum::<f64>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn small_sobel_kernels_match_textbook() {
        assert_eq!(sobel_smoothing_kernel(3), vec![0.25, 0.5, 0.25]);
        assert_eq!(sobel_derivative_kernel(3), vec![-0.5, 0.0, 0.5]);
        let d5 = sobel_derivative_kernel(5);
        assert_eq!(d5, vec![-0.125, -0.25, 0.0, 0.25, 0.125]);
    }

    #[test]
    fn large_kernels_are_normalised() {
        let s = sobel_smoothing_kernel(31);
        assert_relative_eq!(s.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        let d = sobel_derivative_kernel(31);
        assert_relative_eq!(d.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        let g = gaussian_kernel(21, 8.0);
        assert_relative_eq!(g.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(g[0], g[20]);
    }

    #[test]
    fn sobel_responds_to_vertical_step_only_along_x() {
        let img = FloatImage {
            width: 12,
            height: 6,
            data: (0..72).map(|i| if i % 12 >= 6 { 1.0 } else { 0.0 }).collect(),
        };
        let gx = sobel(&img, Axis::X, 5);
        let gy = sobel(&img, Axis::Y, 5);
        assert!(gx.get(5, 3) > 0.0);
        assert_relative_eq!(gx.get(5, 3), gx.get(6, 3));
        assert_relative_eq!(gx.get(0, 3), 0.0);
        assert!(gy.max_abs() < 1e-6);
    }

    #[test]
    fn convolve_same_centres_full_output() {
        let out = convolve_same(&[0.0, 0.0, 1.0, 0.0, 0.0], &[1.0, 2.0, 3.0]);
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn equalization_stretches_to_full_range() {
        let img = GrayImage::from_fn(4, 1, |x, _| 100 + x as u8);
        let eq = equalize_histogram(&img.view());
        assert_eq!(eq.data, vec![0, 85, 170, 255]);
    }

    #[test]
    fn reflect_border_indices() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(-9, 5), 1);
    }
}
