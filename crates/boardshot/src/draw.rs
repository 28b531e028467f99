//! Small raster helpers for overlays and diagnostic images.

use boardshot_core::{FloatImage, GrayImage, Region};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

pub(crate) const GREEN: Rgb<u8> = Rgb([34, 197, 94]);
pub(crate) const AMBER: Rgb<u8> = Rgb([245, 158, 11]);
pub(crate) const RED: Rgb<u8> = Rgb([239, 68, 68]);

/// Filled axis-aligned rectangle, clipped to the image.
pub(crate) fn fill_rect(img: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    for y in y0.max(0)..y1.min(h) {
        for x in x0.max(0)..x1.min(w) {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

pub(crate) fn vline(img: &mut RgbImage, x: f64, y0: f64, y1: f64, thickness: u32, color: Rgb<u8>) {
    let x0 = x.round() as i64 - thickness as i64 / 2;
    fill_rect(img, x0, y0.round() as i64, x0 + thickness as i64, y1.round() as i64 + 1, color);
}

pub(crate) fn hline(img: &mut RgbImage, y: f64, x0: f64, x1: f64, thickness: u32, color: Rgb<u8>) {
    let y0 = y.round() as i64 - thickness as i64 / 2;
    fill_rect(img, x0.round() as i64, y0, x1.round() as i64 + 1, y0 + thickness as i64, color);
}

/// Rectangle outline drawn inside `r`.
pub(crate) fn outline(img: &mut RgbImage, r: &Region, thickness: u32, color: Rgb<u8>) {
    let (x0, y0) = (r.x as i64, r.y as i64);
    let (x1, y1) = (r.right() as i64, r.bottom() as i64);
    let t = thickness as i64;
    fill_rect(img, x0, y0, x1, y0 + t, color);
    fill_rect(img, x0, y1 - t, x1, y1, color);
    fill_rect(img, x0, y0, x0 + t, y1, color);
    fill_rect(img, x1 - t, y0, x1, y1, color);
}

/// Bresenham segment.
pub(crate) fn segment(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        fill_rect(img, x, y, x + 1, y + 1, color);
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

pub(crate) fn gray_to_rgb(img: &GrayImage) -> RgbImage {
    RgbImage::from_fn(img.width as u32, img.height as u32, |x, y| {
        let v = img.get(x as usize, y as usize);
        Rgb([v, v, v])
    })
}

/// Piecewise-linear approximation of the inferno colormap.
fn inferno(t: f32) -> Rgb<u8> {
    const STOPS: [[f32; 3]; 5] = [
        [0.0, 0.0, 4.0],
        [87.0, 16.0, 110.0],
        [188.0, 55.0, 84.0],
        [249.0, 142.0, 9.0],
        [252.0, 255.0, 164.0],
    ];
    let t = t.clamp(0.0, 1.0) * (STOPS.len() - 1) as f32;
    let i = (t.floor() as usize).min(STOPS.len() - 2);
    let f = t - i as f32;
    let mix = |c: usize| (STOPS[i][c] + (STOPS[i + 1][c] - STOPS[i][c]) * f).round() as u8;
    Rgb([mix(0), mix(1), mix(2)])
}

/// Magnitude image normalised to its maximum and colour-mapped.
pub(crate) fn heatmap(img: &FloatImage) -> RgbImage {
    let max = img.max_abs();
    let scale = if max > 0.0 { 1.0 / max } else { 0.0 };
    RgbImage::from_fn(img.width as u32, img.height as u32, |x, y| {
        inferno(img.get(x as usize, y as usize).abs() * scale)
    })
}

/// Shrink to at most `max_width` wide, keeping the aspect ratio.
pub(crate) fn fit_width(img: RgbImage, max_width: u32) -> RgbImage {
    if img.width() <= max_width || img.width() == 0 {
        return img;
    }
    let height = ((img.height() as f64 * max_width as f64 / img.width() as f64) as u32).max(1);
    imageops::resize(&img, max_width, height, FilterType::Triangle)
}
