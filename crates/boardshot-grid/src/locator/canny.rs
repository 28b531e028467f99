//! Canny edge detector on 8-bit images.

use boardshot_core::{GrayImage, GrayImageView};

/// tan(22.5°) and tan(67.5°).
const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_7;

/// Edge map (`255` = edge) with 3×3 Sobel gradients, L1 magnitude,
/// four-direction non-maximum suppression and hysteresis between
/// `low` and `high`.
pub(crate) fn canny(img: &GrayImageView<'_>, low: f32, high: f32) -> GrayImage {
    let (w, h) = (img.width, img.height);
    let mut out = GrayImage::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }

    let mut gx = vec![0f32; w * h];
    let mut gy = vec![0f32; w * h];
    let mut mag = vec![0f32; w * h];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let p = |dx: isize, dy: isize| {
                img.get((x as isize + dx) as usize, (y as isize + dy) as usize) as f32
            };
            let sx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
            let sy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
            let i = y * w + x;
            gx[i] = sx;
            gy[i] = sy;
            mag[i] = sx.abs() + sy.abs();
        }
    }

    // 0 = suppressed, 1 = weak, 2 = strong
    let mut class = vec![0u8; w * h];
    let mut stack = Vec::new();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = y * w + x;
            let m = mag[i];
            if m <= low {
                continue;
            }
            let (ax, ay) = (gx[i].abs(), gy[i].abs());
            let (a, b) = if ay <= TAN_22_5 * ax {
                (i - 1, i + 1)
            } else if ay >= TAN_67_5 * ax {
                (i - w, i + w)
            } else if (gx[i] > 0.0) == (gy[i] > 0.0) {
                (i - w - 1, i + w + 1)
            } else {
                (i - w + 1, i + w - 1)
            };
            if m > mag[a] && m >= mag[b] {
                if m > high {
                    class[i] = 2;
                    stack.push(i);
                } else {
                    class[i] = 1;
                }
            }
        }
    }

    while let Some(i) = stack.pop() {
        out.data[i] = 255;
        let (x, y) = (i % w, i / w);
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                let j = ny * w + nx;
                if class[j] == 1 {
                    class[j] = 2;
                    stack.push(j);
                }
            }
        }
    }
    out
}
