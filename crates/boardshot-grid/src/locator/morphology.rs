//! Binary morphology with square structuring elements.

use boardshot_core::GrayImage;

#[derive(Clone, Copy)]
enum Op {
    Dilate,
    Erode,
}

/// One separable pass over the window `[c - before, c + after]`.
/// Pixels outside the image never win.
fn pass(src: &GrayImage, before: usize, after: usize, op: Op, horizontal: bool) -> GrayImage {
    let (w, h) = (src.width, src.height);
    let mut out = GrayImage::new(w, h);
    let n = if horizontal { w } else { h };
    for y in 0..h {
        for x in 0..w {
            let c = if horizontal { x } else { y };
            let lo = c.saturating_sub(before);
            let hi = (c + after + 1).min(n);
            let sample = |t: usize| {
                if horizontal {
                    src.data[y * w + t]
                } else {
                    src.data[t * w + x]
                }
            };
            let v = match op {
                Op::Dilate => (lo..hi).map(sample).max(),
                Op::Erode => (lo..hi).map(sample).min(),
            };
            out.data[y * w + x] = v.unwrap_or(0);
        }
    }
    out
}

/// Square `k × k` window anchored at `k / 2`; erosion uses the reflected
/// window so that closing never removes foreground.
fn apply(src: &GrayImage, k: usize, op: Op) -> GrayImage {
    let anchor = k / 2;
    let (before, after) = match op {
        Op::Dilate => (anchor, k - 1 - anchor),
        Op::Erode => (k - 1 - anchor, anchor),
    };
    let tmp = pass(src, before, after, op, true);
    pass(&tmp, before, after, op, false)
}

/// Closing (dilate then erode) with a `k × k` square.
pub(crate) fn close(src: &GrayImage, k: usize) -> GrayImage {
    if k <= 1 {
        return src.clone();
    }
    let dilated = apply(src, k, Op::Dilate);
    apply(&dilated, k, Op::Erode)
}
