use crate::Region;

/// Borrowed row-major 8-bit grayscale image.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl GrayImageView<'_> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Copy `region` (clamped to the view) into an owned image.
    pub fn crop(&self, region: &Region) -> GrayImage {
        let r = region.clamp_to(self.width, self.height);
        let mut data = Vec::with_capacity(r.area());
        for y in r.y..r.bottom() {
            let row = y * self.width;
            data.extend_from_slice(&self.data[row + r.x..row + r.right()]);
        }
        GrayImage {
            width: r.width,
            height: r.height,
            data,
        }
    }

    /// Convert to `[0, 1]` floats.
    pub fn to_float(&self) -> FloatImage {
        FloatImage {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| v as f32 / 255.0).collect(),
        }
    }
}

/// Owned row-major 8-bit grayscale image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.width + x] = v;
    }
}

/// Owned row-major `f32` image, used for gradients and intermediate filters.
#[derive(Clone, Debug, PartialEq)]
pub struct FloatImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl FloatImage {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Largest absolute value, 0 for an empty image.
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |m, v| m.max(v.abs()))
    }

    /// Rescale `|v|` linearly into `0..=255` for visualisation.
    pub fn to_gray_abs(&self) -> GrayImage {
        let max = self.max_abs();
        let scale = if max > 0.0 { 255.0 / max } else { 0.0 };
        GrayImage {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .map(|v| (v.abs() * scale).round().clamp(0.0, 255.0) as u8)
                .collect(),
        }
    }

    /// Round and saturate into an 8-bit image.
    pub fn to_gray_saturating(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .map(|v| v.round().clamp(0.0, 255.0) as u8)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_clamps_to_view() {
        let img = GrayImage::from_fn(4, 3, |x, y| (y * 4 + x) as u8);
        let out = img.view().crop(&Region::new(2, 1, 10, 10));
        assert_eq!((out.width, out.height), (2, 2));
        assert_eq!(out.data, vec![6, 7, 10, 11]);
    }

    #[test]
    fn abs_visualisation_uses_full_range() {
        let img = FloatImage {
            width: 3,
            height: 1,
            data: vec![-2.0, 1.0, 0.0],
        };
        assert_eq!(img.to_gray_abs().data, vec![255, 128, 0]);
    }
}
