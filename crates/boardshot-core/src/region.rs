use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle `[x, x + width) × [y, y + height)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The whole `width × height` frame.
    pub const fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    #[inline]
    pub fn right(&self) -> usize {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> usize {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height; 0 for a degenerate region.
    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    /// Intersection with the `width × height` frame.
    pub fn clamp_to(&self, width: usize, height: usize) -> Region {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.right().min(width);
        let y1 = self.bottom().min(height);
        Region::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Grow each side by `frac` of the corresponding extent, clamped to the frame.
    pub fn padded(&self, frac: f64, width: usize, height: usize) -> Region {
        let pad_x = (frac * self.width as f64).max(0.0) as usize;
        let pad_y = (frac * self.height as f64).max(0.0) as usize;
        let x0 = self.x.saturating_sub(pad_x);
        let y0 = self.y.saturating_sub(pad_y);
        let x1 = (self.right() + pad_x).min(width);
        let y1 = (self.bottom() + pad_y).min(height);
        Region::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    /// Translate a region expressed relative to `self` into the parent frame.
    pub fn to_parent(&self, inner: &Region) -> Region {
        Region::new(self.x + inner.x, self.y + inner.y, inner.width, inner.height)
    }

    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_is_clamped_to_frame() {
        let r = Region::new(5, 100, 100, 50).padded(0.1, 108, 200);
        assert_eq!(r, Region::new(0, 95, 108, 60));
    }

    #[test]
    fn aspect_of_degenerate_region_is_zero() {
        assert_eq!(Region::new(0, 0, 10, 0).aspect(), 0.0);
        assert!((Region::new(0, 0, 30, 20).aspect() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn parent_translation_round_trips_containment() {
        let outer = Region::new(10, 20, 100, 100);
        let inner = outer.to_parent(&Region::new(5, 5, 10, 10));
        assert_eq!(inner, Region::new(15, 25, 10, 10));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }
}
