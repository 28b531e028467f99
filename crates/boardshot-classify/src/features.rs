use image::imageops::{self, FilterType};
use image::RgbImage;
use nalgebra::DVector;

/// Luma of `tile`, resampled to `size × size`, scaled to `[0, 1]`, row-major.
pub fn tile_features(tile: &RgbImage, size: u32) -> DVector<f64> {
    let gray = imageops::grayscale(tile);
    let gray = if gray.dimensions() == (size, size) {
        gray
    } else {
        imageops::resize(&gray, size, size, FilterType::Triangle)
    };
    DVector::from_iterator(
        (size * size) as usize,
        gray.pixels().map(|p| p.0[0] as f64 / 255.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn constant_tile_gives_constant_features() {
        let tile = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        let f = tile_features(&tile, 8);
        assert_eq!(f.len(), 64);
        assert!(f.iter().all(|&v| (v - 1.0).abs() < 1e-9));
    }

    #[test]
    fn layout_is_row_major() {
        let tile = RgbImage::from_fn(4, 4, |_, y| if y == 0 { Rgb([255; 3]) } else { Rgb([0; 3]) });
        let f = tile_features(&tile, 4);
        assert_eq!(f[0], 1.0);
        assert_eq!(f[3], 1.0);
        assert_eq!(f[4], 0.0);
    }
}
