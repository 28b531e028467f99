//! Cutting the located grid into 64 classifier-sized tiles.

use boardshot_core::Region;
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::{GridLines, SquareError, SquareParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One board cell, as oriented in the image.
#[derive(Clone, Debug)]
pub struct Tile {
    /// 0 = top row of the image.
    pub row: usize,
    /// 0 = leftmost column of the image.
    pub col: usize,
    /// Source rectangle in full-image coordinates.
    pub rect: Region,
    /// `tile_size × tile_size` colour crop.
    pub image: RgbImage,
}

/// The 64 tiles in row-major order.
#[derive(Clone, Debug)]
pub struct Squares {
    tiles: Vec<Tile>,
}

impl Squares {
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Tile> {
        (row < 8 && col < 8).then(|| &self.tiles[row * 8 + col])
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles
    }
}

/// Crop the 64 cells of `grid` (in `region` coordinates) out of `image`.
///
/// Line coordinates are rounded and clamped to the region; each crop is
/// resized to `params.tile_size` with a triangle filter.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(image, grid, params)))]
pub fn extract_squares(
    image: &RgbImage,
    region: &Region,
    grid: &GridLines,
    params: &SquareParams,
) -> Result<Squares, SquareError> {
    if !grid.is_valid() {
        return Err(SquareError::MalformedGrid);
    }
    let region = region.clamp_to(image.width() as usize, image.height() as usize);
    let snap = |v: f64, origin: usize, extent: usize| -> usize {
        (v.round().max(0.0) as usize).min(extent) + origin
    };
    let xs: Vec<usize> = grid
        .vertical
        .0
        .iter()
        .map(|&v| snap(v, region.x, region.width))
        .collect();
    let ys: Vec<usize> = grid
        .horizontal
        .0
        .iter()
        .map(|&v| snap(v, region.y, region.height))
        .collect();

    let size = params.tile_size.max(1);
    let mut tiles = Vec::with_capacity(64);
    for row in 0..8 {
        for col in 0..8 {
            let rect = Region::new(
                xs[col],
                ys[row],
                xs[col + 1].saturating_sub(xs[col]),
                ys[row + 1].saturating_sub(ys[row]),
            );
            if rect.is_empty() {
                return Err(SquareError::DegenerateCell { row, col });
            }
            let crop = imageops::crop_imm(
                image,
                rect.x as u32,
                rect.y as u32,
                rect.width as u32,
                rect.height as u32,
            )
            .to_image();
            let image = imageops::resize(&crop, size, size, FilterType::Triangle);
            tiles.push(Tile {
                row,
                col,
                rect,
                image,
            });
        }
    }
    Ok(Squares { tiles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AxisLines;
    use image::Rgb;

    fn grid(origin: f64, step: f64) -> GridLines {
        GridLines {
            vertical: AxisLines::from_origin_step(origin, step),
            horizontal: AxisLines::from_origin_step(origin, step),
        }
    }

    #[test]
    fn tiles_are_row_major_and_resized() {
        let image = RgbImage::from_fn(100, 100, |x, y| {
            let row = (y.saturating_sub(10) / 10).min(7);
            let col = (x.saturating_sub(10) / 10).min(7);
            Rgb([row as u8 * 30, col as u8 * 30, 0])
        });
        let squares = extract_squares(
            &image,
            &Region::new(0, 0, 100, 100),
            &grid(10.0, 10.0),
            &SquareParams::default(),
        )
        .unwrap();
        assert_eq!(squares.len(), 64);
        let t = squares.get(2, 5).unwrap();
        assert_eq!((t.row, t.col), (2, 5));
        assert_eq!(t.rect, Region::new(60, 30, 10, 10));
        assert_eq!(t.image.dimensions(), (40, 40));
        assert_eq!(t.image.get_pixel(20, 20), &Rgb([60, 150, 0]));
    }

    #[test]
    fn lines_are_offset_by_region_and_clamped() {
        let image = RgbImage::new(120, 120);
        let squares = extract_squares(
            &image,
            &Region::new(20, 20, 80, 80),
            &grid(-2.0, 10.5),
            &SquareParams { tile_size: 16 },
        )
        .unwrap();
        assert_eq!(squares.get(0, 0).unwrap().rect.x, 20);
        assert_eq!(squares.get(7, 7).unwrap().rect.right(), 100);
    }

    #[test]
    fn collapsed_grid_is_rejected() {
        let image = RgbImage::new(50, 50);
        let err = extract_squares(
            &image,
            &Region::new(0, 0, 50, 50),
            &grid(0.0, 0.2),
            &SquareParams::default(),
        )
        .unwrap_err();
        assert_eq!(err, SquareError::DegenerateCell { row: 0, col: 0 });
    }
}
