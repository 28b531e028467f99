//! Synthetic screenshots and a nearest-prototype ensemble that reads them.

#![allow(dead_code)]

use std::sync::Arc;

use boardshot::classify::{tile_features, Ensemble, EnsembleWeights, ModelWeights, OutputUnit};
use boardshot::core::{PieceColor, PieceKind, SquareClass};
use boardshot::fen::Position;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

pub const SHOT_W: u32 = 700;
pub const SHOT_H: u32 = 480;
pub const BOARD_X: u32 = 60;
pub const BOARD_Y: u32 = 40;
pub const SQUARE: u32 = 50;

const BACKGROUND: Rgb<u8> = Rgb([22, 22, 24]);
const SIDEBAR: Rgb<u8> = Rgb([48, 48, 52]);
const EVAL_BAR: Rgb<u8> = Rgb([210, 210, 210]);
const LIGHT: Rgb<u8> = Rgb([240, 217, 181]);
const DARK: Rgb<u8> = Rgb([181, 136, 99]);
const WHITE_PIECE: Rgb<u8> = Rgb([250, 250, 250]);
const BLACK_PIECE: Rgb<u8> = Rgb([40, 40, 40]);

/// Glyph block side; a glyph is a 3×3 block mask offset by one block.
const BLOCK: u32 = 10;

/// Row-major 3×3 masks, pairwise at least three blocks apart.
fn glyph(kind: PieceKind) -> [u8; 9] {
    match kind {
        PieceKind::Pawn => [0, 0, 0, 0, 1, 0, 1, 1, 1],
        PieceKind::Rook => [1, 0, 1, 1, 1, 1, 1, 1, 1],
        PieceKind::Bishop => [0, 1, 0, 1, 1, 1, 0, 1, 0],
        PieceKind::Knight => [1, 1, 0, 1, 1, 0, 0, 1, 1],
        PieceKind::King => [1, 1, 1, 0, 1, 0, 1, 1, 1],
        PieceKind::Queen => [1, 0, 1, 0, 1, 0, 0, 1, 0],
    }
}

/// One `SQUARE × SQUARE` cell.
pub fn render_square(class: SquareClass, light: bool) -> RgbImage {
    let ground = if light { LIGHT } else { DARK };
    let mut cell = RgbImage::from_pixel(SQUARE, SQUARE, ground);
    if let Some(piece) = class.piece() {
        let ink = match piece.color {
            PieceColor::White => WHITE_PIECE,
            PieceColor::Black => BLACK_PIECE,
        };
        let mask = glyph(piece.kind);
        for (y, x) in (0..SQUARE).flat_map(|y| (0..SQUARE).map(move |x| (y, x))) {
            let (bx, by) = (x / BLOCK, y / BLOCK);
            if (1..=3).contains(&bx) && (1..=3).contains(&by) && mask[((by - 1) * 3 + bx - 1) as usize] == 1 {
                cell.put_pixel(x, y, ink);
            }
        }
    }
    cell
}

/// A browser-like screenshot: dark page, evaluation bar, the board, and a
/// move-list sidebar. Rows and columns are drawn as given.
pub fn screenshot(position: &Position) -> RgbImage {
    let mut shot = RgbImage::from_pixel(SHOT_W, SHOT_H, BACKGROUND);
    for y in 20..460 {
        for x in 520..680 {
            shot.put_pixel(x, y, SIDEBAR);
        }
        // Text-like stripes in the sidebar.
        if y % 24 < 6 {
            for x in 540..640 {
                shot.put_pixel(x, y, Rgb([150, 150, 150]));
            }
        }
    }
    for y in BOARD_Y..BOARD_Y + 8 * SQUARE {
        for x in 15..30 {
            shot.put_pixel(x, y, EVAL_BAR);
        }
    }
    for (row, col, class) in position.iter() {
        let cell = render_square(class, (row + col) % 2 == 0);
        imageops::replace(
            &mut shot,
            &cell,
            (BOARD_X + col as u32 * SQUARE) as i64,
            (BOARD_Y + row as u32 * SQUARE) as i64,
        );
    }
    shot
}

pub fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Softmax unit per (class, square shade) whose logit is
/// `-beta * |x - prototype|^2` up to a per-tile constant.
fn prototype_model(name: &str, input_size: u32, beta: f64) -> ModelWeights {
    let mut units = Vec::new();
    for class in SquareClass::all() {
        for light in [true, false] {
            let tile = imageops::resize(&render_square(class, light), 40, 40, FilterType::Triangle);
            let mu = tile_features(&tile, input_size);
            units.push(OutputUnit {
                class,
                weights: mu.iter().map(|v| 2.0 * beta * v).collect(),
                bias: -beta * mu.norm_squared(),
            });
        }
    }
    ModelWeights {
        name: name.into(),
        input_size,
        temperature: 1.0,
        units,
        class_log_priors: None,
    }
}

pub fn prototype_weights() -> EnsembleWeights {
    EnsembleWeights {
        members: vec![
            prototype_model("proto-8", 8, 200.0),
            prototype_model("proto-12", 12, 120.0),
            prototype_model("proto-16", 16, 80.0),
        ],
    }
}

pub fn prototype_ensemble() -> Arc<Ensemble> {
    Arc::new(prototype_weights().build().unwrap())
}
