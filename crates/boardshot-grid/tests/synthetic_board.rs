use boardshot_core::{Axis, GrayImage};
use boardshot_grid::{
    extract_squares, GridDetector, GridError, GridParams, RegionLocator, SquareParams,
};
use image::{Rgb, RgbImage};

const ORIGIN: usize = 30;
const SQUARE: usize = 50;
const SIZE: usize = 2 * ORIGIN + 8 * SQUARE;

/// Checkerboard on a mid-grey frame. `file_color` maps a file index to the
/// file whose colour pattern it uses.
fn board(file_color: impl Fn(usize) -> usize) -> GrayImage {
    GrayImage::from_fn(SIZE, SIZE, |x, y| {
        let inside = (ORIGIN..ORIGIN + 8 * SQUARE).contains(&x)
            && (ORIGIN..ORIGIN + 8 * SQUARE).contains(&y);
        if !inside {
            return 128;
        }
        let col = file_color((x - ORIGIN) / SQUARE);
        let row = (y - ORIGIN) / SQUARE;
        if (row + col) % 2 == 0 {
            200
        } else {
            60
        }
    })
}

fn expected(k: usize) -> f64 {
    (ORIGIN + k * SQUARE) as f64
}

#[test]
fn recovers_all_lines_of_a_checkerboard() {
    let img = board(|c| c);
    let lines = GridDetector::default().detect(&img.view()).unwrap();
    for k in 0..9 {
        assert!(
            (lines.vertical.0[k] - expected(k)).abs() <= 1.0,
            "vertical {k}: {}",
            lines.vertical.0[k]
        );
        assert!(
            (lines.horizontal.0[k] - expected(k)).abs() <= 1.0,
            "horizontal {k}: {}",
            lines.horizontal.0[k]
        );
    }
}

#[test]
fn interpolates_one_missing_interior_line() {
    // Files 3 and 4 share a colour pattern, so the line between them has no
    // alternating transitions.
    let img = board(|c| if c >= 4 { c - 1 } else { c });
    let analysis = GridDetector::default().analyze(&img.view()).unwrap();
    let vertical = analysis.vertical.as_ref().unwrap();
    assert!(vertical.interpolated);
    assert!(!analysis.horizontal.as_ref().unwrap().interpolated);

    let lines = analysis.lines().unwrap();
    for k in 0..9 {
        assert!(
            (lines.vertical.0[k] - expected(k)).abs() <= 1.0,
            "vertical {k}: {}",
            lines.vertical.0[k]
        );
    }
}

#[test]
fn one_directional_edges_are_suppressed() {
    // Every column edge of a stripe pattern goes the same way in all rows,
    // so the positive/negative product vanishes.
    let img = GrayImage::from_fn(SIZE, SIZE, |x, _| if (x / SQUARE) % 2 == 0 { 200 } else { 60 });
    let err = GridDetector::default().detect(&img.view()).unwrap_err();
    assert_eq!(err, GridError::GridNotFound { axis: Axis::X });
}

#[test]
fn detection_in_a_located_screenshot_region() {
    // Board at (60, 40) with a sidebar panel to its right.
    let (bx, by) = (60usize, 40usize);
    let shot = GrayImage::from_fn(700, 480, |x, y| {
        let bxr = x.wrapping_sub(bx);
        let byr = y.wrapping_sub(by);
        if bxr < 400 && byr < 400 {
            if (bxr / SQUARE + byr / SQUARE) % 2 == 0 {
                180
            } else {
                110
            }
        } else if (520..680).contains(&x) && (20..460).contains(&y) {
            70
        } else {
            30
        }
    });

    let located = RegionLocator::default().locate(&shot.view()).unwrap();
    let r = located.region;
    assert!(r.x <= bx && r.y <= by, "{r:?}");
    assert!(r.right() >= bx + 400 && r.bottom() >= by + 400, "{r:?}");
    assert!(r.right() < 520);

    let crop = shot.view().crop(&r);
    let lines = GridDetector::new(GridParams::default())
        .detect(&crop.view())
        .unwrap()
        .offset(r.x as f64, r.y as f64);
    for k in 0..9 {
        assert!((lines.vertical.0[k] - (bx + k * SQUARE) as f64).abs() <= 1.0);
        assert!((lines.horizontal.0[k] - (by + k * SQUARE) as f64).abs() <= 1.0);
    }

    let color = RgbImage::from_fn(700, 480, |x, y| {
        let v = shot.get(x as usize, y as usize);
        Rgb([v, v, v])
    });
    let local = lines.offset(-(r.x as f64), -(r.y as f64));
    let squares = extract_squares(&color, &r, &local, &SquareParams::default()).unwrap();
    assert_eq!(squares.len(), 64);
    let a8 = squares.get(0, 0).unwrap();
    assert_eq!(a8.image.get_pixel(20, 20), &Rgb([180, 180, 180]));
    let b8 = squares.get(0, 1).unwrap();
    assert_eq!(b8.image.get_pixel(20, 20), &Rgb([110, 110, 110]));
}
