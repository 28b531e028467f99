//! Contour hierarchy of a binary image, expressed as connected components.
//!
//! Foreground components (8-connected) play the role of outer contours and
//! background components (4-connected) that do not touch the image border
//! play the role of holes. A component nested inside a hole is a child of
//! that hole.

use boardshot_core::{GrayImage, Region};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Retrieval {
    /// Only top-level foreground components.
    External,
    /// Every foreground component and every hole.
    Tree,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Contour {
    pub bbox: Region,
    /// Enclosed area: own pixels plus everything nested inside.
    pub area: usize,
    pub is_hole: bool,
    pub depth: usize,
}

struct Node {
    bbox: Region,
    pixels: usize,
    first: usize,
    is_hole: bool,
    touches_border: bool,
    parent: Option<usize>,
}

const NONE: u32 = u32::MAX;

/// Flood-fill every component of pixels with `fg == foreground`, writing
/// node indices into `labels`.
fn label_components(
    img: &GrayImage,
    foreground: bool,
    labels: &mut [u32],
    nodes: &mut Vec<Node>,
) {
    let (w, h) = (img.width, img.height);
    let is_member = |i: usize| (img.data[i] > 0) == foreground;
    let mut stack = Vec::new();

    for start in 0..w * h {
        if labels[start] != NONE || !is_member(start) {
            continue;
        }
        let id = nodes.len() as u32;
        let (mut x0, mut y0, mut x1, mut y1) = (usize::MAX, usize::MAX, 0, 0);
        let mut pixels = 0;
        let mut touches_border = false;

        labels[start] = id;
        stack.push(start);
        while let Some(i) = stack.pop() {
            let (x, y) = (i % w, i / w);
            pixels += 1;
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
            touches_border |= x == 0 || y == 0 || x + 1 == w || y + 1 == h;

            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    if (dx == 0 && dy == 0) || (!foreground && dx != 0 && dy != 0) {
                        continue;
                    }
                    let nx = x as isize + dx;
                    let ny = y as isize + dy;
                    if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                        continue;
                    }
                    let j = ny as usize * w + nx as usize;
                    if labels[j] == NONE && is_member(j) {
                        labels[j] = id;
                        stack.push(j);
                    }
                }
            }
        }

        nodes.push(Node {
            bbox: Region::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1),
            pixels,
            first: start,
            is_hole: !foreground,
            touches_border,
            parent: None,
        });
    }
}

/// Contours sorted by enclosed area, largest first.
pub(crate) fn find_contours(img: &GrayImage, retrieval: Retrieval) -> Vec<Contour> {
    let (w, h) = (img.width, img.height);
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let mut fg_labels = vec![NONE; w * h];
    let mut bg_labels = vec![NONE; w * h];
    let mut nodes = Vec::new();
    label_components(img, true, &mut fg_labels, &mut nodes);
    label_components(img, false, &mut bg_labels, &mut nodes);

    // The pixel above a component's first (raster-order) pixel belongs to
    // the component that immediately encloses it.
    for node in nodes.iter_mut() {
        if node.first < w {
            continue;
        }
        let above = node.first - w;
        node.parent = if node.is_hole {
            Some(fg_labels[above] as usize)
        } else {
            let hole = bg_labels[above] as usize;
            Some(hole)
        };
    }
    for i in 0..nodes.len() {
        if let Some(p) = nodes[i].parent {
            if !nodes[p].is_hole || !nodes[p].touches_border {
                continue;
            }
            nodes[i].parent = None;
        }
    }

    // Parents always start earlier in raster order than their children.
    let mut order: Vec<usize> = (0..nodes.len())
        .filter(|&i| !(nodes[i].is_hole && nodes[i].touches_border))
        .collect();
    order.sort_by_key(|&i| nodes[i].first);

    let mut depth = vec![0usize; nodes.len()];
    for &i in &order {
        if let Some(p) = nodes[i].parent {
            depth[i] = depth[p] + 1;
        }
    }
    let mut area: Vec<usize> = nodes.iter().map(|n| n.pixels).collect();
    for &i in order.iter().rev() {
        if let Some(p) = nodes[i].parent {
            area[p] += area[i];
        }
    }

    let mut contours: Vec<Contour> = order
        .into_iter()
        .filter(|&i| match retrieval {
            Retrieval::External => !nodes[i].is_hole && nodes[i].parent.is_none(),
            Retrieval::Tree => true,
        })
        .map(|i| Contour {
            bbox: nodes[i].bbox,
            area: area[i],
            is_hole: nodes[i].is_hole,
            depth: depth[i],
        })
        .collect();
    contours.sort_by(|a, b| b.area.cmp(&a.area));
    contours
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Square ring with a filled square inside its hole.
    fn nested() -> GrayImage {
        GrayImage::from_fn(40, 40, |x, y| {
            let ring = (5..35).contains(&x)
                && (5..35).contains(&y)
                && !((8..32).contains(&x) && (8..32).contains(&y));
            let inner = (15..25).contains(&x) && (15..25).contains(&y);
            if ring || inner {
                255
            } else {
                0
            }
        })
    }

    #[test]
    fn external_ignores_nested_components() {
        let contours = find_contours(&nested(), Retrieval::External);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bbox, Region::new(5, 5, 30, 30));
        assert_eq!(contours[0].area, 30 * 30);
    }

    #[test]
    fn tree_lists_holes_and_children() {
        let contours = find_contours(&nested(), Retrieval::Tree);
        assert_eq!(contours.len(), 3);
        let hole = contours.iter().find(|c| c.is_hole).unwrap();
        assert_eq!(hole.bbox, Region::new(8, 8, 24, 24));
        assert_eq!(hole.depth, 1);
        let inner = contours
            .iter()
            .find(|c| c.bbox == Region::new(15, 15, 10, 10))
            .unwrap();
        assert_eq!(inner.depth, 2);
        assert_eq!(inner.area, 100);
    }

    #[test]
    fn diagonal_pixels_join_foreground() {
        let img = GrayImage::from_fn(6, 6, |x, y| if x == y { 255 } else { 0 });
        let contours = find_contours(&img, Retrieval::External);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area, 6);
    }
}
