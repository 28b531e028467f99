use boardshot_core::Axis;
use serde::{Deserialize, Serialize};

/// Nine increasing boundary coordinates along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisLines(pub [f64; 9]);

impl AxisLines {
    /// Lines `origin + step * k` for `k = 0..=8`.
    pub fn from_origin_step(origin: f64, step: f64) -> Self {
        Self(std::array::from_fn(|k| origin + step * k as f64))
    }

    /// Mean spacing.
    pub fn step(&self) -> f64 {
        (self.0[8] - self.0[0]) / 8.0
    }

    pub fn is_increasing(&self) -> bool {
        self.0.windows(2).all(|w| w[1] > w[0])
    }

    /// Every gap lies within `tol_frac` of the mean spacing.
    pub fn is_evenly_spaced(&self, tol_frac: f64) -> bool {
        let step = self.step();
        step > 0.0
            && self
                .0
                .windows(2)
                .all(|w| ((w[1] - w[0]) - step).abs() <= tol_frac * step)
    }

    pub fn first(&self) -> f64 {
        self.0[0]
    }

    pub fn last(&self) -> f64 {
        self.0[8]
    }

    pub fn shifted(&self, offset: f64) -> Self {
        Self(self.0.map(|v| v + offset))
    }
}

/// Grid geometry: `vertical` holds x coordinates, `horizontal` y coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLines {
    pub vertical: AxisLines,
    pub horizontal: AxisLines,
}

impl GridLines {
    pub fn axis(&self, axis: Axis) -> &AxisLines {
        match axis {
            Axis::X => &self.vertical,
            Axis::Y => &self.horizontal,
        }
    }

    /// Cell bounds `(x0, y0, x1, y1)` for `row`, `col` in `0..8`.
    pub fn cell(&self, row: usize, col: usize) -> (f64, f64, f64, f64) {
        (
            self.vertical.0[col],
            self.horizontal.0[row],
            self.vertical.0[col + 1],
            self.horizontal.0[row + 1],
        )
    }

    /// Translate into a parent frame.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            vertical: self.vertical.shifted(dx),
            horizontal: self.horizontal.shifted(dy),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.vertical.is_increasing() && self.horizontal.is_increasing()
    }
}

/// Per-axis outcome of the threshold ladder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisDetection {
    pub axis: Axis,
    pub lines: AxisLines,
    /// Accepted threshold level (1-based).
    pub level: usize,
    /// The 7 interior peak positions the fit was computed from.
    pub interior: Vec<f64>,
    /// One interior line was interpolated over a double gap.
    pub interpolated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_step_lines_are_even() {
        let lines = AxisLines::from_origin_step(10.0, 25.0);
        assert_eq!(lines.first(), 10.0);
        assert_eq!(lines.last(), 210.0);
        assert!(lines.is_increasing());
        assert!(lines.is_evenly_spaced(0.01));
    }

    #[test]
    fn uneven_lines_are_flagged() {
        let mut lines = AxisLines::from_origin_step(0.0, 10.0);
        lines.0[4] += 3.0;
        assert!(!lines.is_evenly_spaced(0.06));
        assert!(lines.is_increasing());
    }
}
