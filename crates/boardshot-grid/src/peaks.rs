//! 1D peak analysis on projected gradient signals.

use crate::{AxisLines, GridParams};
use boardshot_core::convolve_same;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Peak {
    /// Boundary coordinate (sample `i` spans `[i, i + 1)`).
    pub pos: f64,
    /// Raw signal value at the peak sample.
    pub strength: f64,
}

/// Seven interior grid lines along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Interior {
    pub positions: [f64; 7],
    pub interpolated: bool,
}

impl Interior {
    pub fn step(&self) -> f64 {
        (self.positions[6] - self.positions[0]) / 6.0
    }
}

/// Binarise at `threshold`, smooth with `kernel` and keep local maxima.
///
/// Flat tops are collapsed to their centre; isolated maxima are refined with
/// a parabola through the three neighbouring samples.
pub(crate) fn find_peaks(signal: &[f64], threshold: f64, kernel: &[f64]) -> Vec<Peak> {
    let binary: Vec<f64> = signal
        .iter()
        .map(|&v| if v > threshold { 1.0 } else { 0.0 })
        .collect();
    let smooth = convolve_same(&binary, kernel);

    let n = smooth.len();
    let max = smooth.iter().copied().fold(0.0f64, f64::max);
    if max <= 0.0 {
        return Vec::new();
    }
    let eps = max * 1e-9;

    let mut peaks = Vec::new();
    let mut i = 0;
    while i < n {
        let v = smooth[i];
        if v <= eps {
            i += 1;
            continue;
        }
        let mut j = i;
        while j + 1 < n && (smooth[j + 1] - v).abs() <= eps {
            j += 1;
        }
        let rises = i == 0 || smooth[i - 1] < v - eps;
        let falls = j + 1 == n || smooth[j + 1] < v - eps;
        if rises && falls {
            let mut centre = (i + j) as f64 / 2.0;
            if i == j && i > 0 && j + 1 < n {
                let (l, r) = (smooth[i - 1], smooth[i + 1]);
                let denom = l - 2.0 * v + r;
                if denom < 0.0 {
                    centre += (0.5 * (l - r) / denom).clamp(-0.5, 0.5);
                }
            }
            let idx = (centre.round() as usize).min(n - 1);
            peaks.push(Peak {
                pos: centre + 0.5,
                strength: signal[idx],
            });
        }
        i = j + 1;
    }
    peaks
}

/// Drop peaks within `margin` of either end of an axis of length `len`.
pub(crate) fn prune_margin(peaks: &[Peak], len: f64, margin: f64) -> Vec<Peak> {
    peaks
        .iter()
        .copied()
        .filter(|p| p.pos > margin && p.pos < len - margin)
        .collect()
}

/// Maximal runs of consecutive peaks whose gaps match the run's first gap.
fn equal_spacing_runs(pos: &[f64], params: &GridParams) -> Vec<std::ops::Range<usize>> {
    let n = pos.len();
    let mut runs = Vec::new();
    let mut start = 0;
    while start + 1 < n {
        let reference = pos[start + 1] - pos[start];
        let tol = params.spacing_tol(reference);
        let mut end = start + 2;
        while end < n && ((pos[end] - pos[end - 1]) - reference).abs() < tol {
            end += 1;
        }
        runs.push(start..end);
        start = end - 1;
    }
    runs
}

fn mean_step(pos: &[f64]) -> f64 {
    (pos[pos.len() - 1] - pos[0]) / (pos.len() - 1) as f64
}

fn to_interior(pos: &[f64]) -> Option<[f64; 7]> {
    pos.try_into().ok()
}

/// Both extrapolated borders of an interior set lie on the axis.
fn borders_on_axis(interior: &[f64; 7], len: f64, params: &GridParams) -> bool {
    let step = mean_step(interior);
    let tol = params.spacing_tol(step);
    step >= params.min_step_px && interior[0] - step >= -tol && interior[6] + step <= len + tol
}

/// Pick the seven interior lines out of a set of peaks on an axis of
/// length `len`.
///
/// A run of 7 equally spaced peaks is the interior set. A run of 9 also
/// contains both borders, a run of 8 contains one border. When no run
/// qualifies, a single missing line may be interpolated over a double gap.
pub(crate) fn select_interior(peaks: &[Peak], len: f64, params: &GridParams) -> Option<Interior> {
    let pos: Vec<f64> = peaks.iter().map(|p| p.pos).collect();

    let mut best: Option<([f64; 7], f64)> = None;
    for run in equal_spacing_runs(&pos, params) {
        let interior = match run.len() {
            7 => run.clone(),
            9 => run.start + 1..run.end - 1,
            8 => {
                let step = mean_step(&pos[run.clone()]);
                let tol = params.spacing_tol(step);
                let drop_first_ok = pos[run.end - 1] + step <= len + tol;
                let drop_last_ok = pos[run.start] - step >= -tol;
                let drop_first = match (drop_first_ok, drop_last_ok) {
                    (true, false) => true,
                    (false, true) => false,
                    (true, true) => peaks[run.start].strength <= peaks[run.end - 1].strength,
                    (false, false) => continue,
                };
                if drop_first {
                    run.start + 1..run.end
                } else {
                    run.start..run.end - 1
                }
            }
            _ => continue,
        };
        let Some(positions) = to_interior(&pos[interior.clone()]) else {
            continue;
        };
        if !borders_on_axis(&positions, len, params) {
            continue;
        }
        let strength =
            peaks[interior.clone()].iter().map(|p| p.strength).sum::<f64>() / 7.0;
        if best.map_or(true, |(_, s)| strength > s) {
            best = Some((positions, strength));
        }
    }

    if let Some((positions, _)) = best {
        return Some(Interior {
            positions,
            interpolated: false,
        });
    }
    fill_missing(&pos, len, params).map(|positions| Interior {
        positions,
        interpolated: true,
    })
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    })
}

/// Insert one line into a window of six peaks with four regular gaps and
/// one double gap.
pub(crate) fn fill_missing(pos: &[f64], len: f64, params: &GridParams) -> Option<[f64; 7]> {
    for window in pos.windows(6) {
        let gaps: Vec<f64> = window.windows(2).map(|w| w[1] - w[0]).collect();
        let Some(med) = median(&mut gaps.clone()) else {
            continue;
        };
        let mut regular: Vec<f64> = gaps.iter().copied().filter(|&g| g < 1.5 * med).collect();
        let Some(step) = median(&mut regular) else {
            continue;
        };
        if step < params.min_step_px {
            continue;
        }

        let consistent = gaps
            .iter()
            .filter(|&&g| (g - step).abs() < params.fill_step_tol_frac * step)
            .count();
        let doubles: Vec<usize> = gaps
            .iter()
            .enumerate()
            .filter(|&(_, &g)| (g - 2.0 * step).abs() < params.fill_double_tol_frac * step)
            .map(|(i, _)| i)
            .collect();
        if consistent != 4 || doubles.len() != 1 {
            continue;
        }

        let d = doubles[0];
        let mut filled = Vec::with_capacity(7);
        filled.extend_from_slice(&window[..=d]);
        filled.push(0.5 * (window[d] + window[d + 1]));
        filled.extend_from_slice(&window[d + 1..]);
        match to_interior(&filled) {
            Some(interior) if borders_on_axis(&interior, len, params) => return Some(interior),
            _ => continue,
        }
    }
    None
}

/// Least-squares fit `pos = origin + step * k` over the interior lines
/// (`k = 1..=7`), extended to both borders.
pub(crate) fn fit_lines(interior: &[f64; 7]) -> AxisLines {
    let k_mean = 4.0;
    let p_mean = interior.iter().sum::<f64>() / 7.0;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &p) in interior.iter().enumerate() {
        let dk = (i + 1) as f64 - k_mean;
        num += dk * (p - p_mean);
        den += dk * dk;
    }
    let step = num / den;
    AxisLines::from_origin_step(p_mean - step * k_mean, step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use boardshot_core::gaussian_kernel;

    fn peaks_at(pos: &[f64]) -> Vec<Peak> {
        pos.iter()
            .map(|&p| Peak {
                pos: p,
                strength: 1.0,
            })
            .collect()
    }

    #[test]
    fn symmetric_plateau_resolves_to_boundary() {
        // Bump symmetric about sample 19.5, i.e. boundary coordinate 20.
        let mut signal = vec![0.0; 60];
        for (i, v) in signal.iter_mut().enumerate().take(24).skip(16) {
            *v = 1.0 + (i as f64 - 19.5).abs().recip();
        }
        let peaks = find_peaks(&signal, 0.5, &gaussian_kernel(21, 8.0));
        assert_eq!(peaks.len(), 1);
        assert_relative_eq!(peaks[0].pos, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn seven_run_is_interior() {
        let pos: Vec<f64> = (1..=7).map(|k| 30.0 + 50.0 * k as f64).collect();
        let got = select_interior(&peaks_at(&pos), 460.0, &GridParams::default()).unwrap();
        assert!(!got.interpolated);
        assert_eq!(got.positions.to_vec(), pos);
    }

    #[test]
    fn nine_run_drops_borders() {
        let pos: Vec<f64> = (0..=8).map(|k| 30.0 + 50.0 * k as f64).collect();
        let got = select_interior(&peaks_at(&pos), 460.0, &GridParams::default()).unwrap();
        assert_eq!(got.positions.to_vec(), pos[1..8].to_vec());
    }

    #[test]
    fn eight_run_drops_the_border_whose_partner_is_outside() {
        // Left border at 30 detected, right border at 430 missed. Reading
        // the last peak as a border would put the other one at -20.
        let pos: Vec<f64> = (0..8).map(|k| 30.0 + 50.0 * k as f64).collect();
        let got = select_interior(&peaks_at(&pos), 435.0, &GridParams::default()).unwrap();
        assert_eq!(got.positions.to_vec(), pos[1..8].to_vec());
    }

    #[test]
    fn eight_run_with_room_for_both_borders_drops_the_weaker_end() {
        let pos: Vec<f64> = (0..8).map(|k| 60.0 + 50.0 * k as f64).collect();
        let params = GridParams::default();

        let mut peaks = peaks_at(&pos);
        peaks[0].strength = 0.4;
        let got = select_interior(&peaks, 500.0, &params).unwrap();
        assert!(!got.interpolated);
        assert_eq!(got.positions.to_vec(), pos[1..8].to_vec());

        let mut peaks = peaks_at(&pos);
        peaks[7].strength = 0.4;
        let got = select_interior(&peaks, 500.0, &params).unwrap();
        assert_eq!(got.positions.to_vec(), pos[0..7].to_vec());
    }

    #[test]
    fn steps_below_the_smoothing_resolution_are_rejected() {
        // 12 px squares: the smoothing window merges neighbouring lines.
        let pos: Vec<f64> = (1..=7).map(|k| 17.0 + 12.0 * k as f64).collect();
        let params = GridParams::default();
        assert!(params.min_step_px > 12.0);
        assert!(select_interior(&peaks_at(&pos), 130.0, &params).is_none());

        let with_gap = [29.0, 41.0, 53.0, 77.0, 89.0, 101.0];
        assert!(fill_missing(&with_gap, 130.0, &params).is_none());
    }

    #[test]
    fn spurious_peak_outside_run_is_ignored() {
        let mut pos: Vec<f64> = vec![40.0];
        pos.extend((1..=7).map(|k| 80.0 + 40.0 * k as f64));
        let got = select_interior(&peaks_at(&pos), 500.0, &GridParams::default()).unwrap();
        assert_eq!(got.positions[0], 120.0);
        assert_eq!(got.positions[6], 360.0);
    }

    #[test]
    fn double_gap_is_interpolated() {
        let pos = [100.0, 150.0, 200.0, 300.0, 350.0, 400.0];
        let got = select_interior(&peaks_at(&pos), 500.0, &GridParams::default()).unwrap();
        assert!(got.interpolated);
        assert_eq!(
            got.positions,
            [100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0]
        );
    }

    #[test]
    fn interpolation_window_excludes_borders() {
        let pos = [30.0, 80.0, 130.0, 180.0, 280.0, 330.0, 380.0, 430.0];
        let got = select_interior(&peaks_at(&pos), 460.0, &GridParams::default()).unwrap();
        assert!(got.interpolated);
        assert_eq!(got.positions[0], 80.0);
        assert_eq!(got.positions[4], 280.0);
        assert_eq!(got.positions[6], 380.0);
    }

    #[test]
    fn irregular_peaks_are_rejected() {
        let pos = [50.0, 90.0, 160.0, 200.0, 290.0, 310.0, 400.0];
        assert!(select_interior(&peaks_at(&pos), 500.0, &GridParams::default()).is_none());
    }

    #[test]
    fn margin_pruning_is_strict() {
        let peaks = peaks_at(&[10.0, 10.5, 200.0, 290.0]);
        let kept = prune_margin(&peaks, 300.0, 10.0);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].pos, 10.5);
    }

    #[test]
    fn fit_extends_by_one_step() {
        let interior = [60.0, 110.0, 160.0, 210.0, 260.0, 310.0, 360.0];
        let lines = fit_lines(&interior);
        assert_relative_eq!(lines.first(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(lines.last(), 410.0, epsilon = 1e-9);
    }
}
