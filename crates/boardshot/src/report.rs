//! Position assembly and confidence reporting.

use boardshot_classify::Classification;
use boardshot_fen::{FenError, Perspective, Position};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Confidence policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    /// A board is "high confidence" when every square reaches this.
    pub advisory: f64,
    /// Squares below this are listed for manual verification.
    pub alert: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            advisory: 0.90,
            alert: 0.70,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceThresholds {
    pub fn band(&self, confidence: f64) -> ConfidenceBand {
        if confidence >= self.advisory {
            ConfidenceBand::High
        } else if confidence >= self.alert {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// A square worth a second look.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SquareAlert {
    pub row: usize,
    pub col: usize,
    /// Algebraic name under the declared perspective, e.g. `"e4"`.
    pub square: String,
    /// FEN letter or `"empty"`.
    pub piece: String,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    /// Mean over all 64 squares.
    pub mean: f64,
    pub min: f64,
    /// Squares below the advisory threshold.
    pub uncertain: Vec<SquareAlert>,
    /// Squares below the alert threshold.
    pub alerts: Vec<SquareAlert>,
    pub thresholds: ConfidenceThresholds,
}

impl ConfidenceSummary {
    pub fn high_confidence(&self) -> bool {
        self.min >= self.thresholds.advisory
    }
}

/// Fold 64 row-major classifications into a position and its confidence
/// summary.
pub fn assemble(
    classifications: &[Classification],
    thresholds: ConfidenceThresholds,
    perspective: Perspective,
) -> Result<(Position, ConfidenceSummary), FenError> {
    let position = Position::from_classes(classifications.iter().map(|c| c.class))?;
    Ok((position, summarize(classifications, thresholds, perspective)))
}

/// Confidence statistics of row-major classifications. Square names depend
/// on `perspective`.
pub fn summarize(
    classifications: &[Classification],
    thresholds: ConfidenceThresholds,
    perspective: Perspective,
) -> ConfidenceSummary {
    let n = classifications.len().max(1) as f64;
    let mean = classifications.iter().map(|c| c.confidence).sum::<f64>() / n;
    let min = classifications
        .iter()
        .map(|c| c.confidence)
        .fold(f64::INFINITY, f64::min);

    let below = |limit: f64| -> Vec<SquareAlert> {
        classifications
            .iter()
            .enumerate()
            .filter(|(_, c)| c.confidence < limit)
            .map(|(i, c)| SquareAlert {
                row: i / 8,
                col: i % 8,
                square: perspective.square_name(i / 8, i % 8),
                piece: c.class.label().to_owned(),
                confidence: c.confidence,
            })
            .collect()
    };

    ConfidenceSummary {
        mean,
        min,
        uncertain: below(thresholds.advisory),
        alerts: below(thresholds.alert),
        thresholds,
    }
}

/// Confidence statistics plus the annotated overlay of one run.
#[derive(Clone, Debug)]
pub struct DetectionReport {
    pub summary: ConfidenceSummary,
    pub annotated: RgbImage,
}
