//! Probability-averaging ensemble.

use std::sync::Arc;

use boardshot_core::{SquareClass, NUM_CLASSES};
use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{ClassProbabilities, ClassifyError, EnsembleWeights, SoftmaxModel, TileClassifier};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Tolerance on `Σp = 1` for member outputs.
const DISTRIBUTION_TOL: f64 = 1e-3;

/// Final class of one tile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub class: SquareClass,
    /// Averaged probability of `class`.
    pub confidence: f64,
    /// Averaged distribution over all classes.
    pub probabilities: ClassProbabilities,
}

/// Average the members' distributions tile by tile and take the arg-max.
///
/// `per_member[m][t]` is member `m`'s distribution for tile `t`; every
/// member must cover the same tiles. Ties go to the lowest class index.
pub fn combine(per_member: &[Vec<ClassProbabilities>]) -> Vec<Classification> {
    let Some(first) = per_member.first() else {
        return Vec::new();
    };
    let n = per_member.len() as f64;
    (0..first.len())
        .map(|t| {
            let mut mean = [0.0; NUM_CLASSES];
            for member in per_member {
                for (acc, p) in mean.iter_mut().zip(&member[t]) {
                    *acc += p;
                }
            }
            mean.iter_mut().for_each(|v| *v /= n);

            let mut best = 0;
            for c in 1..NUM_CLASSES {
                if mean[c] > mean[best] {
                    best = c;
                }
            }
            Classification {
                class: SquareClass::from_index(best).unwrap_or_default(),
                confidence: mean[best],
                probabilities: mean,
            }
        })
        .collect()
}

fn is_distribution(p: &ClassProbabilities) -> bool {
    p.iter().all(|v| v.is_finite() && *v >= 0.0)
        && (p.iter().sum::<f64>() - 1.0).abs() <= DISTRIBUTION_TOL
}

/// Independently trained classifiers combined by probability averaging.
///
/// Members are immutable and shared; cloning an ensemble is cheap.
#[derive(Clone)]
pub struct Ensemble {
    members: Vec<Arc<dyn TileClassifier>>,
}

impl std::fmt::Debug for Ensemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ensemble")
            .field("members", &self.member_names())
            .finish()
    }
}

impl Ensemble {
    pub fn new(members: Vec<Arc<dyn TileClassifier>>) -> Result<Self, ClassifyError> {
        if members.is_empty() {
            return Err(ClassifyError::EmptyEnsemble);
        }
        Ok(Self { members })
    }

    /// Build softmax members from serialised weights.
    pub fn from_weights(weights: &EnsembleWeights) -> Result<Self, ClassifyError> {
        let members = weights
            .members
            .iter()
            .map(|w| SoftmaxModel::from_weights(w).map(|m| Arc::new(m) as Arc<dyn TileClassifier>))
            .collect::<Result<Vec<_>, _>>()?;
        let ensemble = Self::new(members)?;
        log::info!("loaded ensemble of {} models", ensemble.len());
        Ok(ensemble)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }

    /// Run every member on the same tiles in parallel, wait for all of them,
    /// then average.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, tiles), fields(members = self.members.len(), tiles = tiles.len()))
    )]
    pub fn classify(&self, tiles: &[RgbImage]) -> Result<Vec<Classification>, ClassifyError> {
        let outputs = self
            .members
            .par_iter()
            .map(|member| {
                let out = member.predict(tiles)?;
                if out.len() != tiles.len() {
                    return Err(ClassifyError::MemberOutput {
                        member: member.name().to_owned(),
                        expected: tiles.len(),
                        got: out.len(),
                    });
                }
                if let Some(tile) = out.iter().position(|p| !is_distribution(p)) {
                    return Err(ClassifyError::InvalidDistribution {
                        member: member.name().to_owned(),
                        tile,
                    });
                }
                log::debug!("member {} classified {} tiles", member.name(), tiles.len());
                Ok(out)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(combine(&outputs))
    }
}
