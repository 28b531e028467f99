//! Tile classifiers.

use boardshot_core::{SquareClass, NUM_CLASSES};
use image::RgbImage;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::{tile_features, ClassifyError};

/// Probability of each class, indexed by [`SquareClass::index`].
pub type ClassProbabilities = [f64; NUM_CLASSES];

/// A model mapping tiles to class distributions.
///
/// Implementations are shared read-only between concurrent requests.
pub trait TileClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// One distribution per tile, in tile order.
    fn predict(&self, tiles: &[RgbImage]) -> Result<Vec<ClassProbabilities>, ClassifyError>;
}

fn default_temperature() -> f64 {
    1.0
}

/// One softmax output unit and the class it votes for.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputUnit {
    pub class: SquareClass,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
}

/// Serialised weights of a [`SoftmaxModel`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelWeights {
    pub name: String,
    /// Tiles are resampled to `input_size × input_size` luma features.
    pub input_size: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    pub units: Vec<OutputUnit>,
    /// Per-class log priors added to the logits of every unit of that class.
    #[serde(default)]
    pub class_log_priors: Option<Vec<f64>>,
}

/// Linear softmax classifier over downsampled luma features.
///
/// Several units may carry the same class (e.g. one per square colour);
/// a class's probability is the sum over its units.
#[derive(Clone, Debug)]
pub struct SoftmaxModel {
    name: String,
    input_size: u32,
    temperature: f64,
    weights: DMatrix<f64>,
    bias: DVector<f64>,
    unit_class: Vec<usize>,
}

impl SoftmaxModel {
    pub fn from_weights(w: &ModelWeights) -> Result<Self, ClassifyError> {
        let invalid = |reason: String| ClassifyError::InvalidWeights {
            model: w.name.clone(),
            reason,
        };
        if w.input_size == 0 {
            return Err(invalid("input_size must be positive".into()));
        }
        if w.units.is_empty() {
            return Err(invalid("no output units".into()));
        }
        if !(w.temperature.is_finite() && w.temperature > 0.0) {
            return Err(invalid(format!("temperature {} is not positive", w.temperature)));
        }
        let n_features = (w.input_size * w.input_size) as usize;
        if let Some(unit) = w.units.iter().find(|u| u.weights.len() != n_features) {
            return Err(ClassifyError::FeatureSize {
                model: w.name.clone(),
                expected: n_features,
                got: unit.weights.len(),
            });
        }
        if let Some(priors) = &w.class_log_priors {
            if priors.len() != NUM_CLASSES {
                return Err(invalid(format!(
                    "{} class priors, expected {NUM_CLASSES}",
                    priors.len()
                )));
            }
        }

        let weights = DMatrix::from_fn(w.units.len(), n_features, |r, c| w.units[r].weights[c]);
        let priors = w.class_log_priors.as_deref();
        let bias = DVector::from_iterator(
            w.units.len(),
            w.units
                .iter()
                .map(|u| u.bias + priors.map_or(0.0, |p| p[u.class.index()])),
        );
        Ok(Self {
            name: w.name.clone(),
            input_size: w.input_size,
            temperature: w.temperature,
            weights,
            bias,
            unit_class: w.units.iter().map(|u| u.class.index()).collect(),
        })
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    /// Class distribution of one feature vector.
    pub fn predict_features(&self, x: &DVector<f64>) -> Result<ClassProbabilities, ClassifyError> {
        if x.len() != self.weights.ncols() {
            return Err(ClassifyError::FeatureSize {
                model: self.name.clone(),
                expected: self.weights.ncols(),
                got: x.len(),
            });
        }
        let logits = (&self.weights * x + &self.bias) / self.temperature;
        let max = logits.max();
        let exp = logits.map(|v| (v - max).exp());
        let sum = exp.sum();

        let mut probs = [0.0; NUM_CLASSES];
        for (unit, &class) in self.unit_class.iter().enumerate() {
            probs[class] += exp[unit] / sum;
        }
        Ok(probs)
    }
}

impl TileClassifier for SoftmaxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, tiles: &[RgbImage]) -> Result<Vec<ClassProbabilities>, ClassifyError> {
        tiles
            .iter()
            .map(|t| self.predict_features(&tile_features(t, self.input_size)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn weights(units: Vec<OutputUnit>) -> ModelWeights {
        ModelWeights {
            name: "m".into(),
            input_size: 1,
            temperature: 1.0,
            units,
            class_log_priors: None,
        }
    }

    fn unit(label: &str, w: f64, bias: f64) -> OutputUnit {
        OutputUnit {
            class: label.parse().unwrap(),
            weights: vec![w],
            bias,
        }
    }

    #[test]
    fn units_of_one_class_are_summed() {
        let model = SoftmaxModel::from_weights(&weights(vec![
            unit("empty", 0.0, 0.0),
            unit("empty", 0.0, 0.0),
            unit("P", 0.0, 0.0),
            unit("p", 0.0, 0.0),
        ]))
        .unwrap();
        let probs = model.predict_features(&DVector::from_element(1, 0.5)).unwrap();
        assert_relative_eq!(probs[SquareClass::Empty.index()], 0.5, epsilon = 1e-12);
        assert_relative_eq!(probs[6], 0.25, epsilon = 1e-12);
        assert_relative_eq!(probs[0], 0.25, epsilon = 1e-12);
        assert_relative_eq!(probs.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn priors_shift_logits_per_class() {
        let mut w = weights(vec![unit("empty", 0.0, 0.0), unit("K", 0.0, 0.0)]);
        let mut priors = vec![0.0; NUM_CLASSES];
        priors[SquareClass::Empty.index()] = (3.0f64).ln();
        w.class_log_priors = Some(priors);
        let model = SoftmaxModel::from_weights(&w).unwrap();
        let probs = model.predict_features(&DVector::from_element(1, 1.0)).unwrap();
        assert_relative_eq!(probs[SquareClass::Empty.index()], 0.75, epsilon = 1e-12);
    }

    #[test]
    fn mismatched_weights_are_rejected() {
        let mut w = weights(vec![unit("empty", 0.0, 0.0)]);
        w.units[0].weights.push(1.0);
        assert!(matches!(
            SoftmaxModel::from_weights(&w),
            Err(ClassifyError::FeatureSize { expected: 1, got: 2, .. })
        ));
        let mut w = weights(vec![unit("empty", 0.0, 0.0)]);
        w.temperature = 0.0;
        assert!(matches!(
            SoftmaxModel::from_weights(&w),
            Err(ClassifyError::InvalidWeights { .. })
        ));
    }
}
