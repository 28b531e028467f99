//! JSON model weights.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{ClassifyError, Ensemble, ModelWeights};

/// Weights of every ensemble member, as stored on disk.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub members: Vec<ModelWeights>,
}

impl EnsembleWeights {
    /// Load weights from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ClassifyError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write weights to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ClassifyError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Validate and build the ensemble.
    pub fn build(&self) -> Result<Ensemble, ClassifyError> {
        Ensemble::from_weights(self)
    }
}
