//! JSON configuration and report helpers for the command-line runner.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use boardshot_classify::{ClassifyError, Ensemble, EnsembleWeights};
use boardshot_core::Region;
use boardshot_fen::GameState;
use boardshot_grid::{AxisSummary, GridLines, LocatedRegion};
use serde::{Deserialize, Serialize};

use crate::{ErrorKind, Pipeline, PipelineError, PipelineOutput, PipelineParams, PredictionResponse};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration of one screenshot run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardshotConfig {
    pub image_path: String,
    /// JSON file with [`EnsembleWeights`].
    pub models_path: String,
    #[serde(default)]
    pub state: GameState,
    #[serde(default)]
    pub report_path: Option<String>,
    #[serde(default)]
    pub annotated_path: Option<String>,
    /// Write one PNG per diagnostic stage into this directory.
    #[serde(default)]
    pub stages_dir: Option<String>,
    #[serde(default)]
    pub pipeline: PipelineParams,
}

impl BoardshotConfig {
    pub fn new(image_path: impl Into<String>, models_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            models_path: models_path.into(),
            state: GameState::default(),
            report_path: None,
            annotated_path: None,
            stages_dir: None,
            pipeline: PipelineParams::default(),
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output report path.
    pub fn report_path(&self) -> PathBuf {
        self.report_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("boardshot_report.json"))
    }

    /// Load and validate the model weights.
    pub fn load_ensemble(&self) -> Result<Ensemble, ClassifyError> {
        EnsembleWeights::load_json(&self.models_path)?.build()
    }

    pub fn build_pipeline(&self, ensemble: Arc<Ensemble>) -> Pipeline {
        Pipeline::new(self.pipeline.clone(), ensemble)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectReport {
    pub image_path: String,
    pub models_path: String,
    pub models: Vec<String>,
    pub state: GameState,
    #[serde(default)]
    pub response: Option<PredictionResponse>,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub located: Option<LocatedRegion>,
    #[serde(default)]
    pub grid: Option<GridLines>,
    #[serde(default)]
    pub axes: Vec<AxisSummary>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_kind: Option<ErrorKind>,
    #[serde(default)]
    pub retryable: bool,
}

impl DetectReport {
    /// Build a base report from the input config and the loaded ensemble.
    pub fn new(cfg: &BoardshotConfig, ensemble: &Ensemble) -> Self {
        Self {
            image_path: cfg.image_path.clone(),
            models_path: cfg.models_path.clone(),
            models: ensemble.member_names().into_iter().map(str::to_owned).collect(),
            state: cfg.state,
            response: None,
            region: None,
            located: None,
            grid: None,
            axes: Vec::new(),
            error: None,
            error_kind: None,
            retryable: false,
        }
    }

    /// Populate report fields from a successful run.
    pub fn set_output(&mut self, out: &PipelineOutput) {
        self.state = out.state;
        self.response = Some(out.response());
        self.region = Some(out.region);
        self.located = out.located;
        self.grid = Some(out.grid);
        self.axes = out.axes.to_vec();
        self.error = None;
        self.error_kind = None;
        self.retryable = false;
    }

    /// Record a pipeline error.
    pub fn set_error(&mut self, err: &PipelineError) {
        self.error = Some(err.to_string());
        self.error_kind = Some(err.kind());
        self.retryable = err.is_retryable();
        self.region = err.region().or(self.region);
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
