//! Run configuration.
//!
//! A [`TrainingConfig`] is read once at process start and passed by reference
//! into every pipeline stage. Stages depend only on the [`ConfigProvider`]
//! contract so tests can supply bounds and paths without touching disk.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "organic.json";

/// Environment variable that overrides [`DEFAULT_CONFIG_FILE`].
pub const CONFIG_ENV_VAR: &str = "REFLECTO_CONFIG";

/// Per-parameter physical bounds for one parameter family.
///
/// `min[i]` and `max[i]` bound the `i`-th parameter of the family. The two
/// sequences must have equal length.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ParamRange {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl ParamRange {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Self {
        Self { min, max }
    }
}

/// Paths of the training and validation tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrainingFiles {
    pub train_data: PathBuf,
    pub train_labels: PathBuf,
    pub val_data: PathBuf,
    pub val_labels: PathBuf,
}

/// What the pipeline needs to know about a run.
pub trait ConfigProvider {
    fn training_file_names(&self) -> TrainingFiles;
    fn number_of_epochs(&self) -> usize;
    fn thickness(&self) -> ParamRange;
    fn roughness(&self) -> ParamRange;
    fn scattering_length_density(&self) -> ParamRange;
    /// Where the best checkpoint is written.
    fn model_name(&self) -> &Path;
}

/// File-backed configuration (JSON).
///
/// ```json
/// {
///   "files": {
///     "train_data": "data/train_curves.tsv",
///     "train_labels": "data/train_labels.tsv",
///     "val_data": "data/val_curves.tsv",
///     "val_labels": "data/val_labels.tsv"
///   },
///   "epochs": 175,
///   "thickness": { "min": [20.0, 0.0], "max": [300.0, 0.0] },
///   "roughness": { "min": [0.0, 0.0], "max": [20.0, 5.0] },
///   "scattering_length_density": { "min": [1e-6, 2e-5], "max": [1.4e-5, 2e-5] },
///   "model": "models/organic.json"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingConfig {
    pub files: TrainingFiles,
    pub epochs: usize,
    pub thickness: ParamRange,
    pub roughness: ParamRange,
    pub scattering_length_density: ParamRange,
    pub model: PathBuf,
    /// Root under which a time-stamped metrics directory is created per run.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_validation_split")]
    pub validation_split: f64,
    /// Seeds weight init and per-epoch shuffling.
    #[serde(default)]
    pub seed: u64,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./Graph")
}

fn default_batch_size() -> usize {
    128
}

fn default_validation_split() -> f64 {
    0.2
}

impl TrainingConfig {
    /// Read and validate a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidConfig(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", p.display())))
    }

    /// Resolve the config path from the environment (or the default) and load it.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        log::info!("reading config from {}", path.display());
        Self::load(path)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: TrainingConfig = serde_json::from_str(s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks that do not depend on the data files.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        if !(self.validation_split > 0.0 && self.validation_split < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "validation_split must be in (0, 1), got {}",
                self.validation_split
            )));
        }
        Ok(())
    }
}

impl ConfigProvider for TrainingConfig {
    fn training_file_names(&self) -> TrainingFiles {
        self.files.clone()
    }

    fn number_of_epochs(&self) -> usize {
        self.epochs
    }

    fn thickness(&self) -> ParamRange {
        self.thickness.clone()
    }

    fn roughness(&self) -> ParamRange {
        self.roughness.clone()
    }

    fn scattering_length_density(&self) -> ParamRange {
        self.scattering_length_density.clone()
    }

    fn model_name(&self) -> &Path {
        &self.model
    }
}
