//! Epoch-end hooks used by the training run.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::train::{Callback, EpochReport};
use crate::{Error, Mlp, Result};

/// Saves the model whenever validation loss reaches a new minimum.
///
/// Epochs without a validation report never save.
#[derive(Debug)]
pub struct BestCheckpoint {
    path: PathBuf,
    best: f32,
    best_epoch: Option<usize>,
}

impl BestCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            best: f32::INFINITY,
            best_epoch: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowest validation loss seen so far.
    pub fn best(&self) -> f32 {
        self.best
    }

    /// Epoch of the last save.
    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }
}

impl Callback for BestCheckpoint {
    fn on_epoch_end(&mut self, report: &EpochReport, model: &Mlp) -> Result<()> {
        let Some(val) = &report.val else {
            log::warn!(
                "epoch {}: no validation loss, checkpoint skipped",
                report.epoch
            );
            return Ok(());
        };

        // NaN never compares less, so a diverged epoch is never saved.
        if val.loss < self.best {
            log::info!(
                "epoch {}: val_loss improved from {:.6} to {:.6}, saving model to {}",
                report.epoch,
                self.best,
                val.loss,
                self.path.display()
            );
            model.save_json(&self.path)?;
            self.best = val.loss;
            self.best_epoch = Some(report.epoch);
        } else {
            log::info!(
                "epoch {}: val_loss did not improve from {:.6}",
                report.epoch,
                self.best
            );
        }
        Ok(())
    }
}

/// Appends per-epoch metrics to `metrics.csv` in a run directory.
pub struct MetricsLog {
    dir: PathBuf,
    writer: csv::Writer<File>,
}

impl MetricsLog {
    /// Create `<root>/<YYYY-MM-DD-HHMMSS>` (local time) and start logging there.
    ///
    /// `names` labels the model outputs, in output order.
    pub fn new(root: impl AsRef<Path>, names: &[String]) -> Result<Self> {
        let stamp = Local::now().format("%Y-%m-%d-%H%M%S").to_string();
        Self::create_in(root.as_ref().join(stamp), names)
    }

    /// Start logging into `dir`, creating it if needed.
    pub fn create_in(dir: impl Into<PathBuf>, names: &[String]) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let path = dir.join("metrics.csv");
        let mut writer = csv::Writer::from_path(&path).map_err(|e| Error::io(&path, e.into()))?;

        let mut header = vec!["epoch".to_owned(), "loss".to_owned(), "val_loss".to_owned()];
        header.extend(names.iter().map(|n| format!("mae_{n}")));
        header.extend(names.iter().map(|n| format!("val_mae_{n}")));
        writer
            .write_record(&header)
            .and_then(|_| writer.flush().map_err(csv::Error::from))
            .map_err(|e| Error::io(&path, e.into()))?;

        log::info!("writing training metrics to {}", dir.display());
        Ok(Self { dir, writer })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Callback for MetricsLog {
    fn on_epoch_end(&mut self, report: &EpochReport, _model: &Mlp) -> Result<()> {
        let mut record = vec![report.epoch.to_string(), report.train.loss.to_string()];
        match &report.val {
            Some(val) => {
                record.push(val.loss.to_string());
                record.extend(report.train.mae.iter().map(|v| v.to_string()));
                record.extend(val.mae.iter().map(|v| v.to_string()));
            }
            None => {
                record.push(String::new());
                record.extend(report.train.mae.iter().map(|v| v.to_string()));
                record.extend(report.train.mae.iter().map(|_| String::new()));
            }
        }

        let path = self.dir.join("metrics.csv");
        self.writer
            .write_record(&record)
            .and_then(|_| self.writer.flush().map_err(csv::Error::from))
            .map_err(|e| Error::io(&path, e.into()))
    }
}
