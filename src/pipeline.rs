//! End-to-end training run: load, prepare, fit, report.

use std::fmt;

use crate::callbacks::{BestCheckpoint, MetricsLog};
use crate::config::{ConfigProvider, TrainingConfig};
use crate::data::Matrix;
use crate::io::{load_curves, load_labels};
use crate::labels::{ActiveLabels, Bounds, normalize, remove_constant_labels};
use crate::model::reflectivity_network;
use crate::train::Callback;
use crate::transform::log_transform;
use crate::{Dataset, Error, FitConfig, Result};

/// Network-ready training data.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedData {
    /// Shared q axis of every curve.
    pub q: Vec<f64>,
    /// `ln(R)`, one curve per row.
    pub inputs: Matrix,
    /// Normalized labels restricted to non-degenerate parameters.
    pub labels: ActiveLabels,
    /// Names of the retained parameters, in output order.
    pub names: Vec<String>,
    /// Bounds of the full parameter vector, before removal.
    pub bounds: Bounds,
}

/// Load the training tables named by `config` and turn them into network inputs
/// and targets.
///
/// Bounds are checked against the label column count before the curve file
/// is read.
pub fn prepare(config: &dyn ConfigProvider) -> Result<PreparedData> {
    let bounds = Bounds::from_config(config)?;
    let files = config.training_file_names();

    let labels = load_labels(&files.train_labels)?;
    bounds.check_columns(labels.num_params())?;
    let curves = load_curves(&files.train_data)?;
    log::info!(
        "loaded {} curves ({} q points) and {} label rows ({} parameters)",
        curves.num_curves(),
        curves.num_q(),
        labels.values.rows(),
        labels.num_params()
    );

    if curves.num_curves() != labels.values.rows() {
        return Err(Error::DataFormat(format!(
            "{} holds {} curves but {} holds {} label rows",
            files.train_data.display(),
            curves.num_curves(),
            files.train_labels.display(),
            labels.values.rows()
        )));
    }

    let normalized = normalize(&labels.values, &bounds)?;
    let active = remove_constant_labels(&normalized, &bounds)?;
    if active.num_params() == 0 {
        return Err(Error::InvalidConfig(
            "every parameter has min == max; nothing left to learn".to_owned(),
        ));
    }
    let names = active.names(&labels.names);
    log::info!(
        "normalized labels; {} of {} parameters retained: {}",
        active.num_params(),
        labels.num_params(),
        names.join(", ")
    );

    let inputs = log_transform(&curves.reflectivity)?;
    log::info!("log-transformed {} curves", inputs.rows());

    Ok(PreparedData {
        q: curves.q,
        inputs,
        labels: active,
        names,
        bounds,
    })
}

/// Final metrics of a run, in report order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub metrics: Vec<(String, f32)>,
}

impl TrainingSummary {
    pub fn get(&self, name: &str) -> Option<f32> {
        self.metrics
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, v)| v)
    }
}

impl fmt::Display for TrainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Train:")?;
        write!(f, "{{")?;
        for (i, (name, value)) in self.metrics.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// Prepare the data, train the network and evaluate it on the full training set.
///
/// The best model by validation loss is written to the configured model path
/// and per-epoch metrics go under `log_dir`.
pub fn run(config: &TrainingConfig) -> Result<TrainingSummary> {
    config.validate()?;
    let prepared = prepare(config)?;

    let data = Dataset::from_matrices(&prepared.inputs, &prepared.labels.values)?;
    let (train, val) = data.split_validation(config.validation_split)?;
    log::info!(
        "training on {} samples, validating on {}",
        train.len(),
        val.len()
    );

    let mut mlp = reflectivity_network(data.input_dim(), data.target_dim(), config.seed)?;
    let fit = FitConfig::reflectivity(config.number_of_epochs(), config.batch_size, config.seed);

    let mut checkpoint = BestCheckpoint::new(config.model_name());
    let mut metrics = MetricsLog::new(&config.log_dir, &prepared.names)?;
    let mut callbacks: [&mut dyn Callback; 2] = [&mut checkpoint, &mut metrics];
    let report = mlp.fit(&train, Some(&val), fit, &mut callbacks)?;

    match checkpoint.best_epoch() {
        Some(epoch) => log::info!(
            "best val_loss {:.6} at epoch {epoch} of {}",
            checkpoint.best(),
            report.epochs.len()
        ),
        None => log::warn!("validation loss never improved; no model was saved"),
    }

    let eval = mlp.evaluate(&data)?;
    let mut summary = vec![("loss".to_owned(), eval.loss)];
    summary.extend(
        prepared
            .names
            .iter()
            .zip(&eval.mae)
            .map(|(name, &mae)| (format!("mae_{name}"), mae)),
    );
    Ok(TrainingSummary { metrics: summary })
}
