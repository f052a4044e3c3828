//! Mini-batch training loop and evaluation.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::metrics::MaeAccumulator;
use crate::optim::Adam;
use crate::{Dataset, Error, Inputs, Mlp, Result, Trainer, loss};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Sample order within each epoch.
pub enum Shuffle {
    /// Stored order every epoch; for small hand-built models and tests.
    None,
    /// A fresh permutation every epoch, reproducible from the seed.
    Seeded(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitConfig {
    pub epochs: usize,
    pub lr: f32,
    pub batch_size: usize,
    pub shuffle: Shuffle,
    pub optimizer: Adam,
}

impl FitConfig {
    /// Hyperparameters used for reflectivity training: Adam with lr 5e-4,
    /// beta1 0.9, beta2 0.999, eps 1e-8, mini-batches of `batch_size`.
    pub fn reflectivity(epochs: usize, batch_size: usize, seed: u64) -> Self {
        Self {
            epochs,
            lr: 5e-4,
            batch_size,
            shuffle: Shuffle::Seeded(seed),
            optimizer: Adam::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be > 0".to_owned()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(Error::InvalidConfig("lr must be finite and > 0".to_owned()));
        }
        self.optimizer.validate()
    }
}

/// Loss and per-output MAE over one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    pub loss: f32,
    /// One entry per model output.
    pub mae: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Running averages over the epoch's training steps.
    pub train: EvalReport,
    /// Computed after the epoch's last update, if a validation set was given.
    pub val: Option<EvalReport>,
}

#[derive(Debug, Clone)]
pub struct FitReport {
    pub epochs: Vec<EpochReport>,
}

impl FitReport {
    pub fn final_loss(&self) -> Option<f32> {
        self.epochs.last().map(|e| e.train.loss)
    }
}

/// Hook run after every epoch (checkpointing, metrics logging).
pub trait Callback {
    fn on_epoch_end(&mut self, report: &EpochReport, model: &Mlp) -> Result<()>;
}

impl Mlp {
    /// Train on `train` with MSE + Adam, optionally evaluating `val` after each epoch.
    ///
    /// Each mini-batch gradient is the mean of the per-sample gradients.
    /// Callbacks run in order after every epoch; the first error aborts training.
    pub fn fit(
        &mut self,
        train: &Dataset,
        val: Option<&Dataset>,
        cfg: FitConfig,
        callbacks: &mut [&mut dyn Callback],
    ) -> Result<FitReport> {
        self.check_dataset(train, "train")?;
        if let Some(val) = val {
            self.check_dataset(val, "validation")?;
        }
        cfg.validate()?;

        let mut opt = cfg.optimizer.state(self)?;
        let mut trainer = Trainer::new(self);
        let mut mae = MaeAccumulator::new(self.output_dim());
        let mut order: Vec<usize> = (0..train.len()).collect();
        let mut rng = match cfg.shuffle {
            Shuffle::Seeded(seed) => Some(StdRng::seed_from_u64(seed)),
            Shuffle::None => None,
        };

        let mut epochs = Vec::with_capacity(cfg.epochs);
        for epoch in 1..=cfg.epochs {
            if let Some(rng) = rng.as_mut() {
                order.shuffle(rng);
            }

            mae.reset();
            let mut loss_sum = 0.0_f64;

            for batch in order.chunks(cfg.batch_size) {
                trainer.batch.zero();
                for &idx in batch {
                    let input = train.input(idx);
                    let target = train.target(idx);

                    self.forward(input, &mut trainer.scratch);
                    let pred = trainer.scratch.output();
                    mae.add(pred, target);

                    let l = loss::mse_backward(pred, target, trainer.grads.d_output_mut());
                    loss_sum += f64::from(l);

                    self.backward(input, &trainer.scratch, &mut trainer.grads);
                    trainer.batch.accumulate(&trainer.grads);
                }
                trainer.batch.scale(1.0 / batch.len() as f32);
                opt.step(self, &mut trainer.batch, cfg.lr);
            }

            let report = EpochReport {
                epoch,
                train: EvalReport {
                    loss: (loss_sum / train.len() as f64) as f32,
                    mae: mae.finish(),
                },
                val: val.map(|v| self.evaluate_unchecked(v)),
            };
            log::info!(
                "epoch {epoch}/{}: loss={:.6} val_loss={}",
                cfg.epochs,
                report.train.loss,
                report
                    .val
                    .as_ref()
                    .map(|v| format!("{:.6}", v.loss))
                    .unwrap_or_else(|| "NA".into())
            );

            for cb in callbacks.iter_mut() {
                cb.on_epoch_end(&report, self)?;
            }
            epochs.push(report);
        }

        Ok(FitReport { epochs })
    }

    /// Mean MSE and per-output MAE over `data`.
    pub fn evaluate(&self, data: &Dataset) -> Result<EvalReport> {
        self.check_dataset(data, "dataset")?;
        Ok(self.evaluate_unchecked(data))
    }

    fn evaluate_unchecked(&self, data: &Dataset) -> EvalReport {
        let mut scratch = self.scratch();
        let mut mae = MaeAccumulator::new(self.output_dim());
        let mut total = 0.0_f64;
        for idx in 0..data.len() {
            let target = data.target(idx);
            let pred = self.forward(data.input(idx), &mut scratch);
            total += f64::from(loss::mse(pred, target));
            mae.add(pred, target);
        }
        EvalReport {
            loss: (total / data.len() as f64) as f32,
            mae: mae.finish(),
        }
    }

    /// Predict outputs for inputs (X).
    ///
    /// Returns a flat buffer with shape `(len, output_dim)`.
    pub fn predict(&self, inputs: &Inputs) -> Result<Vec<f32>> {
        if inputs.is_empty() {
            return Err(Error::InvalidData("inputs must not be empty".to_owned()));
        }
        if inputs.input_dim() != self.input_dim() {
            return Err(Error::InvalidData(format!(
                "inputs input_dim {} does not match model input_dim {}",
                inputs.input_dim(),
                self.input_dim()
            )));
        }

        let mut scratch = self.scratch();
        let out_dim = self.output_dim();
        let mut preds = vec![0.0_f32; inputs.len() * out_dim];

        for (idx, out) in preds.chunks_exact_mut(out_dim).enumerate() {
            out.copy_from_slice(self.forward(inputs.input(idx), &mut scratch));
        }

        Ok(preds)
    }

    fn check_dataset(&self, data: &Dataset, what: &str) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidData(format!("{what} must not be empty")));
        }
        if data.input_dim() != self.input_dim() {
            return Err(Error::InvalidData(format!(
                "{what} input_dim {} does not match model input_dim {}",
                data.input_dim(),
                self.input_dim()
            )));
        }
        if data.target_dim() != self.output_dim() {
            return Err(Error::InvalidData(format!(
                "{what} target_dim {} does not match model output_dim {}",
                data.target_dim(),
                self.output_dim()
            )));
        }
        Ok(())
    }
}
