//! Per-output evaluation metrics.
//!
//! Metrics do not participate in backprop. One mean-absolute-error value is
//! reported for every output column (one per retained physical parameter).

/// Running per-output mean absolute error.
///
/// Feed it `(pred, target)` pairs sample by sample; no allocation per step.
#[derive(Debug, Clone)]
pub struct MaeAccumulator {
    sums: Vec<f64>,
    count: usize,
}

impl MaeAccumulator {
    pub fn new(output_dim: usize) -> Self {
        Self {
            sums: vec![0.0; output_dim],
            count: 0,
        }
    }

    #[inline]
    pub fn add(&mut self, pred: &[f32], target: &[f32]) {
        debug_assert_eq!(pred.len(), self.sums.len());
        debug_assert_eq!(target.len(), self.sums.len());

        for ((s, &p), &t) in self.sums.iter_mut().zip(pred).zip(target) {
            *s += f64::from((p - t).abs());
        }
        self.count += 1;
    }

    pub fn reset(&mut self) {
        self.sums.fill(0.0);
        self.count = 0;
    }

    /// Mean absolute error per output; zeros if nothing was added.
    pub fn finish(&self) -> Vec<f32> {
        if self.count == 0 {
            return vec![0.0; self.sums.len()];
        }
        let n = self.count as f64;
        self.sums.iter().map(|&s| (s / n) as f32).collect()
    }
}

/// Mean absolute error of each output column.
///
/// `preds` and `targets` are flat row-major buffers with shape `(len, dim)`.
pub fn mae_per_output(preds: &[f32], targets: &[f32], dim: usize) -> Vec<f32> {
    assert!(dim > 0, "dim must be > 0");
    assert_eq!(
        preds.len(),
        targets.len(),
        "preds len {} does not match targets len {}",
        preds.len(),
        targets.len()
    );

    let mut acc = MaeAccumulator::new(dim);
    for (p, t) in preds.chunks_exact(dim).zip(targets.chunks_exact(dim)) {
        acc.add(p, t);
    }
    acc.finish()
}
