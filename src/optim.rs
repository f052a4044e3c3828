//! Adam with bias correction.
//!
//! The moment estimates live in [`AdamState`], owned by the training loop and
//! shaped like the model's parameters.

use crate::{Error, Gradients, Mlp, Result};

/// Adam hyperparameters. The learning rate is passed per step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub eps: f32,
}

impl Default for Adam {
    fn default() -> Self {
        Self {
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }
}

impl Adam {
    pub fn validate(self) -> Result<()> {
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(Error::InvalidConfig(format!(
                    "adam {name} must lie in [0, 1), got {beta}"
                )));
            }
        }
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "adam eps must be finite and > 0, got {}",
                self.eps
            )));
        }
        Ok(())
    }

    /// Zeroed moments for `model`.
    pub fn state(self, model: &Mlp) -> Result<AdamState> {
        self.validate()?;
        Ok(AdamState {
            hp: self,
            t: 0,
            beta1_pow: 1.0,
            beta2_pow: 1.0,
            m: Moments::zeros_like(model),
            v: Moments::zeros_like(model),
        })
    }
}

/// Per-layer buffers matching weights and biases.
#[derive(Debug, Clone)]
struct Moments {
    weights: Vec<Vec<f32>>,
    biases: Vec<Vec<f32>>,
}

impl Moments {
    fn zeros_like(model: &Mlp) -> Self {
        let layers = (0..model.num_layers()).filter_map(|i| model.layer(i));
        let (weights, biases) = layers
            .map(|l| (vec![0.0; l.weights().len()], vec![0.0; l.biases().len()]))
            .unzip();
        Self { weights, biases }
    }
}

#[derive(Debug, Clone)]
pub struct AdamState {
    hp: Adam,
    t: u64,
    beta1_pow: f32,
    beta2_pow: f32,
    m: Moments,
    v: Moments,
}

impl AdamState {
    #[inline]
    pub fn steps(&self) -> u64 {
        self.t
    }

    /// One Adam step. `grads` is overwritten with the update direction
    /// before it is applied to `model`.
    pub fn step(&mut self, model: &mut Mlp, grads: &mut Gradients, lr: f32) {
        assert!(lr.is_finite() && lr > 0.0, "lr must be finite and > 0");
        assert_eq!(
            grads.num_layers(),
            self.m.weights.len(),
            "gradients and optimizer state describe different models"
        );

        self.t += 1;
        self.beta1_pow *= self.hp.beta1;
        self.beta2_pow *= self.hp.beta2;
        let corr = (1.0 - self.beta1_pow, 1.0 - self.beta2_pow);

        for idx in 0..self.m.weights.len() {
            self.hp.update(
                grads.d_weights_mut(idx),
                &mut self.m.weights[idx],
                &mut self.v.weights[idx],
                corr,
            );
            self.hp.update(
                grads.d_biases_mut(idx),
                &mut self.m.biases[idx],
                &mut self.v.biases[idx],
                corr,
            );
        }

        model.apply_update(grads, lr);
    }
}

impl Adam {
    /// Advance `m`/`v` with gradient `g` and replace `g` by `m_hat / (sqrt(v_hat) + eps)`.
    #[inline]
    fn update(self, g: &mut [f32], m: &mut [f32], v: &mut [f32], (corr1, corr2): (f32, f32)) {
        debug_assert_eq!(g.len(), m.len());
        debug_assert_eq!(g.len(), v.len());

        for ((g, m), v) in g.iter_mut().zip(m.iter_mut()).zip(v.iter_mut()) {
            *m = self.beta1 * *m + (1.0 - self.beta1) * *g;
            *v = self.beta2 * *v + (1.0 - self.beta2) * *g * *g;
            *g = (*m / corr1) / ((*v / corr2).sqrt() + self.eps);
        }
    }
}
