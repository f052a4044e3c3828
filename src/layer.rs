//! Dense layers and their weight initialization.

use rand::Rng;
use rand::distributions::{Distribution, Uniform};

use crate::{Activation, Error, Result};

/// Uniform weight initializers. Biases always start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init {
    /// Glorot/Xavier: `U(-sqrt(6 / (in + out)), +sqrt(6 / (in + out)))`.
    Xavier,
    /// He/Kaiming: `U(-sqrt(6 / in), +sqrt(6 / in))`.
    He,
}

impl Init {
    fn limit(self, in_dim: usize, out_dim: usize) -> f32 {
        match self {
            Init::Xavier => (6.0 / (in_dim + out_dim) as f32).sqrt(),
            Init::He => (6.0 / in_dim as f32).sqrt(),
        }
    }
}

/// `y = activation(W x + b)` with `W` stored row-major as `(out_dim, in_dim)`.
#[derive(Debug, Clone)]
pub struct Layer {
    in_dim: usize,
    out_dim: usize,
    activation: Activation,
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl Layer {
    /// Random weights drawn from `init`'s uniform range.
    pub fn new_with_rng<R: Rng + ?Sized>(
        in_dim: usize,
        out_dim: usize,
        init: Init,
        activation: Activation,
        rng: &mut R,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidConfig(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }

        let limit = init.limit(in_dim, out_dim);
        let dist = Uniform::new_inclusive(-limit, limit);
        let weights = (0..in_dim * out_dim).map(|_| dist.sample(rng)).collect();

        Ok(Self {
            in_dim,
            out_dim,
            activation,
            weights,
            biases: vec![0.0; out_dim],
        })
    }

    /// Wrap existing parameters, checking shapes and finiteness.
    pub fn from_parts(
        in_dim: usize,
        out_dim: usize,
        activation: Activation,
        weights: Vec<f32>,
        biases: Vec<f32>,
    ) -> Result<Self> {
        if in_dim == 0 || out_dim == 0 {
            return Err(Error::InvalidShape(format!(
                "layer dims must be > 0, got in_dim={in_dim} out_dim={out_dim}"
            )));
        }
        if weights.len() != in_dim * out_dim {
            return Err(Error::InvalidShape(format!(
                "weights length {} does not match out_dim * in_dim ({out_dim} * {in_dim})",
                weights.len()
            )));
        }
        if biases.len() != out_dim {
            return Err(Error::InvalidShape(format!(
                "biases length {} does not match out_dim {out_dim}",
                biases.len()
            )));
        }
        if weights.iter().chain(&biases).any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "layer parameters must be finite".to_owned(),
            ));
        }

        Ok(Self {
            in_dim,
            out_dim,
            activation,
            weights,
            biases,
        })
    }

    #[inline]
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    #[inline]
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.weights
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut [f32] {
        &mut self.biases
    }

    /// `outputs = activation(W * inputs + b)` for one sample.
    ///
    /// `inputs` must hold `in_dim` values and `outputs` `out_dim` values.
    #[inline]
    pub fn forward(&self, inputs: &[f32], outputs: &mut [f32]) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);

        let rows = self.weights.chunks_exact(self.in_dim);
        for ((out, row), &bias) in outputs.iter_mut().zip(rows).zip(&self.biases) {
            let z = row
                .iter()
                .zip(inputs)
                .fold(bias, |acc, (&w, &x)| w.mul_add(x, acc));
            *out = self.activation.forward(z);
        }
    }

    /// Gradients for one sample, given dL/d(outputs).
    ///
    /// `outputs` are the post-activation values from the matching `forward`.
    /// `d_inputs`, `d_weights` and `d_biases` are overwritten.
    #[inline]
    pub fn backward(
        &self,
        inputs: &[f32],
        outputs: &[f32],
        d_outputs: &[f32],
        d_inputs: &mut [f32],
        d_weights: &mut [f32],
        d_biases: &mut [f32],
    ) {
        debug_assert_eq!(inputs.len(), self.in_dim);
        debug_assert_eq!(outputs.len(), self.out_dim);
        debug_assert_eq!(d_outputs.len(), self.out_dim);
        debug_assert_eq!(d_inputs.len(), self.in_dim);
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.out_dim);

        d_inputs.fill(0.0);

        let rows = self
            .weights
            .chunks_exact(self.in_dim)
            .zip(d_weights.chunks_exact_mut(self.in_dim));
        for (o, (row, d_row)) in rows.enumerate() {
            let d_z = d_outputs[o] * self.activation.grad_from_output(outputs[o]);
            d_biases[o] = d_z;

            for ((d_w, &x), (d_x, &w)) in d_row
                .iter_mut()
                .zip(inputs)
                .zip(d_inputs.iter_mut().zip(row))
            {
                *d_w = d_z * x;
                *d_x = w.mul_add(d_z, *d_x);
            }
        }
    }

    /// `param -= lr * update` for weights and biases.
    #[inline]
    pub fn apply_update(&mut self, d_weights: &[f32], d_biases: &[f32], lr: f32) {
        debug_assert_eq!(d_weights.len(), self.weights.len());
        debug_assert_eq!(d_biases.len(), self.biases.len());

        let params = self.weights.iter_mut().chain(self.biases.iter_mut());
        for (p, &g) in params.zip(d_weights.iter().chain(d_biases)) {
            *p -= lr * g;
        }
    }
}
