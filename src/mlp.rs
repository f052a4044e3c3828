//! The dense network and its reusable per-sample buffers.

use crate::Layer;

/// A chain of dense layers; layer `i + 1` consumes the output of layer `i`.
#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Layer>,
}

/// Post-activation outputs of every layer for the last forward pass.
#[derive(Debug, Clone)]
pub struct Scratch {
    activations: Vec<Vec<f32>>,
}

/// Parameter gradients for an `Mlp`.
///
/// `Mlp::backward` overwrites them; `accumulate`/`scale` combine per-sample
/// gradients into a mini-batch gradient.
#[derive(Debug, Clone)]
pub struct Gradients {
    d_weights: Vec<Vec<f32>>,
    d_biases: Vec<Vec<f32>>,
    // dL/d(output of layer i). The last entry is the loss gradient.
    deltas: Vec<Vec<f32>>,
    d_input: Vec<f32>,
}

impl Mlp {
    /// Build a model from already-constructed layers.
    ///
    /// Panics if `layers` is empty or consecutive dims do not chain.
    pub fn from_layers(layers: Vec<Layer>) -> Self {
        assert!(!layers.is_empty(), "mlp must have at least one layer");
        if let Some(i) = layers
            .windows(2)
            .position(|pair| pair[0].out_dim() != pair[1].in_dim())
        {
            panic!(
                "layer {i} emits {} values but layer {} expects {}",
                layers[i].out_dim(),
                i + 1,
                layers[i + 1].in_dim()
            );
        }
        Self { layers }
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.layers[0].in_dim()
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].out_dim()
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&Layer> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut Layer> {
        self.layers.get_mut(idx)
    }

    /// Total number of trainable parameters.
    pub fn num_params(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights().len() + l.biases().len())
            .sum()
    }

    pub fn scratch(&self) -> Scratch {
        Scratch::new(self)
    }

    pub fn gradients(&self) -> Gradients {
        Gradients::new(self)
    }

    #[inline]
    pub fn trainer(&self) -> Trainer {
        Trainer::new(self)
    }

    /// Run one sample through the network and return the final output.
    ///
    /// Panics if `input.len() != self.input_dim()` or `scratch` was built for
    /// a different model.
    pub fn forward<'a>(&self, input: &[f32], scratch: &'a mut Scratch) -> &'a [f32] {
        assert_eq!(input.len(), self.input_dim(), "forward: input length");
        assert_eq!(
            scratch.activations.len(),
            self.layers.len(),
            "forward: scratch built for another model"
        );

        let mut prev: &[f32] = input;
        for (layer, out) in self.layers.iter().zip(scratch.activations.iter_mut()) {
            layer.forward(prev, out);
            prev = out.as_slice();
        }

        scratch.output()
    }

    /// Backpropagate the loss gradient stored in `grads.d_output_mut()`.
    ///
    /// `scratch` must hold the forward pass for the same `input`. Parameter
    /// gradients in `grads` are overwritten. Returns dL/d(input).
    pub fn backward<'a>(
        &self,
        input: &[f32],
        scratch: &Scratch,
        grads: &'a mut Gradients,
    ) -> &'a [f32] {
        assert_eq!(input.len(), self.input_dim(), "backward: input length");
        assert_eq!(
            scratch.activations.len(),
            self.layers.len(),
            "backward: scratch built for another model"
        );
        assert_eq!(
            grads.deltas.len(),
            self.layers.len(),
            "backward: gradients built for another model"
        );

        for idx in (0..self.layers.len()).rev() {
            let layer_input: &[f32] = match idx {
                0 => input,
                _ => &scratch.activations[idx - 1],
            };

            // deltas[idx] is read, deltas[idx - 1] (or d_input) is written.
            let (below, from_here) = grads.deltas.split_at_mut(idx);
            let d_out = &from_here[0];
            let d_in = match below.last_mut() {
                Some(d) => d,
                None => &mut grads.d_input,
            };

            self.layers[idx].backward(
                layer_input,
                &scratch.activations[idx],
                d_out,
                d_in,
                &mut grads.d_weights[idx],
                &mut grads.d_biases[idx],
            );
        }

        &grads.d_input
    }

    /// `param -= lr * update` for every layer, `update` read from `grads`.
    #[inline]
    pub fn apply_update(&mut self, grads: &Gradients, lr: f32) {
        assert!(lr.is_finite() && lr > 0.0, "lr must be finite and > 0");
        assert_eq!(
            grads.num_layers(),
            self.layers.len(),
            "apply_update: gradients built for another model"
        );

        let updates = grads.d_weights.iter().zip(&grads.d_biases);
        for (layer, (dw, db)) in self.layers.iter_mut().zip(updates) {
            layer.apply_update(dw, db, lr);
        }
    }
}

/// Everything one training step needs, allocated once per `fit`.
///
/// `scratch` and `grads` hold the current sample; `batch` sums the
/// mini-batch gradient.
#[derive(Debug, Clone)]
pub struct Trainer {
    pub scratch: Scratch,
    pub grads: Gradients,
    pub batch: Gradients,
}

impl Trainer {
    pub fn new(mlp: &Mlp) -> Self {
        Self {
            scratch: Scratch::new(mlp),
            grads: Gradients::new(mlp),
            batch: Gradients::new(mlp),
        }
    }
}

impl Scratch {
    pub fn new(mlp: &Mlp) -> Self {
        Self {
            activations: mlp
                .layers
                .iter()
                .map(|layer| vec![0.0; layer.out_dim()])
                .collect(),
        }
    }

    /// Output of the final layer.
    #[inline]
    pub fn output(&self) -> &[f32] {
        &self.activations[self.activations.len() - 1]
    }
}

impl Gradients {
    pub fn new(mlp: &Mlp) -> Self {
        let zeros = |n: usize| vec![0.0_f32; n];
        Self {
            d_weights: mlp
                .layers
                .iter()
                .map(|l| zeros(l.in_dim() * l.out_dim()))
                .collect(),
            d_biases: mlp.layers.iter().map(|l| zeros(l.out_dim())).collect(),
            deltas: mlp.layers.iter().map(|l| zeros(l.out_dim())).collect(),
            d_input: zeros(mlp.input_dim()),
        }
    }

    /// Where the loss writes dL/d(output) before `Mlp::backward`.
    #[inline]
    pub fn d_output_mut(&mut self) -> &mut [f32] {
        let last = self.deltas.len() - 1;
        &mut self.deltas[last]
    }

    #[inline]
    pub fn d_input(&self) -> &[f32] {
        &self.d_input
    }

    #[inline]
    pub fn num_layers(&self) -> usize {
        self.d_weights.len()
    }

    #[inline]
    pub fn d_weights(&self, layer_idx: usize) -> &[f32] {
        &self.d_weights[layer_idx]
    }

    #[inline]
    pub fn d_biases(&self, layer_idx: usize) -> &[f32] {
        &self.d_biases[layer_idx]
    }

    #[inline]
    pub fn d_weights_mut(&mut self, layer_idx: usize) -> &mut [f32] {
        &mut self.d_weights[layer_idx]
    }

    #[inline]
    pub fn d_biases_mut(&mut self, layer_idx: usize) -> &mut [f32] {
        &mut self.d_biases[layer_idx]
    }

    fn params_mut(&mut self) -> impl Iterator<Item = &mut Vec<f32>> {
        self.d_weights.iter_mut().chain(self.d_biases.iter_mut())
    }

    /// Zero all parameter gradients.
    pub fn zero(&mut self) {
        self.params_mut().for_each(|g| g.fill(0.0));
    }

    /// Add another gradient set (same model shape) into this one.
    pub fn accumulate(&mut self, other: &Gradients) {
        assert_eq!(
            self.num_layers(),
            other.num_layers(),
            "gradient layer count mismatch"
        );
        let sources = other.d_weights.iter().chain(&other.d_biases);
        for (dst, src) in self.params_mut().zip(sources) {
            dst.iter_mut().zip(src).for_each(|(d, &s)| *d += s);
        }
    }

    /// Multiply all parameter gradients by `factor`.
    pub fn scale(&mut self, factor: f32) {
        self.params_mut()
            .flat_map(|g| g.iter_mut())
            .for_each(|v| *v *= factor);
    }
}
