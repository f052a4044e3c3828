//! Layer-by-layer construction of an [`Mlp`].
//!
//! The initializer follows the activation: He for ReLU layers, Xavier for
//! identity layers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Activation, Error, Init, Layer, Mlp, Result};

#[derive(Debug, Clone)]
/// Collects layer widths and activations, then samples weights in one go.
///
/// ```rust
/// use reflecto_nn::{Activation, MlpBuilder};
///
/// # fn main() -> reflecto_nn::Result<()> {
/// let mlp = MlpBuilder::new(2)?
///     .add_layer(8, Activation::ReLU)?
///     .add_layer(1, Activation::Identity)?
///     .build_with_seed(0)?;
/// assert_eq!(mlp.output_dim(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MlpBuilder {
    input_dim: usize,
    layers: Vec<(usize, Activation)>,
}

impl MlpBuilder {
    /// Start building an MLP that accepts inputs of length `input_dim`.
    pub fn new(input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be > 0".to_owned()));
        }
        Ok(Self {
            input_dim,
            layers: Vec::new(),
        })
    }

    /// Add a dense layer with `out_dim` outputs followed by `activation`.
    pub fn add_layer(mut self, out_dim: usize, activation: Activation) -> Result<Self> {
        if out_dim == 0 {
            return Err(Error::InvalidConfig("layer out_dim must be > 0".to_owned()));
        }

        self.layers.push((out_dim, activation));
        Ok(self)
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Mlp> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Mlp> {
        if self.layers.is_empty() {
            return Err(Error::InvalidConfig(
                "mlp must have at least one layer".to_owned(),
            ));
        }

        let mut in_dim = self.input_dim;
        let mut layers = Vec::with_capacity(self.layers.len());
        for (out_dim, activation) in self.layers {
            let init = match activation {
                Activation::ReLU => Init::He,
                Activation::Identity => Init::Xavier,
            };
            layers.push(Layer::new_with_rng(in_dim, out_dim, init, activation, rng)?);
            in_dim = out_dim;
        }
        Ok(Mlp::from_layers(layers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_zero_width() {
        assert!(MlpBuilder::new(0).is_err());
        assert!(MlpBuilder::new(3).unwrap().add_layer(0, Activation::ReLU).is_err());
        assert!(MlpBuilder::new(3).unwrap().build_with_seed(0).is_err());
    }

    #[test]
    fn relu_layers_get_he_init() {
        let mlp = MlpBuilder::new(6)
            .unwrap()
            .add_layer(40, Activation::ReLU)
            .unwrap()
            .build_with_seed(5)
            .unwrap();
        let he_limit = (6.0_f32 / 6.0).sqrt();
        let xavier_limit = (6.0_f32 / 46.0).sqrt();
        let weights = mlp.layer(0).unwrap().weights();
        assert!(weights.iter().all(|w| w.abs() <= he_limit));
        assert!(weights.iter().any(|w| w.abs() > xavier_limit));
    }

    #[test]
    fn chains_layer_dims() {
        let mlp = MlpBuilder::new(4)
            .unwrap()
            .add_layer(6, Activation::ReLU)
            .unwrap()
            .add_layer(2, Activation::Identity)
            .unwrap()
            .build_with_seed(1)
            .unwrap();

        assert_eq!(mlp.num_layers(), 2);
        assert_eq!(mlp.input_dim(), 4);
        assert_eq!(mlp.output_dim(), 2);
        assert_eq!(mlp.num_params(), 4 * 6 + 6 + 6 * 2 + 2);
    }
}
