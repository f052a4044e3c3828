//! The reflectivity regression network.
//!
//! A fixed stack of fully-connected ReLU layers. Only the input size (number
//! of q points) and the output size (number of retained parameters) vary.

use crate::{Activation, Mlp, MlpBuilder, Result};

/// Hidden layer widths, input side first.
pub const HIDDEN_WIDTHS: [usize; 6] = [400, 800, 400, 300, 200, 100];

/// Build the network for `input_dim` q samples and `output_dim` parameters.
///
/// Every layer, the output layer included, is followed by ReLU; normalized
/// targets live in `[0, 1]`.
pub fn reflectivity_network(input_dim: usize, output_dim: usize, seed: u64) -> Result<Mlp> {
    let mut builder = MlpBuilder::new(input_dim)?;
    for width in HIDDEN_WIDTHS {
        builder = builder.add_layer(width, Activation::ReLU)?;
    }
    let mlp = builder
        .add_layer(output_dim, Activation::ReLU)?
        .build_with_seed(seed)?;

    log::info!(
        "network: {} -> {:?} -> {} ({} parameters)",
        input_dim,
        HIDDEN_WIDTHS,
        output_dim,
        mlp.num_params()
    );
    Ok(mlp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_is_fixed() {
        let mlp = reflectivity_network(109, 5, 0).unwrap();
        assert_eq!(mlp.num_layers(), 7);
        assert_eq!(mlp.input_dim(), 109);
        assert_eq!(mlp.output_dim(), 5);

        let widths: Vec<usize> = (0..mlp.num_layers())
            .map(|i| mlp.layer(i).unwrap().out_dim())
            .collect();
        assert_eq!(widths, vec![400, 800, 400, 300, 200, 100, 5]);
        assert!(
            (0..mlp.num_layers()).all(|i| mlp.layer(i).unwrap().activation() == Activation::ReLU)
        );
    }

    #[test]
    fn zero_outputs_is_rejected() {
        assert!(reflectivity_network(10, 0, 0).is_err());
    }
}
