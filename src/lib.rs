//! Learn thin-film parameters from neutron/X-ray reflectivity curves.
//!
//! `reflecto-nn` trains a dense feed-forward regressor that maps a sampled
//! reflectivity curve `R(q)` to the physical parameters of the layer stack
//! that produced it (thickness, roughness, scattering length density).
//!
//! # Pipeline
//!
//! 1. [`io`] reads tab-separated curve and label tables.
//! 2. [`labels`] min-max normalizes every parameter against its configured
//!    bounds and drops the parameters whose bounds are degenerate.
//! 3. [`transform`] takes the natural log of every reflectivity value.
//! 4. [`model`] builds the fixed ReLU network and [`Mlp::fit`] trains it with
//!    MSE + Adam, running [`callbacks`] after every epoch.
//!
//! [`pipeline::run`] wires these together from a [`config::TrainingConfig`].
//!
//! [`Mlp::forward`] and [`Mlp::backward`] assert their shape contracts and
//! panic on misuse; every other entry point checks its inputs and returns a
//! [`Result`]. Data preparation runs in `f64` on [`Matrix`], the network in `f32`.
//!
//! A single training step by hand, reusing the [`Trainer`] buffers:
//!
//! ```rust
//! use reflecto_nn::{Activation, MlpBuilder, loss};
//!
//! # fn main() -> reflecto_nn::Result<()> {
//! let mut mlp = MlpBuilder::new(3)?
//!     .add_layer(8, Activation::ReLU)?
//!     .add_layer(2, Activation::ReLU)?
//!     .build_with_seed(0)?;
//!
//! let mut trainer = mlp.trainer();
//! let x = [0.1_f32, -0.2, 0.3];
//! let t = [0.0_f32, 1.0];
//!
//! let out = mlp.forward(&x, &mut trainer.scratch);
//! let step_loss = loss::mse_backward(out, &t, trainer.grads.d_output_mut());
//! assert!(step_loss >= 0.0);
//! mlp.backward(&x, &trainer.scratch, &mut trainer.grads);
//! mlp.apply_update(&trainer.grads, 1e-2);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod callbacks;
pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod labels;
pub mod layer;
pub mod loss;
pub mod metrics;
pub mod mlp;
pub mod model;
pub mod optim;
pub mod pipeline;
pub mod serde_model;
pub mod train;
pub mod transform;

pub use activation::Activation;
pub use builder::MlpBuilder;
pub use data::{Dataset, Inputs, Matrix};
pub use error::{Error, Result};
pub use layer::{Init, Layer};
pub use mlp::Trainer;
pub use mlp::{Gradients, Mlp, Scratch};
pub use optim::{Adam, AdamState};
pub use train::{Callback, EpochReport, EvalReport, FitConfig, FitReport, Shuffle};
