//! Element-wise nonlinearities.
//!
//! Only the post-activation value `y` is kept between the forward and backward
//! pass, so each derivative is written in terms of `y`.

/// Nonlinearity applied after a layer's affine map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// `max(0, z)`
    ReLU,
    /// Linear output; for small hand-built models and tests.
    Identity,
}

impl Activation {
    #[inline]
    pub(crate) fn forward(self, z: f32) -> f32 {
        match self {
            Activation::ReLU => z.max(0.0),
            Activation::Identity => z,
        }
    }

    /// `dy/dz` evaluated from `y`. ReLU uses 0 at the kink.
    #[inline]
    pub(crate) fn grad_from_output(self, y: f32) -> f32 {
        match self {
            Activation::ReLU if y <= 0.0 => 0.0,
            Activation::ReLU | Activation::Identity => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_clips_and_gates_gradient() {
        assert_eq!(Activation::ReLU.forward(-2.0), 0.0);
        assert_eq!(Activation::ReLU.forward(3.0), 3.0);
        assert_eq!(Activation::ReLU.grad_from_output(0.0), 0.0);
        assert_eq!(Activation::ReLU.grad_from_output(0.25), 1.0);
    }

    #[test]
    fn identity_passes_through() {
        assert_eq!(Activation::Identity.forward(-1.5), -1.5);
        assert_eq!(Activation::Identity.grad_from_output(-1.5), 1.0);
    }
}
