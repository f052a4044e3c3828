//! Mean squared error, the training loss.
//!
//! Normalized targets are compared against the network output sample by
//! sample; the loss writes `dL/d(output)` straight into the gradient buffer
//! that `Mlp::backward` reads.

fn check_lengths(pred: &[f32], target: &[f32]) {
    assert_eq!(
        pred.len(),
        target.len(),
        "prediction has {} values, target has {}",
        pred.len(),
        target.len()
    );
}

/// `mean((pred - target)^2)`; zero for empty slices.
#[inline]
pub fn mse(pred: &[f32], target: &[f32]) -> f32 {
    check_lengths(pred, target);
    if pred.is_empty() {
        return 0.0;
    }

    let sum_sq = pred
        .iter()
        .zip(target)
        .fold(0.0_f32, |acc, (&p, &t)| (p - t).mul_add(p - t, acc));
    sum_sq / pred.len() as f32
}

/// Loss plus its gradient `d_pred[i] = 2 * (pred[i] - target[i]) / N`.
#[inline]
pub fn mse_backward(pred: &[f32], target: &[f32], d_pred: &mut [f32]) -> f32 {
    check_lengths(pred, target);
    assert_eq!(pred.len(), d_pred.len(), "gradient buffer length");
    if pred.is_empty() {
        return 0.0;
    }

    let inv_n = 1.0 / pred.len() as f32;
    let mut sum_sq = 0.0_f32;
    for ((d, &p), &t) in d_pred.iter_mut().zip(pred).zip(target) {
        let diff = p - t;
        sum_sq = diff.mul_add(diff, sum_sq);
        *d = 2.0 * diff * inv_n;
    }
    sum_sq * inv_n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mse_matches_definition() {
        let pred = [1.0_f32, 2.0, 4.0];
        let target = [1.0_f32, 0.0, 1.0];
        // (0 + 4 + 9) / 3
        assert!((mse(&pred, &target) - 13.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn mse_backward_matches_finite_difference() {
        let target = [0.3_f32, -0.2];
        let mut pred = [0.5_f32, 0.1];
        let mut d = [0.0_f32; 2];
        let loss = mse_backward(&pred, &target, &mut d);
        assert!((loss - mse(&pred, &target)).abs() < 1e-7);

        let eps = 1e-3_f32;
        for i in 0..pred.len() {
            let orig = pred[i];
            pred[i] = orig + eps;
            let plus = mse(&pred, &target);
            pred[i] = orig - eps;
            let minus = mse(&pred, &target);
            pred[i] = orig;
            let numeric = (plus - minus) / (2.0 * eps);
            assert!((numeric - d[i]).abs() < 1e-3, "i={i} numeric={numeric} analytic={}", d[i]);
        }
    }

    #[test]
    fn empty_is_zero() {
        assert_eq!(mse(&[], &[]), 0.0);
    }
}
