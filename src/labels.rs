//! Label normalization.
//!
//! Raw physical parameters are rescaled to `[0, 1]` with per-parameter bounds
//! from the config, then parameters whose bounds collapse (`min == max`) are
//! stripped. The two steps run in that order:
//!
//! 1. [`normalize`] leaves degenerate columns untouched (no division by zero).
//! 2. [`remove_constant_labels`] drops exactly those columns.

use crate::config::{ConfigProvider, ParamRange};
use crate::data::Matrix;
use crate::{Error, Result};

/// Per-parameter `(min, max)` bounds, in label column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl Bounds {
    /// Build bounds from explicit `min`/`max` sequences.
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Result<Self> {
        if min.len() != max.len() {
            return Err(Error::ConfigMismatch(format!(
                "{} minimum bounds but {} maximum bounds",
                min.len(),
                max.len()
            )));
        }
        for (k, (&lo, &hi)) in min.iter().zip(&max).enumerate() {
            if !(lo.is_finite() && hi.is_finite()) {
                return Err(Error::InvalidConfig(format!(
                    "bounds for parameter {k} must be finite, got ({lo}, {hi})"
                )));
            }
            if lo > hi {
                return Err(Error::InvalidConfig(format!(
                    "bounds for parameter {k} have min {lo} > max {hi}"
                )));
            }
        }
        Ok(Self { min, max })
    }

    /// Concatenate the three parameter families in their fixed order:
    /// thickness, roughness, scattering-length density.
    pub fn from_ranges(
        thickness: &ParamRange,
        roughness: &ParamRange,
        sld: &ParamRange,
    ) -> Result<Self> {
        let families = [
            ("thickness", thickness),
            ("roughness", roughness),
            ("scattering_length_density", sld),
        ];

        let mut min = Vec::new();
        let mut max = Vec::new();
        for (name, range) in families {
            if range.min.len() != range.max.len() {
                return Err(Error::ConfigMismatch(format!(
                    "{name} has {} minimum bounds but {} maximum bounds",
                    range.min.len(),
                    range.max.len()
                )));
            }
            min.extend_from_slice(&range.min);
            max.extend_from_slice(&range.max);
        }
        Self::new(min, max)
    }

    pub fn from_config(config: &dyn ConfigProvider) -> Result<Self> {
        Self::from_ranges(
            &config.thickness(),
            &config.roughness(),
            &config.scattering_length_density(),
        )
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.min.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    #[inline]
    pub fn min(&self, k: usize) -> f64 {
        self.min[k]
    }

    #[inline]
    pub fn max(&self, k: usize) -> f64 {
        self.max[k]
    }

    /// A parameter is degenerate when its bounds collapse to one value.
    #[inline]
    pub fn is_degenerate(&self, k: usize) -> bool {
        self.min[k] == self.max[k]
    }

    /// Number of degenerate parameters.
    pub fn degenerate_count(&self) -> usize {
        (0..self.len()).filter(|&k| self.is_degenerate(k)).count()
    }

    /// Fail with `ConfigMismatch` unless there is exactly one bound per column.
    pub fn check_columns(&self, cols: usize) -> Result<()> {
        if self.len() != cols {
            return Err(Error::ConfigMismatch(format!(
                "config defines bounds for {} parameters but the labels have {} columns",
                self.len(),
                cols
            )));
        }
        Ok(())
    }

    /// Bounds restricted to `indices`, in that order.
    pub fn retain(&self, indices: &[usize]) -> Bounds {
        Bounds {
            min: indices.iter().map(|&k| self.min[k]).collect(),
            max: indices.iter().map(|&k| self.max[k]).collect(),
        }
    }

    /// Indices of non-degenerate parameters, in ascending order.
    pub fn active_indices(&self) -> Vec<usize> {
        let mut keep = Vec::with_capacity(self.len());
        for k in (0..self.len()).rev() {
            if !self.is_degenerate(k) {
                keep.push(k);
            }
        }
        keep.reverse();
        keep
    }
}

/// Normalized labels with degenerate parameters removed.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLabels {
    /// One row per instance, one column per retained parameter.
    pub values: Matrix,
    /// Original column index of every retained parameter.
    pub indices: Vec<usize>,
}

impl ActiveLabels {
    #[inline]
    pub fn num_params(&self) -> usize {
        self.values.cols()
    }

    /// Names of the retained parameters, looked up in the full name list.
    pub fn names(&self, all: &[String]) -> Vec<String> {
        self.indices
            .iter()
            .map(|&k| all.get(k).cloned().unwrap_or_else(|| format!("param_{k}")))
            .collect()
    }
}

/// Min-max normalize every non-degenerate column into `[0, 1]`.
///
/// Degenerate columns (`min == max`) keep their raw values. Values outside
/// their bounds are not clamped; they map outside `[0, 1]` and are counted in
/// a warning.
pub fn normalize(labels: &Matrix, bounds: &Bounds) -> Result<Matrix> {
    bounds.check_columns(labels.cols())?;

    let cols = labels.cols();
    let mut out_of_range = 0usize;
    let mut data = Vec::with_capacity(labels.rows() * cols);
    for r in 0..labels.rows() {
        for (k, &v) in labels.row(r).iter().enumerate() {
            let (lo, hi) = (bounds.min(k), bounds.max(k));
            if bounds.is_degenerate(k) {
                data.push(v);
                continue;
            }
            if v < lo || v > hi {
                out_of_range += 1;
            }
            data.push((v - lo) / (hi - lo));
        }
    }

    if out_of_range > 0 {
        log::warn!("{out_of_range} label values lie outside their configured bounds");
    }
    Matrix::from_flat(data, cols)
}

/// Drop every column whose bounds are degenerate.
///
/// The retained-index list is built first and the reduced matrix is then
/// materialized by selection, so surviving columns keep their relative order.
pub fn remove_constant_labels(labels: &Matrix, bounds: &Bounds) -> Result<ActiveLabels> {
    bounds.check_columns(labels.cols())?;

    let indices = bounds.active_indices();
    let values = labels.select_columns(&indices);
    Ok(ActiveLabels { values, indices })
}

/// Map normalized values of the retained parameters back to physical units.
///
/// `values[j]` belongs to original parameter `indices[j]`.
pub fn denormalize_row(indices: &[usize], bounds: &Bounds, values: &[f64]) -> Vec<f64> {
    assert_eq!(
        indices.len(),
        values.len(),
        "indices len {} does not match values len {}",
        indices.len(),
        values.len()
    );
    indices
        .iter()
        .zip(values)
        .map(|(&k, &v)| v * (bounds.max(k) - bounds.min(k)) + bounds.min(k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn bounds(pairs: &[(f64, f64)]) -> Bounds {
        Bounds::new(
            pairs.iter().map(|p| p.0).collect(),
            pairs.iter().map(|p| p.1).collect(),
        )
        .unwrap()
    }

    #[test]
    fn from_ranges_concatenates_in_family_order() {
        let b = Bounds::from_ranges(
            &ParamRange::new(vec![10.0, 20.0], vec![100.0, 200.0]),
            &ParamRange::new(vec![1.0], vec![5.0]),
            &ParamRange::new(vec![0.5], vec![0.5]),
        )
        .unwrap();

        assert_eq!(b.len(), 4);
        assert_eq!((b.min(0), b.max(0)), (10.0, 100.0));
        assert_eq!((b.min(1), b.max(1)), (20.0, 200.0));
        assert_eq!((b.min(2), b.max(2)), (1.0, 5.0));
        assert!(b.is_degenerate(3));
    }

    #[test]
    fn from_ranges_rejects_unequal_family_lengths() {
        let err = Bounds::from_ranges(
            &ParamRange::new(vec![0.0], vec![1.0]),
            &ParamRange::new(vec![0.0, 1.0], vec![1.0]),
            &ParamRange::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigMismatch(_)));
        assert!(format!("{err}").contains("roughness"));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = Bounds::new(vec![2.0], vec![1.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn normalize_maps_columns_and_skips_degenerate() {
        let labels = Matrix::from_rows(&[vec![7.0, 1.0, 10.0], vec![7.0, 3.0, 2.0]]).unwrap();
        let b = bounds(&[(7.0, 7.0), (1.0, 5.0), (2.0, 10.0)]);

        let n = normalize(&labels, &b).unwrap();
        assert_eq!(n.row(0), &[7.0, 0.0, 1.0]);
        assert_eq!(n.row(1), &[7.0, 0.5, 0.0]);
    }

    #[test]
    fn normalize_does_not_clamp() {
        let labels = Matrix::from_rows(&[vec![12.0, 0.0], vec![-2.0, 0.0]]).unwrap();
        let b = bounds(&[(0.0, 10.0), (0.0, 1.0)]);

        let n = normalize(&labels, &b).unwrap();
        assert!((n.get(0, 0) - 1.2).abs() < 1e-12);
        assert!((n.get(1, 0) + 0.2).abs() < 1e-12);
    }

    #[test]
    fn column_count_mismatch_is_config_mismatch() {
        let labels = Matrix::from_rows(&[vec![1.0, 2.0, 3.0]]).unwrap();
        let b = bounds(&[(0.0, 1.0), (0.0, 1.0)]);

        assert!(matches!(
            normalize(&labels, &b).unwrap_err(),
            Error::ConfigMismatch(_)
        ));
        assert!(matches!(
            remove_constant_labels(&labels, &b).unwrap_err(),
            Error::ConfigMismatch(_)
        ));
    }

    #[test]
    fn remove_constant_labels_keeps_order_and_indices() {
        let labels = Matrix::from_rows(&[
            vec![0.0, 0.1, 0.2, 0.3, 0.4],
            vec![1.0, 1.1, 1.2, 1.3, 1.4],
        ])
        .unwrap();
        let b = bounds(&[(0.0, 1.0), (3.0, 3.0), (0.0, 1.0), (0.0, 0.0), (0.0, 1.0)]);

        let active = remove_constant_labels(&labels, &b).unwrap();
        assert_eq!(active.indices, vec![0, 2, 4]);
        assert_eq!(active.values.row(0), &[0.0, 0.2, 0.4]);
        assert_eq!(active.values.row(1), &[1.0, 1.2, 1.4]);
    }

    #[test]
    fn active_names_follow_retained_indices() {
        let active = ActiveLabels {
            values: Matrix::from_rows(&[vec![0.0, 0.0]]).unwrap(),
            indices: vec![1, 3],
        };
        let all: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(active.names(&all), vec!["b", "d"]);
    }

    #[test]
    fn scenario_with_one_degenerate_parameter() {
        let labels = Matrix::from_rows(&[
            vec![0.0, 1.0, 2.0, 0.0],
            vec![0.0, 3.0, 6.0, 0.5],
            vec![0.0, 5.0, 10.0, 1.0],
        ])
        .unwrap();
        let b = bounds(&[(0.0, 0.0), (1.0, 5.0), (2.0, 10.0), (0.0, 1.0)]);

        let n = normalize(&labels, &b).unwrap();
        let active = remove_constant_labels(&n, &b).unwrap();

        assert_eq!(active.num_params(), 3);
        assert_eq!(active.indices, vec![1, 2, 3]);
        assert!(active.values.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    fn bounds_and_labels() -> impl Strategy<Value = (Vec<(f64, f64)>, Vec<Vec<f64>>)> {
        // Each parameter is either degenerate or has a positive-width range.
        let param = (-1e3_f64..1e3, prop_oneof![Just(0.0_f64), 1e-3_f64..1e3]);
        prop::collection::vec(param, 1..8).prop_flat_map(|params| {
            let pairs: Vec<(f64, f64)> = params.iter().map(|&(lo, w)| (lo, lo + w)).collect();
            let row = pairs
                .iter()
                .map(|&(lo, hi)| if lo == hi { Just(lo).boxed() } else { (lo..=hi).boxed() })
                .collect::<Vec<_>>();
            (Just(pairs), prop::collection::vec(row, 1..6))
        })
    }

    proptest! {
        #[test]
        fn prop_degenerate_columns_are_absent((pairs, rows) in bounds_and_labels()) {
            let b = bounds(&pairs);
            let labels = Matrix::from_rows(&rows).unwrap();
            let n = normalize(&labels, &b).unwrap();
            let active = remove_constant_labels(&n, &b).unwrap();

            prop_assert_eq!(active.num_params(), b.len() - b.degenerate_count());
            for &k in &active.indices {
                prop_assert!(!b.is_degenerate(k));
            }
            prop_assert!(active.indices.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn prop_normalize_is_in_unit_range_and_invertible((pairs, rows) in bounds_and_labels()) {
            let b = bounds(&pairs);
            let labels = Matrix::from_rows(&rows).unwrap();
            let n = normalize(&labels, &b).unwrap();
            let active = remove_constant_labels(&n, &b).unwrap();

            for r in 0..labels.rows() {
                let row = active.values.row(r);
                for &v in row {
                    prop_assert!((-1e-12..=1.0 + 1e-12).contains(&v));
                }
                let restored = denormalize_row(&active.indices, &b, row);
                for (j, &k) in active.indices.iter().enumerate() {
                    let raw = labels.get(r, k);
                    prop_assert!((restored[j] - raw).abs() <= 1e-9 * raw.abs().max(1.0));
                }
            }
        }

        #[test]
        fn prop_remove_constant_labels_is_idempotent((pairs, rows) in bounds_and_labels()) {
            let b = bounds(&pairs);
            let labels = Matrix::from_rows(&rows).unwrap();
            let once = remove_constant_labels(&labels, &b).unwrap();

            let retained = b.retain(&once.indices);
            let twice = remove_constant_labels(&once.values, &retained).unwrap();

            prop_assert_eq!(&twice.values, &once.values);
            prop_assert_eq!(twice.indices, (0..once.num_params()).collect::<Vec<_>>());
        }
    }
}
