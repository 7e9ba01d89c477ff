//! Feature standardization.
//!
//! Provides a simple Scaler for per-column mean/std standardization. The
//! statistics are fitted on the training partition only and then applied
//! unchanged to training, holdout and inference features.

use serde::Serialize;
use statrs::statistics::Statistics;

use crate::error::{PipelineError, Result};
use crate::math::Array2;

/// Simple standard scaler (per-column mean/std).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl Scaler {
    /// Columns with a smaller spread are treated as constant and left
    /// unscaled (divided by 1.0).
    const MIN_STD: f64 = 1e-12;

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize a single feature vector.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_features() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_features(),
                found: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }
}

/// Fit a `Scaler` from an `Array2<f64>` where rows are samples and
/// columns are features.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler> {
    let (nrows, ncols) = x.shape();
    if nrows == 0 || ncols == 0 {
        return Err(PipelineError::InsufficientData(format!(
            "fit_scaler requires a non-empty matrix, got {} x {}",
            nrows, ncols
        )));
    }

    let mut mean = Vec::with_capacity(ncols);
    let mut std = Vec::with_capacity(ncols);
    for c in 0..ncols {
        let column = x.column(c);
        mean.push((&column).mean());
        let spread = (&column).population_std_dev();
        std.push(if spread < Scaler::MIN_STD { 1.0 } else { spread });
    }

    log::debug!("Fitted scaler on {} rows: mean={:?}, std={:?}", nrows, mean, std);

    Ok(Scaler { mean, std })
}

/// Transform all rows using the provided `Scaler` and return a new `Array2<f64>`.
pub fn transform_all(x: &Array2<f64>, sc: &Scaler) -> Result<Array2<f64>> {
    if x.ncols() != sc.n_features() {
        return Err(PipelineError::DimensionMismatch {
            expected: sc.n_features(),
            found: x.ncols(),
        });
    }

    let (nrows, ncols) = x.shape();
    let mut out = Vec::with_capacity(nrows * ncols);
    for row in x.rows() {
        for (c, v) in row.iter().enumerate() {
            out.push((v - sc.mean[c]) / sc.std[c]);
        }
    }

    Array2::from_shape_vec((nrows, ncols), out)
}

/// Convenience: fit a scaler and return it together with the transformed matrix.
pub fn fit_transform(x: &Array2<f64>) -> Result<(Scaler, Array2<f64>)> {
    let sc = fit_scaler(x)?;
    let scaled = transform_all(x, &sc)?;
    Ok((sc, scaled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_column_is_left_centered_not_inflated() {
        let x = Array2::from_shape_vec((3, 2), vec![1.0, 7.0, 2.0, 7.0, 3.0, 7.0]).unwrap();
        let sc = fit_scaler(&x).unwrap();
        assert_eq!(sc.std[1], 1.0);
        let row = sc.transform_row(&[2.0, 9.0]).unwrap();
        assert!((row[0]).abs() < 1e-12);
        assert!((row[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn transform_row_checks_width() {
        let x = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let sc = fit_scaler(&x).unwrap();
        assert_eq!(
            sc.transform_row(&[1.0]),
            Err(PipelineError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn transform_all_rejects_a_matrix_of_another_width() {
        let x = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let sc = fit_scaler(&x).unwrap();
        let wide = Array2::from_shape_vec((1, 3), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(
            transform_all(&wide, &sc),
            Err(PipelineError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn empty_matrix_cannot_be_fitted() {
        let x: Array2<f64> = Array2::from_rows(Vec::new(), 3).unwrap();
        assert!(matches!(
            fit_scaler(&x),
            Err(PipelineError::InsufficientData(_))
        ));
    }
}
