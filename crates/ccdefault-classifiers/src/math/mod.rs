//! Small dense-matrix type used for feature matrices.
//!
//! Rows are samples and columns are features. The pipeline only needs row
//! access, row selection and column-wise statistics; learners that want
//! `ndarray` get a copy at the boundary.
pub mod matrix;

pub use matrix::Array2;

use crate::error::{PipelineError, Result};

/// Row-major copy of `x` as an `ndarray` matrix.
pub(crate) fn to_ndarray(x: &Array2<f64>) -> Result<ndarray::Array2<f64>> {
    ndarray::Array2::from_shape_vec(x.shape(), x.to_vec())
        .map_err(|e| PipelineError::InvalidParameter(format!("feature matrix: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndarray_copy_keeps_row_major_layout() {
        let x = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let nd = to_ndarray(&x).unwrap();
        assert_eq!(nd.dim(), (2, 3));
        assert_eq!(nd[[1, 0]], 4.0);
        assert_eq!(nd[[0, 2]], 3.0);
    }
}
