use std::ops::Index;

use crate::error::{PipelineError, Result};

/// Row-major 2D buffer of samples × features.
#[derive(Clone, Debug, PartialEq)]
pub struct Array2<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> Array2<T> {
    pub fn from_shape_vec(shape: (usize, usize), data: Vec<T>) -> Result<Self> {
        let (rows, cols) = shape;
        if data.len() != rows * cols {
            return Err(PipelineError::DimensionMismatch {
                expected: rows * cols,
                found: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Build a matrix from equally sized rows. `width` is used when `rows`
    /// is empty so that an empty matrix still knows its feature count.
    pub fn from_rows(rows: Vec<Vec<T>>, width: usize) -> Result<Self> {
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * width);
        for row in rows {
            if row.len() != width {
                return Err(PipelineError::DimensionMismatch {
                    expected: width,
                    found: row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            data,
            rows: n_rows,
            cols: width,
        })
    }

    pub fn nrows(&self) -> usize {
        self.rows
    }

    pub fn ncols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn row_slice(&self, row: usize) -> &[T] {
        let start = self.offset(row, 0);
        &self.data[start..start + self.cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |r| self.row_slice(r))
    }

    pub fn column(&self, col: usize) -> Vec<T>
    where
        T: Clone,
    {
        assert!(col < self.cols, "column index out of bounds");
        (0..self.rows).map(|row| self[(row, col)].clone()).collect()
    }

    pub fn select_rows(&self, indices: &[usize]) -> Array2<T>
    where
        T: Clone,
    {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &row in indices {
            data.extend_from_slice(self.row_slice(row));
        }
        Array2 {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.data.clone()
    }
}

impl<T> Index<(usize, usize)> for Array2<T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let offset = self.offset(index.0, index.1);
        &self.data[offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_shape_vec_rejects_wrong_length() {
        let err = Array2::from_shape_vec((2, 3), vec![1.0; 5]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::DimensionMismatch {
                expected: 6,
                found: 5
            }
        );
    }

    #[test]
    fn from_rows_keeps_width_for_empty_input() {
        let x: Array2<f64> = Array2::from_rows(Vec::new(), 7).unwrap();
        assert_eq!(x.shape(), (0, 7));
        assert!(x.is_empty());
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(Array2::from_rows(rows, 2).is_err());
    }

    #[test]
    fn select_rows_and_column() {
        let x = Array2::from_shape_vec((3, 2), vec![1, 2, 3, 4, 5, 6]).unwrap();
        let picked = x.select_rows(&[2, 0]);
        assert_eq!(picked.to_vec(), vec![5, 6, 1, 2]);
        assert_eq!(x.column(1), vec![2, 4, 6]);
        assert_eq!(x.rows().count(), 3);
    }
}
