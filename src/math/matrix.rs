use std::error::Error;
use std::fmt;
use std::ops::{Index, IndexMut, Range};

/// Row-major 2D container for feature matrices.
///
/// Rows are examples, columns are features. Row order carries the time
/// ordering of the training data, so row slicing is the primitive the
/// expanding-window folds are built on.
#[derive(Clone, Debug, PartialEq)]
pub struct Array2<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> Array2<T> {
    pub fn from_shape_vec(shape: (usize, usize), data: Vec<T>) -> Result<Self, ShapeError> {
        let (rows, cols) = shape;
        if data.len() != rows * cols {
            return Err(ShapeError {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
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

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn row_slice(&self, row: usize) -> &[T] {
        let start = self.offset(row, 0);
        &self.data[start..start + self.cols]
    }

    /// Copy of a contiguous range of rows, preserving their order.
    pub fn slice_rows(&self, range: Range<usize>) -> Array2<T>
    where
        T: Clone,
    {
        assert!(
            range.start <= range.end && range.end <= self.rows,
            "row slice out of bounds"
        );
        let start = self.offset(range.start, 0);
        let end = self.offset(range.end, 0);
        Array2 {
            data: self.data[start..end].to_vec(),
            rows: range.end - range.start,
            cols: self.cols,
        }
    }
}

impl<T> Index<(usize, usize)> for Array2<T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let offset = self.offset(index.0, index.1);
        &self.data[offset]
    }
}

impl<T> IndexMut<(usize, usize)> for Array2<T> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        let offset = self.offset(index.0, index.1);
        &mut self.data[offset]
    }
}

#[derive(Debug, Clone)]
pub struct ShapeError {
    rows: usize,
    cols: usize,
    len: usize,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid shape ({}, {}) for buffer of length {}",
            self.rows, self.cols, self.len
        )
    }
}

impl Error for ShapeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_and_row_access() {
        let m = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.row_slice(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m[(0, 2)], 3.0);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = Array2::from_shape_vec((2, 3), vec![1.0, 2.0]).unwrap_err();
        assert!(err.to_string().contains("length 2"));
    }

    #[test]
    fn slice_rows_preserves_order() {
        let m = Array2::from_shape_vec((4, 2), vec![0, 0, 1, 1, 2, 2, 3, 3]).unwrap();
        let s = m.slice_rows(1..3);
        assert_eq!(s.shape(), (2, 2));
        assert_eq!(s.row_slice(0), &[1, 1]);
        assert_eq!(s.row_slice(1), &[2, 2]);
    }
}
