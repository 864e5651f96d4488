//! Dense row-major storage for point sets, medoid coordinates and distance tables.

use crate::error::{Error, Result};

/// A row-major matrix with a fixed row capacity.
///
/// Rows are either allocated up front ([`Matrix::filled`]) or appended one at a time
/// ([`Matrix::with_capacity`] + [`Matrix::append`]); the backing storage never
/// reallocates past the capacity it was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
    capacity: usize,
}

impl<T: Copy> Matrix<T> {
    /// An empty matrix able to hold `capacity` rows of width `cols`.
    pub fn with_capacity(capacity: usize, cols: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity * cols),
            rows: 0,
            cols,
            capacity,
        }
    }

    /// A full `rows x cols` matrix where every cell is `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: vec![value; rows * cols],
            rows,
            cols,
            capacity: rows,
        }
    }

    /// Takes ownership of row-major `data`; its length must be a multiple of `cols`.
    pub fn from_flat(data: Vec<T>, cols: usize) -> Result<Self> {
        if cols == 0 || data.len() % cols != 0 {
            return Err(Error::DimensionMismatch {
                expected: cols,
                actual: data.len(),
            });
        }

        let rows = data.len() / cols;
        Ok(Self {
            data,
            rows,
            cols,
            capacity: rows,
        })
    }

    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |row| row.as_ref().len());
        let mut matrix = Self::with_capacity(rows.len(), cols);
        for row in rows {
            matrix.append(row.as_ref())?;
        }
        Ok(matrix)
    }

    /// Copies the rows at `indices`, in that order, into a new matrix.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }

        Self {
            data,
            rows: indices.len(),
            cols: self.cols,
            capacity: indices.len(),
        }
    }

    /// Appends a row, failing rather than growing once the capacity is reached.
    pub fn append(&mut self, row: &[T]) -> Result<()> {
        if self.rows >= self.capacity {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        if row.len() != self.cols {
            return Err(Error::DimensionMismatch {
                expected: self.cols,
                actual: row.len(),
            });
        }

        self.data.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        debug_assert!(i < self.rows, "row {} out of bounds for {} rows", i, self.rows);
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn try_row(&self, i: usize) -> Result<&[T]> {
        if i >= self.rows {
            return Err(Error::IndexOutOfBounds {
                index: i,
                len: self.rows,
            });
        }
        Ok(self.row(i))
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.rows && j < self.cols);
        self.data[i * self.cols + j]
    }

    pub fn try_at(&self, i: usize, j: usize) -> Result<T> {
        if i >= self.rows {
            return Err(Error::IndexOutOfBounds {
                index: i,
                len: self.rows,
            });
        }
        if j >= self.cols {
            return Err(Error::IndexOutOfBounds {
                index: j,
                len: self.cols,
            });
        }
        Ok(self.at(i, j))
    }

    /// Column `j` walked top to bottom with a stride of one row.
    pub fn column(&self, j: usize) -> impl Iterator<Item = T> + '_ {
        debug_assert!(j < self.cols);
        self.data.iter().skip(j).step_by(self.cols.max(1)).copied()
    }

    /// Copies `values` (one per row) into column `j`.
    pub fn set_column<I: IntoIterator<Item = T>>(&mut self, j: usize, values: I) {
        debug_assert!(j < self.cols);
        let cols = self.cols;
        for (cell, value) in self.data.iter_mut().skip(j).step_by(cols).zip(values) {
            *cell = value;
        }
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    pub fn fill(&mut self, value: T) {
        for cell in &mut self.data {
            *cell = value;
        }
    }

    /// Drops all rows but keeps the capacity.
    pub fn clear(&mut self) {
        self.data.clear();
        self.rows = 0;
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}
