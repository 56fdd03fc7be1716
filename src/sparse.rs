//! Accumulation targets of the assembly: a triplet sparse matrix and
//! additive writes into dense vectors.
//!
//! Repeated entries are never overwritten, they sum. Two interior faces sharing
//! a cell, or an interior face and a boundary condition hitting the same
//! diagonal, both rely on this.

use crate::error::AssemblyError;

pub type Vector = na::DVector<f64>;

#[derive(Default, Debug, Clone)]
pub struct SparseMatrix {
  nrows: usize,
  ncols: usize,
  triplets: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
  pub fn zeros(nrows: usize, ncols: usize) -> Self {
    Self {
      nrows,
      ncols,
      triplets: Vec::new(),
    }
  }
  pub fn square(size: usize) -> Self {
    Self::zeros(size, size)
  }

  pub fn nrows(&self) -> usize {
    self.nrows
  }
  pub fn ncols(&self) -> usize {
    self.ncols
  }
  pub fn ntriplets(&self) -> usize {
    self.triplets.len()
  }

  pub fn push(&mut self, r: usize, c: usize, v: f64) -> Result<(), AssemblyError> {
    AssemblyError::check_index("matrix row", r, self.nrows)?;
    AssemblyError::check_index("matrix column", c, self.ncols)?;
    if v != 0.0 {
      self.triplets.push((r, c, v));
    }
    Ok(())
  }

  /// Accumulates `values[k]` into entry `(rows[k], cols[k])` for every `k`.
  ///
  /// Either all entries are added or, on a length or index error, none.
  pub fn add_at(
    &mut self,
    values: &[f64],
    rows: &[usize],
    cols: &[usize],
  ) -> Result<(), AssemblyError> {
    AssemblyError::check_len("add_at rows", values.len(), rows.len())?;
    AssemblyError::check_len("add_at columns", values.len(), cols.len())?;
    for (&r, &c) in rows.iter().zip(cols) {
      AssemblyError::check_index("matrix row", r, self.nrows)?;
      AssemblyError::check_index("matrix column", c, self.ncols)?;
    }
    self.triplets.extend(
      itertools::izip!(rows, cols, values)
        .filter(|(_, _, &v)| v != 0.0)
        .map(|(&r, &c, &v)| (r, c, v)),
    );
    Ok(())
  }

  /// Adds all entries of `other` into `self`.
  pub fn add_assign(&mut self, other: SparseMatrix) -> Result<(), AssemblyError> {
    AssemblyError::check_len("summand rows", self.nrows, other.nrows)?;
    AssemblyError::check_len("summand columns", self.ncols, other.ncols)?;
    self.triplets.extend(other.triplets);
    Ok(())
  }

  pub fn to_nalgebra_coo(&self) -> nas::CooMatrix<f64> {
    let mut coo = nas::CooMatrix::new(self.nrows, self.ncols);
    for &(r, c, v) in &self.triplets {
      coo.push(r, c, v);
    }
    coo
  }

  /// Compressed rows with duplicate entries summed.
  pub fn to_nalgebra_csr(&self) -> nas::CsrMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_csc(&self) -> nas::CscMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn to_nalgebra_dense(&self) -> na::DMatrix<f64> {
    (&self.to_nalgebra_coo()).into()
  }

  pub fn mul_vec(&self, x: &Vector) -> Vector {
    let mut y = Vector::zeros(self.nrows);
    for &(r, c, v) in &self.triplets {
      y[r] += v * x[c];
    }
    y
  }
}

/// Indexed additive writes into a dense vector.
pub trait PutAddExt {
  /// Adds `values[k]` to entry `indices[k]` for every `k`, summing repeats.
  fn put_add(&mut self, indices: &[usize], values: &[f64]) -> Result<(), AssemblyError>;
}

impl PutAddExt for Vector {
  fn put_add(&mut self, indices: &[usize], values: &[f64]) -> Result<(), AssemblyError> {
    AssemblyError::check_len("put_add indices", values.len(), indices.len())?;
    let len = self.len();
    for &i in indices {
      AssemblyError::check_index("vector", i, len)?;
    }
    for (&i, &v) in indices.iter().zip(values) {
      self[i] += v;
    }
    Ok(())
  }
}
