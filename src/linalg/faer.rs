//! In-memory handoff of assembled systems to the faer sparse factorizations.

use faer::solvers::SpSolver;

use crate::{error::SolveError, sparse::Vector};

type SparseMatrixFaer = faer::sparse::SparseColMat<usize, f64>;

pub fn nalgebra2faer(m: nas::CscMatrix<f64>) -> SparseMatrixFaer {
  let nrows = m.nrows();
  let ncols = m.ncols();
  let (col_ptrs, row_indices, values) = m.disassemble();

  let symbolic =
    faer::sparse::SymbolicSparseColMat::new_checked(nrows, ncols, col_ptrs, None, row_indices);
  faer::sparse::SparseColMat::new(symbolic, values)
}

pub fn faervec2navec(faer: faer::col::ColRef<f64>) -> Vector {
  Vector::from_iterator(faer.nrows(), (0..faer.nrows()).map(|i| faer.read(i)))
}

fn check_square(m: &nas::CscMatrix<f64>) -> Result<(), SolveError> {
  if m.nrows() == m.ncols() {
    Ok(())
  } else {
    Err(SolveError::DimensionMismatch {
      what: "matrix columns",
      nrows: m.nrows(),
      ncols: m.ncols(),
      len: m.ncols(),
    })
  }
}

pub struct FaerLu {
  raw: faer::sparse::linalg::solvers::Lu<usize, f64>,
}
impl FaerLu {
  pub fn new(a: nas::CscMatrix<f64>) -> Result<Self, SolveError> {
    check_square(&a)?;
    let raw = nalgebra2faer(a)
      .sp_lu()
      .map_err(|err| SolveError::Factorization(format!("sparse LU: {err:?}")))?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &Vector) -> Vector {
    let b = faer::col::from_slice(b.as_slice());
    faervec2navec(self.raw.solve(b).as_ref())
  }
}

pub struct FaerCholesky {
  raw: faer::sparse::linalg::solvers::Cholesky<usize, f64>,
}
impl FaerCholesky {
  /// Only the upper triangle of `a` is read.
  pub fn new(a: nas::CscMatrix<f64>) -> Result<Self, SolveError> {
    check_square(&a)?;
    let raw = nalgebra2faer(a)
      .sp_cholesky(faer::Side::Upper)
      .map_err(|err| SolveError::Factorization(format!("sparse Cholesky: {err:?}")))?;
    Ok(Self { raw })
  }

  pub fn solve(&self, b: &Vector) -> Vector {
    let b = faer::col::from_slice(b.as_slice());
    faervec2navec(self.raw.solve(b).as_ref())
  }
}
