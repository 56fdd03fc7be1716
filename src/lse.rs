//! Solving the assembled linear system.
//!
//! The matrix is converted in memory to the layout of the chosen backend:
//! faer sparse factorizations for direct methods, compressed rows for the
//! Krylov methods. A failed solve is reported, never retried here.

pub mod krylov;
pub mod precond;

use crate::{
  error::SolveError,
  linalg::{
    self,
    faer::{FaerCholesky, FaerLu},
  },
  sparse::{SparseMatrix, Vector},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectMethod {
  Lu,
  /// Requires a symmetric positive definite matrix.
  Cholesky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KrylovMethod {
  /// Conjugate gradients. Requires a symmetric positive definite matrix.
  Cg,
  BiCgStab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
  Direct(DirectMethod),
  Iterative(KrylovMethod),
}

impl Default for SolverKind {
  fn default() -> Self {
    Self::Direct(DirectMethod::Lu)
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionerKind {
  #[default]
  None,
  Jacobi,
  /// Algebraic multigrid V-cycle.
  Multilevel,
  /// ILU(0).
  IncompleteLu,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
  /// Relative residual at which an iterative solve stops.
  pub tolerance: f64,
  /// Iteration cap of an iterative solve.
  pub iterations: usize,
  pub kind: SolverKind,
  pub preconditioner: PreconditionerKind,
}

impl Default for SolverConfig {
  fn default() -> Self {
    Self {
      tolerance: 1e-10,
      iterations: 1000,
      kind: SolverKind::default(),
      preconditioner: PreconditionerKind::default(),
    }
  }
}

impl SolverConfig {
  pub fn direct(method: DirectMethod) -> Self {
    Self::default().with_kind(SolverKind::Direct(method))
  }
  pub fn iterative(method: KrylovMethod, preconditioner: PreconditionerKind) -> Self {
    Self::default()
      .with_kind(SolverKind::Iterative(method))
      .with_preconditioner(preconditioner)
  }

  pub fn with_tolerance(mut self, tolerance: f64) -> Self {
    self.tolerance = tolerance;
    self
  }
  pub fn with_iterations(mut self, iterations: usize) -> Self {
    self.iterations = iterations;
    self
  }
  pub fn with_kind(mut self, kind: SolverKind) -> Self {
    self.kind = kind;
    self
  }
  pub fn with_preconditioner(mut self, preconditioner: PreconditionerKind) -> Self {
    self.preconditioner = preconditioner;
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
  /// Zero for direct methods.
  pub iterations: usize,
  /// Final relative residual.
  pub residual: f64,
}

#[derive(Debug, Clone)]
pub struct LinearSolver {
  config: SolverConfig,
}

impl LinearSolver {
  /// Fails if the backend does not support the combination of method and
  /// preconditioner.
  pub fn new(config: SolverConfig) -> Result<Self, SolveError> {
    if let SolverKind::Direct(method) = config.kind {
      if config.preconditioner != PreconditionerKind::None {
        return Err(SolveError::BackendUnavailable(format!(
          "direct {method:?} does not take a {:?} preconditioner",
          config.preconditioner
        )));
      }
    }
    if config.tolerance.is_nan() || config.tolerance <= 0.0 {
      return Err(SolveError::BackendUnavailable(format!(
        "tolerance must be positive, got {}",
        config.tolerance
      )));
    }
    Ok(Self { config })
  }

  /// Solves `matrix x = b`. `x` is the initial guess and receives the solution.
  pub fn solve(
    &self,
    matrix: &SparseMatrix,
    x: &mut Vector,
    b: &Vector,
  ) -> Result<SolveReport, SolveError> {
    let (nrows, ncols) = (matrix.nrows(), matrix.ncols());
    let mismatch = |what: &'static str, len: usize| SolveError::DimensionMismatch {
      what,
      nrows,
      ncols,
      len,
    };
    if nrows != ncols {
      return Err(mismatch("matrix columns", ncols));
    }
    if b.len() != nrows {
      return Err(mismatch("right-hand side", b.len()));
    }
    if x.len() != ncols {
      return Err(mismatch("solution", x.len()));
    }

    let config = &self.config;
    tracing::debug!(
      "solving {nrows}x{ncols} system with {} nonzeros: {:?}, {:?}",
      matrix.ntriplets(),
      config.kind,
      config.preconditioner
    );

    let report = match config.kind {
      SolverKind::Direct(method) => {
        let csc = matrix.to_nalgebra_csc();
        let solution = match method {
          DirectMethod::Lu => FaerLu::new(csc)?.solve(b),
          DirectMethod::Cholesky => FaerCholesky::new(csc)?.solve(b),
        };
        if !solution.iter().all(|v| v.is_finite()) {
          return Err(SolveError::Factorization(format!(
            "{method:?} produced non-finite values"
          )));
        }
        x.copy_from(&solution);
        let residual = linalg::relative_residual(&matrix.to_nalgebra_csr(), x, b);
        SolveReport {
          iterations: 0,
          residual,
        }
      }
      SolverKind::Iterative(method) => {
        let csr = matrix.to_nalgebra_csr();
        let precond = precond::build(config.preconditioner, &csr)?;
        let (tolerance, iterations) = (config.tolerance, config.iterations);
        let outcome = match method {
          KrylovMethod::Cg => krylov::cg(&csr, b, x, precond.as_ref(), tolerance, iterations)?,
          KrylovMethod::BiCgStab => {
            krylov::bicgstab(&csr, b, x, precond.as_ref(), tolerance, iterations)?
          }
        };
        SolveReport {
          iterations: outcome.iterations,
          residual: outcome.residual,
        }
      }
    };

    tracing::debug!(
      "solved in {} iterations, relative residual {:.3e}",
      report.iterations,
      report.residual
    );
    Ok(report)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn default_config() {
    let config = SolverConfig::default();
    assert_eq!(config.tolerance, 1e-10);
    assert_eq!(config.iterations, 1000);
    assert_eq!(config.kind, SolverKind::Direct(DirectMethod::Lu));
    assert_eq!(config.preconditioner, PreconditionerKind::None);
  }

  #[test]
  fn direct_with_preconditioner_is_unavailable() {
    let config =
      SolverConfig::direct(DirectMethod::Cholesky).with_preconditioner(PreconditionerKind::Jacobi);
    assert!(matches!(
      LinearSolver::new(config),
      Err(SolveError::BackendUnavailable(_))
    ));
    assert!(LinearSolver::new(SolverConfig::default().with_tolerance(0.0)).is_err());
  }

  #[test]
  fn dimensions_are_checked() {
    let solver = LinearSolver::new(SolverConfig::default()).unwrap();
    let matrix = SparseMatrix::square(3);
    let mut x = Vector::zeros(3);
    let err = solver.solve(&matrix, &mut x, &Vector::zeros(2)).unwrap_err();
    assert_eq!(
      err,
      SolveError::DimensionMismatch {
        what: "right-hand side",
        nrows: 3,
        ncols: 3,
        len: 2
      }
    );
  }
}
