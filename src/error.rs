use crate::term::Treatment;

/// Failures while turning terms into a linear system.
///
/// Any of these aborts the whole assembly call, no partial system is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssemblyError {
  #[error("shape mismatch for {what}: expected length {expected}, found {found}")]
  ShapeMismatch {
    what: &'static str,
    expected: usize,
    found: usize,
  },
  #[error("{what} index {index} out of range 0..{len}")]
  IndexOutOfRange {
    what: &'static str,
    index: usize,
    len: usize,
  },
  #[error("weight set has no {0} group")]
  MissingWeightGroup(Treatment),
  #[error("face {0} is not an exterior face")]
  NotExteriorFace(usize),
  #[error("face {0} connects a cell to itself")]
  DegenerateFace(usize),
}

impl AssemblyError {
  pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), Self> {
    if expected == found {
      Ok(())
    } else {
      Err(Self::ShapeMismatch {
        what,
        expected,
        found,
      })
    }
  }

  pub(crate) fn check_index(what: &'static str, index: usize, len: usize) -> Result<(), Self> {
    if index < len {
      Ok(())
    } else {
      Err(Self::IndexOutOfRange { what, index, len })
    }
  }
}

/// Failures of the linear solve, kept apart from [`AssemblyError`] so callers
/// can tell a malformed discretization from a solve that needs a smaller step.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
  #[error(
    "no convergence after {iterations} iterations (residual {residual:.3e}, tolerance {tolerance:.3e})"
  )]
  ConvergenceFailure {
    iterations: usize,
    residual: f64,
    tolerance: f64,
  },
  #[error("{method} broke down at iteration {iteration}")]
  Breakdown {
    method: &'static str,
    iteration: usize,
  },
  #[error("backend unavailable: {0}")]
  BackendUnavailable(String),
  #[error("factorization failed: {0}")]
  Factorization(String),
  #[error("linear system is {nrows}x{ncols} but {what} has length {len}")]
  DimensionMismatch {
    what: &'static str,
    nrows: usize,
    ncols: usize,
    len: usize,
  },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
  #[error(transparent)]
  Assembly(#[from] AssemblyError),
  #[error(transparent)]
  Solve(#[from] SolveError),
  #[error("invalid time stepping: dt={dt}, min_dt={min_dt}, need 0 < min_dt <= dt")]
  InvalidTimeStepping { dt: f64, min_dt: f64 },
}

impl Error {
  pub fn is_convergence_failure(&self) -> bool {
    matches!(self, Self::Solve(SolveError::ConvergenceFailure { .. }))
  }
}
