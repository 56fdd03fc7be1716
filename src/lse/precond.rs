//! Preconditioners for the Krylov solvers.

use super::PreconditionerKind;
use crate::{
  error::SolveError,
  linalg::{faer::FaerLu, inverse_diagonal},
  sparse::Vector,
};

/// Approximate inverse `z = M^-1 r`.
pub trait Preconditioner {
  fn apply(&self, r: &Vector) -> Vector;
}

pub fn build(
  kind: PreconditionerKind,
  a: &nas::CsrMatrix<f64>,
) -> Result<Box<dyn Preconditioner>, SolveError> {
  Ok(match kind {
    PreconditionerKind::None => Box::new(Identity),
    PreconditionerKind::Jacobi => Box::new(Jacobi::new(a)?),
    PreconditionerKind::IncompleteLu => Box::new(Ilu0::new(a)?),
    PreconditionerKind::Multilevel => Box::new(Multilevel::new(a)?),
  })
}

fn zero_diagonal(preconditioner: &str) -> SolveError {
  SolveError::Factorization(format!("{preconditioner}: zero diagonal entry"))
}

pub struct Identity;
impl Preconditioner for Identity {
  fn apply(&self, r: &Vector) -> Vector {
    r.clone()
  }
}

pub struct Jacobi {
  inv_diag: Vector,
}
impl Jacobi {
  pub fn new(a: &nas::CsrMatrix<f64>) -> Result<Self, SolveError> {
    let inv_diag = inverse_diagonal(a).ok_or_else(|| zero_diagonal("Jacobi"))?;
    Ok(Self { inv_diag })
  }
}
impl Preconditioner for Jacobi {
  fn apply(&self, r: &Vector) -> Vector {
    r.component_mul(&self.inv_diag)
  }
}

/// Incomplete LU factorization without fill-in.
///
/// `L` (unit diagonal, not stored) and `U` share the sparsity pattern of the
/// matrix and are stored in one set of CSR arrays.
pub struct Ilu0 {
  row_offsets: Vec<usize>,
  col_indices: Vec<usize>,
  values: Vec<f64>,
  diag_pos: Vec<usize>,
}

impl Ilu0 {
  pub fn new(a: &nas::CsrMatrix<f64>) -> Result<Self, SolveError> {
    let n = a.nrows();
    let row_offsets = a.row_offsets().to_vec();
    let col_indices = a.col_indices().to_vec();
    let mut values = a.values().to_vec();

    let mut diag_pos = Vec::with_capacity(n);
    for i in 0..n {
      let row = row_offsets[i]..row_offsets[i + 1];
      let pos = row
        .clone()
        .find(|&p| col_indices[p] == i)
        .ok_or_else(|| zero_diagonal("ILU(0)"))?;
      diag_pos.push(pos);
    }

    const UNSET: usize = usize::MAX;
    let mut marker = vec![UNSET; n];
    for i in 0..n {
      let row = row_offsets[i]..row_offsets[i + 1];
      for p in row.clone() {
        marker[col_indices[p]] = p;
      }

      for p in row.clone() {
        let k = col_indices[p];
        if k >= i {
          break;
        }
        let pivot = values[diag_pos[k]];
        if pivot == 0.0 {
          return Err(zero_diagonal("ILU(0)"));
        }
        values[p] /= pivot;
        let factor = values[p];
        for q in diag_pos[k] + 1..row_offsets[k + 1] {
          let target = marker[col_indices[q]];
          if target != UNSET {
            let update = factor * values[q];
            values[target] -= update;
          }
        }
      }

      for p in row {
        marker[col_indices[p]] = UNSET;
      }
      if values[diag_pos[i]] == 0.0 {
        return Err(zero_diagonal("ILU(0)"));
      }
    }

    Ok(Self {
      row_offsets,
      col_indices,
      values,
      diag_pos,
    })
  }
}

impl Preconditioner for Ilu0 {
  fn apply(&self, r: &Vector) -> Vector {
    let n = r.len();
    let mut x = r.clone();

    // L y = r
    for i in 0..n {
      let mut sum = x[i];
      for p in self.row_offsets[i]..self.diag_pos[i] {
        sum -= self.values[p] * x[self.col_indices[p]];
      }
      x[i] = sum;
    }
    // U x = y
    for i in (0..n).rev() {
      let mut sum = x[i];
      for p in self.diag_pos[i] + 1..self.row_offsets[i + 1] {
        sum -= self.values[p] * x[self.col_indices[p]];
      }
      x[i] = sum / self.values[self.diag_pos[i]];
    }
    x
  }
}

/// Strength threshold of the aggregation.
const STRENGTH_THRESHOLD: f64 = 0.08;
/// Levels at or below this size are solved directly.
const COARSE_SIZE: usize = 64;
const MAX_LEVELS: usize = 10;
const JACOBI_DAMPING: f64 = 2.0 / 3.0;
const SMOOTHING_SWEEPS: usize = 2;

struct Level {
  a: nas::CsrMatrix<f64>,
  prolongation: nas::CsrMatrix<f64>,
  restriction: nas::CsrMatrix<f64>,
  inv_diag: Vector,
}

/// Aggregation based algebraic multigrid, applied as one V-cycle.
///
/// Piecewise constant prolongation over aggregates of strongly connected
/// cells, Galerkin coarse operators `P^T A P` and damped Jacobi smoothing.
/// The coarsest level is factorized.
pub struct Multilevel {
  levels: Vec<Level>,
  coarse: FaerLu,
}

impl Multilevel {
  pub fn new(a: &nas::CsrMatrix<f64>) -> Result<Self, SolveError> {
    let mut levels = Vec::new();
    let mut current = a.clone();

    while current.nrows() > COARSE_SIZE && levels.len() < MAX_LEVELS {
      let (aggregates, naggregates) = aggregate(&current, STRENGTH_THRESHOLD);
      if naggregates >= current.nrows() {
        break;
      }
      let prolongation = tentative_prolongation(&aggregates, naggregates);
      let restriction = prolongation.transpose();
      let coarse = &(&restriction * &current) * &prolongation;
      let inv_diag = inverse_diagonal(&current).ok_or_else(|| zero_diagonal("multilevel"))?;

      tracing::debug!(
        "multilevel: level {} with {} rows, coarsened to {}",
        levels.len(),
        current.nrows(),
        naggregates
      );
      levels.push(Level {
        a: current,
        prolongation,
        restriction,
        inv_diag,
      });
      current = coarse;
    }

    let coarse = FaerLu::new(nas::CscMatrix::from(&current))?;
    Ok(Self { levels, coarse })
  }

  pub fn nlevels(&self) -> usize {
    self.levels.len() + 1
  }

  fn vcycle(&self, ilevel: usize, b: &Vector) -> Vector {
    let Some(level) = self.levels.get(ilevel) else {
      return self.coarse.solve(b);
    };

    let mut x = Vector::zeros(b.len());
    smooth(level, &mut x, b);
    let residual = b - &level.a * &x;
    let coarse_residual = &level.restriction * &residual;
    let coarse_correction = self.vcycle(ilevel + 1, &coarse_residual);
    x += &level.prolongation * &coarse_correction;
    smooth(level, &mut x, b);
    x
  }
}

impl Preconditioner for Multilevel {
  fn apply(&self, r: &Vector) -> Vector {
    self.vcycle(0, r)
  }
}

fn smooth(level: &Level, x: &mut Vector, b: &Vector) {
  for _ in 0..SMOOTHING_SWEEPS {
    let residual = b - &level.a * &*x;
    x.axpy(JACOBI_DAMPING, &residual.component_mul(&level.inv_diag), 1.0);
  }
}

/// Strongly connected neighbours: `|a_ij| >= theta sqrt(|a_ii a_jj|)`.
fn strong_neighbours(a: &nas::CsrMatrix<f64>, theta: f64) -> Vec<Vec<usize>> {
  let n = a.nrows();
  let mut diag = vec![0.0; n];
  for (r, c, &v) in a.triplet_iter() {
    if r == c {
      diag[r] += v;
    }
  }

  let mut neighbours = vec![Vec::new(); n];
  for (r, c, &v) in a.triplet_iter() {
    if r != c && v.abs() >= theta * (diag[r] * diag[c]).abs().sqrt() {
      neighbours[r].push(c);
    }
  }
  neighbours
}

/// Greedy aggregation. Returns the aggregate of every row and the number of
/// aggregates.
fn aggregate(a: &nas::CsrMatrix<f64>, theta: f64) -> (Vec<usize>, usize) {
  let n = a.nrows();
  let neighbours = strong_neighbours(a, theta);
  let mut aggregates: Vec<Option<usize>> = vec![None; n];
  let mut naggregates = 0;

  // seeds whose whole neighbourhood is free
  for i in 0..n {
    if aggregates[i].is_some() || neighbours[i].iter().any(|&j| aggregates[j].is_some()) {
      continue;
    }
    aggregates[i] = Some(naggregates);
    for &j in &neighbours[i] {
      aggregates[j] = Some(naggregates);
    }
    naggregates += 1;
  }

  // attach leftovers to a neighbouring aggregate
  let seeded = aggregates.clone();
  for i in 0..n {
    if aggregates[i].is_none() {
      aggregates[i] = neighbours[i].iter().find_map(|&j| seeded[j]);
    }
  }

  // isolated leftovers form their own aggregates
  for i in 0..n {
    if aggregates[i].is_none() {
      aggregates[i] = Some(naggregates);
      for &j in &neighbours[i] {
        if aggregates[j].is_none() {
          aggregates[j] = Some(naggregates);
        }
      }
      naggregates += 1;
    }
  }

  let aggregates = aggregates
    .into_iter()
    .map(|agg| agg.unwrap_or_default())
    .collect();
  (aggregates, naggregates)
}

fn tentative_prolongation(aggregates: &[usize], naggregates: usize) -> nas::CsrMatrix<f64> {
  let mut coo = nas::CooMatrix::new(aggregates.len(), naggregates);
  for (i, &agg) in aggregates.iter().enumerate() {
    coo.push(i, agg, 1.0);
  }
  nas::CsrMatrix::from(&coo)
}
