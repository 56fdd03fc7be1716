//! Preconditioned Krylov subspace methods on compressed row matrices.
//!
//! Convergence is measured by the relative residual `|b - A x| / |b|`.
//! `x` holds the initial guess on entry and the last iterate on exit, also
//! when the iteration fails.

use super::precond::Preconditioner;
use crate::{error::SolveError, sparse::Vector};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KrylovOutcome {
  pub iterations: usize,
  pub residual: f64,
}

fn converged(iterations: usize, residual: f64) -> Result<KrylovOutcome, SolveError> {
  Ok(KrylovOutcome {
    iterations,
    residual,
  })
}

/// Conjugate gradients for symmetric positive definite systems.
pub fn cg(
  a: &nas::CsrMatrix<f64>,
  b: &Vector,
  x: &mut Vector,
  precond: &dyn Preconditioner,
  tolerance: f64,
  max_iterations: usize,
) -> Result<KrylovOutcome, SolveError> {
  let bnorm = b.norm();
  if bnorm == 0.0 {
    x.fill(0.0);
    return converged(0, 0.0);
  }

  let mut r = b - a * &*x;
  let mut residual = r.norm() / bnorm;
  if residual <= tolerance {
    return converged(0, residual);
  }

  let mut z = precond.apply(&r);
  let mut p = z.clone();
  let mut rz = r.dot(&z);

  for iteration in 1..=max_iterations {
    let q = a * &p;
    let pq = p.dot(&q);
    if pq == 0.0 || !pq.is_finite() {
      return Err(SolveError::Breakdown {
        method: "CG",
        iteration,
      });
    }
    let alpha = rz / pq;
    x.axpy(alpha, &p, 1.0);
    r.axpy(-alpha, &q, 1.0);

    residual = r.norm() / bnorm;
    if residual <= tolerance {
      return converged(iteration, residual);
    }

    z = precond.apply(&r);
    let rz_next = r.dot(&z);
    let beta = rz_next / rz;
    p = &z + beta * p;
    rz = rz_next;
  }

  Err(SolveError::ConvergenceFailure {
    iterations: max_iterations,
    residual,
    tolerance,
  })
}

/// Right preconditioned BiCGSTAB for general nonsingular systems.
pub fn bicgstab(
  a: &nas::CsrMatrix<f64>,
  b: &Vector,
  x: &mut Vector,
  precond: &dyn Preconditioner,
  tolerance: f64,
  max_iterations: usize,
) -> Result<KrylovOutcome, SolveError> {
  let bnorm = b.norm();
  if bnorm == 0.0 {
    x.fill(0.0);
    return converged(0, 0.0);
  }

  let mut r = b - a * &*x;
  let mut residual = r.norm() / bnorm;
  if residual <= tolerance {
    return converged(0, residual);
  }

  let shadow = r.clone();
  let mut p = r.clone();
  let mut v = Vector::zeros(r.len());
  let (mut rho, mut alpha, mut omega) = (1.0, 1.0, 1.0);
  let breakdown = |iteration| SolveError::Breakdown {
    method: "BiCGSTAB",
    iteration,
  };

  for iteration in 1..=max_iterations {
    let rho_next = shadow.dot(&r);
    if rho_next == 0.0 || !rho_next.is_finite() {
      return Err(breakdown(iteration));
    }
    if iteration > 1 {
      let beta = (rho_next / rho) * (alpha / omega);
      p = &r + beta * (p - omega * &v);
    }
    rho = rho_next;

    let p_hat = precond.apply(&p);
    v = a * &p_hat;
    let shadow_v = shadow.dot(&v);
    if shadow_v == 0.0 {
      return Err(breakdown(iteration));
    }
    alpha = rho / shadow_v;
    let s = &r - alpha * &v;

    let s_residual = s.norm() / bnorm;
    if s_residual <= tolerance {
      x.axpy(alpha, &p_hat, 1.0);
      return converged(iteration, s_residual);
    }

    let s_hat = precond.apply(&s);
    let t = a * &s_hat;
    let tt = t.dot(&t);
    if tt == 0.0 {
      return Err(breakdown(iteration));
    }
    omega = t.dot(&s) / tt;

    x.axpy(alpha, &p_hat, 1.0);
    x.axpy(omega, &s_hat, 1.0);
    r = s - omega * &t;

    residual = r.norm() / bnorm;
    if residual <= tolerance {
      return converged(iteration, residual);
    }
    if omega == 0.0 {
      return Err(breakdown(iteration));
    }
  }

  Err(SolveError::ConvergenceFailure {
    iterations: max_iterations,
    residual,
    tolerance,
  })
}
