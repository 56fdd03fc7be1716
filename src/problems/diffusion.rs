//! Transient diffusion of a cell-centered quantity with a volumetric source.
//!
//! `d(phi)/dt - div(D grad phi) = s`, implicit Euler in time.

use crate::{
  boundary::BoundaryCondition,
  equation::Equation,
  error::Error,
  lse::LinearSolver,
  sparse::Vector,
  term::{
    cell::{SourceTerm, TransientTerm},
    diffusion::DiffusionTerm,
    FaceValues,
  },
  variable::CellVariable,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TimeStepping {
  pub dt: f64,
  pub nsteps: usize,
  /// Smallest step a failed step may be split into.
  pub min_dt: f64,
}

impl TimeStepping {
  pub fn new(dt: f64, nsteps: usize) -> Self {
    Self {
      dt,
      nsteps,
      min_dt: dt / 64.0,
    }
  }

  pub fn with_min_dt(mut self, min_dt: f64) -> Self {
    self.min_dt = min_dt;
    self
  }

  /// Requires `0 < min_dt <= dt`, both finite.
  pub fn validate(&self) -> Result<(), Error> {
    let valid = self.dt.is_finite()
      && self.min_dt.is_finite()
      && self.min_dt > 0.0
      && self.min_dt <= self.dt;
    if valid {
      Ok(())
    } else {
      Err(Error::InvalidTimeStepping {
        dt: self.dt,
        min_dt: self.min_dt,
      })
    }
  }
}

/// Advances `var` by `nsteps` steps of size `dt`.
///
/// Returns the solution at the times `[t_0, t_0 + dt, ..., t_0 + nsteps dt]`.
/// A step whose linear solve does not converge is split into two halves,
/// recursively, as long as the halves are not smaller than `min_dt`.
/// If a step fails for good, `var` holds the state from before that step.
pub fn solve_transient_diffusion(
  var: &mut CellVariable,
  diffusivity: impl Into<FaceValues>,
  source: Vector,
  boundary_conditions: &[&dyn BoundaryCondition],
  stepping: &TimeStepping,
  solver: &LinearSolver,
) -> Result<Vec<Vector>, Error> {
  stepping.validate()?;
  let equation = Equation::new()
    .with_cell_term(TransientTerm::default())
    .with_face_term(DiffusionTerm::new(diffusivity))
    .with_cell_term(SourceTerm::new(source));

  var.update_old();
  let mut solution = Vec::with_capacity(stepping.nsteps + 1);
  solution.push(var.values().clone());

  for istep in 0..stepping.nsteps {
    tracing::info!(
      "diffusion step {}/{}, t={:.3e}",
      istep + 1,
      stepping.nsteps,
      (istep + 1) as f64 * stepping.dt
    );
    advance(
      &equation,
      var,
      boundary_conditions,
      solver,
      stepping.dt,
      stepping.min_dt,
    )?;
    solution.push(var.values().clone());
  }

  Ok(solution)
}

fn advance(
  equation: &Equation,
  var: &mut CellVariable,
  boundary_conditions: &[&dyn BoundaryCondition],
  solver: &LinearSolver,
  dt: f64,
  min_dt: f64,
) -> Result<(), Error> {
  match equation.solve(var, boundary_conditions, dt, solver) {
    Ok(report) => {
      tracing::debug!("step dt={dt:.3e} took {} iterations", report.iterations);
      var.update_old();
      Ok(())
    }
    Err(err) if err.is_convergence_failure() && 0.5 * dt >= min_dt => {
      tracing::warn!("{err}; retrying with two steps of dt={:.3e}", 0.5 * dt);
      let (values, old) = (var.values().clone(), var.old().clone());
      let halves = advance(equation, var, boundary_conditions, solver, 0.5 * dt, min_dt)
        .and_then(|()| advance(equation, var, boundary_conditions, solver, 0.5 * dt, min_dt));
      if halves.is_err() {
        var.restore(&values, &old);
      }
      halves
    }
    Err(err) => Err(err),
  }
}
