//! Steady convection diffusion, `div(u phi) - div(D grad phi) = 0`.

use crate::{
  boundary::BoundaryCondition,
  equation::Equation,
  error::Error,
  lse::{LinearSolver, SolveReport},
  term::{
    convection::{ConvectionScheme, ConvectionTerm},
    diffusion::DiffusionTerm,
  },
  variable::CellVariable,
};

pub fn solve_steady_convection_diffusion(
  var: &mut CellVariable,
  velocity: &[f64],
  diffusivity: f64,
  scheme: ConvectionScheme,
  boundary_conditions: &[&dyn BoundaryCondition],
  solver: &LinearSolver,
) -> Result<SolveReport, Error> {
  let equation = Equation::new()
    .with_face_term(DiffusionTerm::new(diffusivity))
    .with_face_term(ConvectionTerm::uniform(velocity, scheme).with_diffusivity(diffusivity));

  // no time derivative, the step size is never read
  let dt = 1.0;
  let report = equation.solve(var, boundary_conditions, dt, solver)?;
  var.update_old();
  tracing::info!(
    "steady {scheme:?} convection diffusion solved, residual {:.3e}",
    report.residual
  );
  Ok(report)
}
