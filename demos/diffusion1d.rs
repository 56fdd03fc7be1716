//! Heat diffusion in a 1D rod with a heated left end and a uniform sink,
//! advanced with implicit Euler until close to the steady state.

extern crate nalgebra as na;

use finvol::{
  boundary::{BoundaryCondition, FixedFlux, FixedValue},
  lse::{KrylovMethod, LinearSolver, PreconditionerKind, SolverConfig},
  mesh::cartesian::{CartesianGrid, Side},
  problems::diffusion::{solve_transient_diffusion, TimeStepping},
  variable::CellVariable,
};

fn main() -> Result<(), finvol::Error> {
  tracing_subscriber::fmt::init();

  let ncells = 50;
  let length = 1.0;
  let grid = CartesianGrid::new_1d(ncells, length / ncells as f64)?;
  let mesh = grid.mesh();

  let hot = FixedValue::new(mesh, &grid.faces_on(Side::Left), 1.0)?;
  let insulated = FixedFlux::new(mesh, &grid.faces_on(Side::Right), 0.0)?;
  let bcs: [&dyn BoundaryCondition; 2] = [&hot, &insulated];

  let diffusivity = 1.0;
  let sink = na::DVector::from_element(ncells, -0.5);

  let final_time = 2.0;
  let nsteps = 40;
  let stepping = TimeStepping::new(final_time / nsteps as f64, nsteps);

  let solver = LinearSolver::new(SolverConfig::iterative(
    KrylovMethod::Cg,
    PreconditionerKind::Multilevel,
  ))?;

  let mut var = CellVariable::uniform(mesh, 0.0);
  let solution =
    solve_transient_diffusion(&mut var, diffusivity, sink, &bcs, &stepping, &solver)?;

  // steady state: phi = 1 - s x (2 L - x) / (2 D) with s = 0.5
  let centers = grid.cell_centers();
  let error = centers
    .row(0)
    .iter()
    .zip(var.values().iter())
    .map(|(&x, &phi)| (phi - (1.0 - 0.5 * x * (2.0 * length - x) / (2.0 * diffusivity))).abs())
    .fold(0.0, f64::max);

  println!("computed {} states", solution.len());
  println!("final state: {:.4}", var.values().transpose());
  println!("max deviation from steady state: {error:.3e}");
  Ok(())
}
