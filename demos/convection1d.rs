//! Steady 1D convection diffusion with every convection scheme, compared to
//! the exact exponential boundary layer profile.

use finvol::{
  boundary::{BoundaryCondition, FixedValue},
  lse::{LinearSolver, SolverConfig},
  mesh::cartesian::{CartesianGrid, Side},
  problems::convection_diffusion::solve_steady_convection_diffusion,
  term::convection::ConvectionScheme,
  variable::CellVariable,
};

fn main() -> Result<(), finvol::Error> {
  tracing_subscriber::fmt::init();

  let ncells = 40;
  let grid = CartesianGrid::new_1d(ncells, 1.0 / ncells as f64)?;
  let mesh = grid.mesh();
  let inlet = FixedValue::new(mesh, &grid.faces_on(Side::Left), 1.0)?;
  let outlet = FixedValue::new(mesh, &grid.faces_on(Side::Right), 0.0)?;
  let bcs: [&dyn BoundaryCondition; 2] = [&inlet, &outlet];

  let velocity = 1.0;
  let diffusivity = 0.05;
  let peclet: f64 = velocity / diffusivity;
  let exact = |x: f64| (peclet.exp() - (peclet * x).exp()) / peclet.exp_m1();

  let solver = LinearSolver::new(SolverConfig::default())?;
  let centers = grid.cell_centers();
  for scheme in [
    ConvectionScheme::Upwind,
    ConvectionScheme::Central,
    ConvectionScheme::Exponential,
    ConvectionScheme::PowerLaw,
  ] {
    let mut var = CellVariable::uniform(mesh, 0.0);
    solve_steady_convection_diffusion(&mut var, &[velocity], diffusivity, scheme, &bcs, &solver)?;
    let error = centers
      .row(0)
      .iter()
      .zip(var.values().iter())
      .map(|(&x, &phi)| (phi - exact(x)).abs())
      .fold(0.0, f64::max);
    println!("{scheme:?}: max error {error:.3e}");
  }
  Ok(())
}
