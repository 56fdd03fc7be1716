//! Hand the assembled systems to every solver backend and compare the
//! solutions with a direct LU solve.

extern crate nalgebra as na;

use finvol::{
  assemble::TermAssembler,
  boundary::{BoundaryCondition, FixedValue, ZeroGradient},
  linalg::DMatrixExt,
  lse::{
    DirectMethod, KrylovMethod, LinearSolver, PreconditionerKind, SolveReport, SolverConfig,
  },
  mesh::{
    boundary::exterior_faces_facing,
    cartesian::{CartesianGrid, Side},
  },
  sparse::{SparseMatrix, Vector},
  term::{
    convection::{ConvectionScheme, ConvectionTerm},
    diffusion::DiffusionTerm,
  },
  variable::CellVariable,
  SolveError,
};

use approx::assert_relative_eq;

const PRECONDITIONERS: [PreconditionerKind; 4] = [
  PreconditionerKind::None,
  PreconditionerKind::Jacobi,
  PreconditionerKind::IncompleteLu,
  PreconditionerKind::Multilevel,
];

fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_test_writer()
    .try_init();
}

/// Diffusion on a 20x20 grid with fixed values left and right.
fn diffusion_system() -> (SparseMatrix, Vector) {
  let grid = CartesianGrid::new_2d(20, 20, 0.05, 0.05).unwrap();
  let mesh = grid.mesh();
  let left = FixedValue::new(mesh, &grid.faces_on(Side::Left), 1.0).unwrap();
  let right = FixedValue::new(mesh, &grid.faces_on(Side::Right), -1.0).unwrap();
  let var = CellVariable::uniform(mesh, 0.0);
  TermAssembler::default()
    .assemble(&DiffusionTerm::new(1.0), &var, &[&left, &right], var.old(), 1.0)
    .unwrap()
}

/// Convection diffusion on a 30x10 grid, flow to the upper right.
fn convection_system() -> (SparseMatrix, Vector) {
  let grid = CartesianGrid::new_2d(30, 10, 1.0 / 30.0, 0.1).unwrap();
  let mesh = grid.mesh();
  let inlet = FixedValue::new(mesh, &grid.faces_on(Side::Left), 1.0).unwrap();
  let wall = FixedValue::new(mesh, &grid.faces_on(Side::Bottom), 0.0).unwrap();
  let velocity = [1.0, 0.5];
  let outlet = ZeroGradient::new(mesh, &exterior_faces_facing(mesh, &velocity).unwrap()).unwrap();
  let bcs: [&dyn BoundaryCondition; 3] = [&inlet, &wall, &outlet];

  let var = CellVariable::uniform(mesh, 0.0);
  let assembler = TermAssembler::default();
  let diffusivity = 0.02;
  let (mut matrix, mut rhs) = assembler
    .assemble(&DiffusionTerm::new(diffusivity), &var, &bcs, var.old(), 1.0)
    .unwrap();
  let convection = ConvectionTerm::uniform(&velocity, ConvectionScheme::PowerLaw)
    .with_diffusivity(diffusivity);
  let (conv_matrix, conv_rhs) = assembler
    .assemble(&convection, &var, &bcs, var.old(), 1.0)
    .unwrap();
  matrix.add_assign(conv_matrix).unwrap();
  rhs += conv_rhs;
  (matrix, rhs)
}

fn solve(config: SolverConfig, matrix: &SparseMatrix, rhs: &Vector) -> (Vector, SolveReport) {
  let solver = LinearSolver::new(config).unwrap();
  let mut x = Vector::zeros(rhs.len());
  let report = solver.solve(matrix, &mut x, rhs).unwrap();
  (x, report)
}

#[test]
fn direct_solvers_agree() {
  init_tracing();
  let (matrix, rhs) = diffusion_system();
  assert!(matrix.to_nalgebra_dense().is_spd());

  let (lu, report) = solve(SolverConfig::direct(DirectMethod::Lu), &matrix, &rhs);
  assert_eq!(report.iterations, 0);
  assert!(report.residual < 1e-12);
  let (cholesky, _) = solve(SolverConfig::direct(DirectMethod::Cholesky), &matrix, &rhs);
  assert_relative_eq!(lu, cholesky, epsilon = 1e-10);

  // antisymmetric about the vertical center line
  assert_relative_eq!(lu[0], -lu[19], epsilon = 1e-10);
}

#[test]
fn cg_with_every_preconditioner() {
  init_tracing();
  let (matrix, rhs) = diffusion_system();
  let (reference, _) = solve(SolverConfig::default(), &matrix, &rhs);

  let mut iterations = Vec::new();
  for preconditioner in PRECONDITIONERS {
    let config = SolverConfig::iterative(KrylovMethod::Cg, preconditioner);
    let (x, report) = solve(config, &matrix, &rhs);
    assert!(report.residual <= 1e-10);
    assert_relative_eq!(x, reference, epsilon = 1e-6);
    iterations.push(report.iterations);
  }
  // multilevel beats plain CG
  assert!(iterations[3] < iterations[0]);
}

#[test]
fn bicgstab_on_nonsymmetric_system() {
  init_tracing();
  let (matrix, rhs) = convection_system();
  assert!(!matrix.to_nalgebra_dense().is_symmetric(1e-12));
  let (reference, _) = solve(SolverConfig::direct(DirectMethod::Lu), &matrix, &rhs);

  for preconditioner in PRECONDITIONERS {
    let config = SolverConfig::iterative(KrylovMethod::BiCgStab, preconditioner);
    let (x, report) = solve(config, &matrix, &rhs);
    assert!(report.residual <= 1e-10);
    assert_relative_eq!(x, reference, epsilon = 1e-6);
  }

  // transported values stay within the inlet and wall values
  assert!(reference.iter().all(|&v| (-1e-9..=1.0 + 1e-9).contains(&v)));
}

#[test]
fn initial_guess_is_used() {
  let (matrix, rhs) = diffusion_system();
  let (reference, _) = solve(SolverConfig::default(), &matrix, &rhs);

  let solver = LinearSolver::new(SolverConfig::iterative(
    KrylovMethod::Cg,
    PreconditionerKind::Jacobi,
  ))
  .unwrap();
  let mut x = reference.clone();
  let report = solver.solve(&matrix, &mut x, &rhs).unwrap();
  assert_eq!(report.iterations, 0);
  assert_eq!(x, reference);
}

#[test]
fn convergence_failure_is_reported() {
  let (matrix, rhs) = diffusion_system();
  let config =
    SolverConfig::iterative(KrylovMethod::Cg, PreconditionerKind::None).with_iterations(1);
  let solver = LinearSolver::new(config).unwrap();
  let mut x = Vector::zeros(rhs.len());
  let err = solver.solve(&matrix, &mut x, &rhs).unwrap_err();
  match err {
    SolveError::ConvergenceFailure {
      iterations,
      residual,
      tolerance,
    } => {
      assert_eq!(iterations, 1);
      assert_eq!(tolerance, 1e-10);
      assert!(residual > tolerance);
    }
    other => panic!("unexpected error {other}"),
  }
}

#[test]
fn unsupported_combinations_fail_early() {
  for preconditioner in &PRECONDITIONERS[1..] {
    for method in [DirectMethod::Lu, DirectMethod::Cholesky] {
      let config = SolverConfig::direct(method).with_preconditioner(*preconditioner);
      assert!(matches!(
        LinearSolver::new(config),
        Err(SolveError::BackendUnavailable(_))
      ));
    }
  }
}

#[test]
fn zero_rhs_gives_zero_solution() {
  let (matrix, rhs) = diffusion_system();
  let solver = LinearSolver::new(SolverConfig::iterative(
    KrylovMethod::BiCgStab,
    PreconditionerKind::IncompleteLu,
  ))
  .unwrap();
  let mut x = Vector::from_element(rhs.len(), 3.0);
  let report = solver
    .solve(&matrix, &mut x, &Vector::zeros(rhs.len()))
    .unwrap();
  assert_eq!(report.iterations, 0);
  assert_eq!(x, na::DVector::zeros(rhs.len()));
}
