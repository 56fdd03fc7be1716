//! A transport equation as a sum of discretized terms.

use crate::{
  assemble::{AssemblyConfig, TermAssembler},
  boundary::BoundaryCondition,
  error::{AssemblyError, Error},
  lse::{LinearSolver, SolveReport},
  sparse::{SparseMatrix, Vector},
  term::{CellTerm, FaceTerm},
  variable::CellVariable,
};

/// Face terms and cell terms, all moved to the left-hand side, `sum L phi = 0`.
///
/// Boundary conditions are applied to every face term.
#[derive(Default)]
pub struct Equation {
  face_terms: Vec<Box<dyn FaceTerm>>,
  cell_terms: Vec<Box<dyn CellTerm>>,
  assembler: TermAssembler,
}

impl Equation {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_face_term(mut self, term: impl FaceTerm + 'static) -> Self {
    self.face_terms.push(Box::new(term));
    self
  }
  pub fn with_cell_term(mut self, term: impl CellTerm + 'static) -> Self {
    self.cell_terms.push(Box::new(term));
    self
  }
  pub fn with_assembly_config(mut self, config: AssemblyConfig) -> Self {
    self.assembler = TermAssembler::new(config);
    self
  }

  pub fn nterms(&self) -> usize {
    self.face_terms.len() + self.cell_terms.len()
  }

  /// Sum of the systems of all terms. Explicit parts use the old values of `var`.
  pub fn assemble(
    &self,
    var: &CellVariable,
    boundary_conditions: &[&dyn BoundaryCondition],
    dt: f64,
  ) -> Result<(SparseMatrix, Vector), AssemblyError> {
    let ncells = var.mesh().ncells();
    let mut matrix = SparseMatrix::square(ncells);
    let mut rhs = Vector::zeros(ncells);

    for term in &self.face_terms {
      let (term_matrix, term_rhs) = self.assembler.assemble(
        term.as_ref(),
        var,
        boundary_conditions,
        var.old(),
        dt,
      )?;
      matrix.add_assign(term_matrix)?;
      rhs += term_rhs;
    }
    for term in &self.cell_terms {
      let (term_matrix, term_rhs) = term.build(var.mesh(), var.old(), dt)?;
      matrix.add_assign(term_matrix)?;
      AssemblyError::check_len("cell term rhs", ncells, term_rhs.len())?;
      rhs += term_rhs;
    }
    Ok((matrix, rhs))
  }

  /// Norm of `b - M x` for the current values of `var`.
  pub fn residual(
    &self,
    var: &CellVariable,
    boundary_conditions: &[&dyn BoundaryCondition],
    dt: f64,
  ) -> Result<f64, AssemblyError> {
    let (matrix, rhs) = self.assemble(var, boundary_conditions, dt)?;
    Ok((rhs - matrix.mul_vec(var.values())).norm())
  }

  /// Assembles and solves, starting from the current values of `var`.
  ///
  /// `var` only receives the solution if the solve succeeds.
  pub fn solve(
    &self,
    var: &mut CellVariable,
    boundary_conditions: &[&dyn BoundaryCondition],
    dt: f64,
    solver: &LinearSolver,
  ) -> Result<SolveReport, Error> {
    let (matrix, rhs) = self.assemble(var, boundary_conditions, dt)?;
    let mut solution = var.values().clone();
    let report = solver.solve(&matrix, &mut solution, &rhs)?;
    var.values_mut().copy_from(&solution);
    Ok(report)
  }
}

impl std::fmt::Debug for Equation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Equation")
      .field("face_terms", &self.face_terms.len())
      .field("cell_terms", &self.cell_terms.len())
      .field("assembler", &self.assembler)
      .finish()
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    assemble::ExplicitStrategy,
    boundary::FixedValue,
    lse::SolverConfig,
    mesh::cartesian::{CartesianGrid, Side},
    term::{cell::SourceTerm, diffusion::DiffusionTerm},
  };

  use approx::assert_relative_eq;

  #[test]
  fn steady_diffusion_is_linear() {
    let grid = CartesianGrid::new_1d(4, 0.25).unwrap();
    let mesh = grid.mesh();
    let left = FixedValue::new(mesh, &grid.faces_on(Side::Left), 1.0).unwrap();
    let right = FixedValue::new(mesh, &grid.faces_on(Side::Right), 0.0).unwrap();
    let bcs: [&dyn BoundaryCondition; 2] = [&left, &right];

    let mut var = CellVariable::uniform(mesh, 0.0);
    let eq = Equation::new().with_face_term(DiffusionTerm::new(1.0));
    let solver = LinearSolver::new(SolverConfig::default()).unwrap();
    eq.solve(&mut var, &bcs, 1.0, &solver).unwrap();

    for (value, center) in var.values().iter().zip(grid.cell_centers().row(0).iter()) {
      assert_relative_eq!(*value, 1.0 - center, epsilon = 1e-12);
    }
    assert_relative_eq!(eq.residual(&var, &bcs, 1.0).unwrap(), 0.0, epsilon = 1e-12);
  }

  #[test]
  fn cell_terms_add_to_rhs() {
    let grid = CartesianGrid::new_1d(3, 1.0).unwrap();
    let var = CellVariable::uniform(grid.mesh(), 0.0);
    let eq = Equation::new()
      .with_face_term(DiffusionTerm::new(1.0))
      .with_cell_term(SourceTerm::uniform(3, 2.0));
    assert_eq!(eq.nterms(), 2);
    let (_, rhs) = eq.assemble(&var, &[], 1.0).unwrap();
    assert_eq!(rhs.as_slice(), &[2.0; 3]);
  }

  #[test]
  fn assembly_config_reaches_face_terms() {
    let grid = CartesianGrid::new_1d(4, 0.25).unwrap();
    let initial = Vector::from_column_slice(&[1.0, 4.0, 2.0, 0.5]);
    let var = CellVariable::new(grid.mesh(), initial).unwrap();

    let rhs = |strategy| {
      let eq = Equation::new()
        .with_face_term(DiffusionTerm::explicit(1.5))
        .with_assembly_config(AssemblyConfig::default().with_explicit_strategy(strategy));
      eq.assemble(&var, &[], 1.0).unwrap().1
    };
    let vectorized = rhs(ExplicitStrategy::Vectorized);
    let face_loop = rhs(ExplicitStrategy::FaceLoop);
    assert_relative_eq!(vectorized, face_loop, epsilon = 1e-12);
    // explicit diffusion conserves the total
    assert_relative_eq!(vectorized.sum(), 0.0, epsilon = 1e-12);
  }
}
