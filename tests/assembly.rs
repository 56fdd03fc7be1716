//! Verify the assembled systems of face terms on small meshes against
//! hand-checked matrices and vectors.

extern crate nalgebra as na;

use finvol::{
  assemble::{
    AssemblyConfig, ExplicitKernel, ExplicitStrategy, FaceLoopKernel, InteriorStencil,
    TermAssembler, VectorizedKernel,
  },
  boundary::{BoundaryCondition, BoundaryContribution, FixedValue, ZeroGradient},
  linalg::{assert_mat_eq, DMatrixExt},
  mesh::{
    cartesian::{CartesianGrid, Side},
    FaceComplex, FaceMesh,
  },
  sparse::Vector,
  term::{
    coeff_matrix, diffusion::DiffusionTerm, ConstantFaceTerm, FaceValues, StencilWeights,
    WeightSet,
  },
  variable::CellVariable,
  AssemblyError,
};

/// Three cells in a row, coupled by the faces 0-1 and 1-2.
fn three_cells() -> FaceComplex {
  FaceComplex::from_adjacency(3, vec![(0, Some(1)), (1, Some(2))]).unwrap()
}

fn unit_weights() -> StencilWeights {
  StencilWeights::uniform(1.0, 1.0, 1.0, 1.0)
}

/// Contributes fixed values, independent of the coefficients.
struct FixedContribution(BoundaryContribution);
impl BoundaryCondition for FixedContribution {
  fn contribution(
    &self,
    _cell1_diag: &Vector,
    _cell1_offdiag: &Vector,
  ) -> Result<BoundaryContribution, AssemblyError> {
    Ok(self.0.clone())
  }
}

fn fixed_contribution(diag: &[f64], rhs: &[f64], dofs: &[usize]) -> FixedContribution {
  FixedContribution(BoundaryContribution {
    diag: Vector::from_column_slice(diag),
    rhs: Vector::from_column_slice(rhs),
    dofs: dofs.to_vec(),
  })
}

#[test]
fn implicit_three_cells() {
  let mesh = three_cells();
  let var = CellVariable::uniform(&mesh, 0.0);
  let term = ConstantFaceTerm::new(1.0, WeightSet::implicit(unit_weights()));
  let (matrix, rhs) = TermAssembler::default()
    .assemble(&term, &var, &[], var.old(), 1.0)
    .unwrap();

  #[rustfmt::skip]
  let expected = na::DMatrix::from_row_slice(3, 3, &[
    1.0, 1.0, 0.0,
    1.0, 2.0, 1.0,
    0.0, 1.0, 1.0,
  ]);
  assert_mat_eq(&matrix.to_nalgebra_dense(), &expected, None);
  assert_eq!(rhs, Vector::zeros(3));
}

#[test]
fn explicit_three_cells() {
  let mesh = three_cells();
  let var = CellVariable::new(&mesh, Vector::from_column_slice(&[1.0, 2.0, 3.0])).unwrap();
  let term = ConstantFaceTerm::new(1.0, WeightSet::explicit(unit_weights()));

  for strategy in [ExplicitStrategy::Vectorized, ExplicitStrategy::FaceLoop] {
    let assembler =
      TermAssembler::new(AssemblyConfig::default().with_explicit_strategy(strategy));
    let (matrix, rhs) = assembler.assemble(&term, &var, &[], var.old(), 1.0).unwrap();
    assert_eq!(matrix.ntriplets(), 0);
    assert_eq!(rhs.as_slice(), &[-3.0, -8.0, -5.0]);
  }
}

#[test]
fn boundary_contribution_only() {
  let mesh = three_cells();
  let var = CellVariable::uniform(&mesh, 0.0);
  let term = ConstantFaceTerm::new(0.0, WeightSet::implicit(unit_weights()));
  let bc = fixed_contribution(&[5.0], &[2.0], &[0]);

  let (matrix, rhs) = TermAssembler::default()
    .assemble(&term, &var, &[&bc], var.old(), 1.0)
    .unwrap();
  let mut expected = na::DMatrix::zeros(3, 3);
  expected[(0, 0)] = 5.0;
  assert_mat_eq(&matrix.to_nalgebra_dense(), &expected, None);
  assert_eq!(rhs.as_slice(), &[2.0, 0.0, 0.0]);
}

#[test]
fn explicit_boundary_contribution() {
  let mesh = three_cells();
  let old = Vector::from_column_slice(&[2.0, 0.0, 0.0]);
  let var = CellVariable::new(&mesh, old.clone()).unwrap();
  let term = ConstantFaceTerm::new(0.0, WeightSet::explicit(unit_weights()));
  let bc = fixed_contribution(&[5.0], &[2.0], &[0]);

  let (matrix, rhs) = TermAssembler::default()
    .assemble(&term, &var, &[&bc], &old, 1.0)
    .unwrap();
  assert_eq!(matrix.ntriplets(), 0);
  assert_eq!(rhs.as_slice(), &[2.0 - 5.0 * 2.0, 0.0, 0.0]);
}

#[test]
fn zero_weights_give_zero_system() {
  let grid = CartesianGrid::new_2d(3, 3, 1.0, 1.0).unwrap();
  let var = CellVariable::uniform(grid.mesh(), 1.0);
  let term = ConstantFaceTerm::new(
    2.0,
    WeightSet::implicit(StencilWeights::uniform(0.0, 0.0, 0.0, 0.0)),
  );
  let bc = fixed_contribution(&[], &[], &[]);
  let (matrix, rhs) = TermAssembler::default()
    .assemble(&term, &var, &[&bc], var.old(), 1.0)
    .unwrap();
  assert_eq!(matrix.to_nalgebra_dense(), na::DMatrix::zeros(9, 9));
  assert_eq!(rhs, Vector::zeros(9));
}

#[test]
fn diffusion_matrix_is_symmetric_laplacian() {
  let grid = CartesianGrid::new_2d(4, 3, 0.5, 0.25).unwrap();
  let var = CellVariable::uniform(grid.mesh(), 0.0);
  let (matrix, _) = TermAssembler::default()
    .assemble(&DiffusionTerm::new(1.5), &var, &[], var.old(), 1.0)
    .unwrap();
  let dense = matrix.to_nalgebra_dense();
  assert!(dense.is_symmetric(1e-12));
  // without boundary conditions all boundaries are insulated
  for row in dense.row_iter() {
    approx::assert_abs_diff_eq!(row.sum(), 0.0, epsilon = 1e-12);
  }
}

#[test]
fn boundary_order_does_not_matter() {
  let grid = CartesianGrid::new_2d(3, 2, 1.0, 1.0).unwrap();
  let mesh = grid.mesh();
  let var = CellVariable::uniform(mesh, 0.0);
  let term = DiffusionTerm::new(1.0);

  let left = FixedValue::new(mesh, &grid.faces_on(Side::Left), 1.0).unwrap();
  let bottom = FixedValue::new(mesh, &grid.faces_on(Side::Bottom), 2.0).unwrap();
  let top = ZeroGradient::new(mesh, &grid.faces_on(Side::Top)).unwrap();

  let assembler = TermAssembler::default();
  let (matrix_a, rhs_a) = assembler
    .assemble(&term, &var, &[&left, &bottom, &top], var.old(), 1.0)
    .unwrap();
  let (matrix_b, rhs_b) = assembler
    .assemble(&term, &var, &[&top, &bottom, &left], var.old(), 1.0)
    .unwrap();
  assert_mat_eq(
    &matrix_a.to_nalgebra_dense(),
    &matrix_b.to_nalgebra_dense(),
    None,
  );
  approx::assert_relative_eq!(rhs_a, rhs_b, epsilon = 1e-12);

  // the corner cell gets both fixed values
  let conductance = 1.0 / 0.5;
  approx::assert_relative_eq!(rhs_a[0], conductance * 1.0 + conductance * 2.0);
}

#[test]
fn vectorized_matches_face_loop() {
  let grid = CartesianGrid::new_2d(7, 5, 0.3, 0.7).unwrap();
  let mesh = grid.mesh();
  let nfaces = mesh.nfaces();
  let face_values = |seed: f64| -> FaceValues {
    Vector::from_fn(nfaces, |i, _| ((i as f64 + seed) * 0.37).sin()).into()
  };
  let weights = StencilWeights {
    cell1_diag: face_values(1.0),
    cell1_offdiag: face_values(2.0),
    cell2_diag: face_values(3.0),
    cell2_offdiag: face_values(4.0),
  };
  let coeffs = coeff_matrix(&face_values(5.0), &weights, nfaces).unwrap();
  let stencil = InteriorStencil::new(mesh).unwrap();
  let old = Vector::from_fn(mesh.ncells(), |i, _| (i as f64 * 0.91).cos() + 2.0);

  let mut vectorized = Vector::from_element(mesh.ncells(), 0.5);
  let mut face_loop = vectorized.clone();
  VectorizedKernel
    .apply(&stencil, &coeffs, &old, &mut vectorized)
    .unwrap();
  FaceLoopKernel
    .apply(&stencil, &coeffs, &old, &mut face_loop)
    .unwrap();
  approx::assert_relative_eq!(vectorized, face_loop, max_relative = 1e-12, epsilon = 1e-14);
}

#[test]
fn explicit_is_negated_implicit() {
  let grid = CartesianGrid::new_1d(6, 0.2).unwrap();
  let mesh = grid.mesh();
  let old = Vector::from_fn(6, |i, _| (i * i) as f64);
  let var = CellVariable::new(mesh, old.clone()).unwrap();

  let assembler = TermAssembler::default();
  let (implicit, _) = assembler
    .assemble(&DiffusionTerm::new(2.0), &var, &[], &old, 1.0)
    .unwrap();
  let (_, explicit) = assembler
    .assemble(&DiffusionTerm::explicit(2.0), &var, &[], &old, 1.0)
    .unwrap();
  approx::assert_relative_eq!(explicit, -implicit.mul_vec(&old), epsilon = 1e-12);
}

#[test]
fn implicit_and_explicit_groups_together() {
  let mesh = three_cells();
  let var = CellVariable::new(&mesh, Vector::from_column_slice(&[1.0, 2.0, 3.0])).unwrap();
  let weights = WeightSet {
    implicit: Some(unit_weights()),
    explicit: Some(unit_weights()),
  };
  let term = ConstantFaceTerm::new(1.0, weights);
  let (matrix, rhs) = TermAssembler::default()
    .assemble(&term, &var, &[], var.old(), 1.0)
    .unwrap();
  assert_eq!(matrix.to_nalgebra_dense()[(1, 1)], 2.0);
  assert_eq!(rhs.as_slice(), &[-3.0, -8.0, -5.0]);
}

#[test]
fn invalid_adapter_answers_abort() {
  let mesh = three_cells();
  let var = CellVariable::uniform(&mesh, 0.0);
  let term = ConstantFaceTerm::new(1.0, WeightSet::implicit(unit_weights()));
  let assembler = TermAssembler::default();

  let out_of_range = fixed_contribution(&[1.0], &[1.0], &[3]);
  assert_eq!(
    assembler
      .assemble(&term, &var, &[&out_of_range], var.old(), 1.0)
      .unwrap_err(),
    AssemblyError::IndexOutOfRange {
      what: "boundary dof",
      index: 3,
      len: 3
    }
  );

  let short = fixed_contribution(&[1.0], &[1.0, 2.0], &[0, 1]);
  assert!(matches!(
    assembler.assemble(&term, &var, &[&short], var.old(), 1.0),
    Err(AssemblyError::ShapeMismatch { .. })
  ));
}

#[test]
fn per_face_weights_must_match_faces() {
  let mesh = three_cells();
  let var = CellVariable::uniform(&mesh, 0.0);
  let weights = StencilWeights {
    cell1_offdiag: vec![1.0, 1.0, 1.0].into(),
    ..unit_weights()
  };
  let term = ConstantFaceTerm::new(1.0, WeightSet::implicit(weights));
  let err = TermAssembler::default()
    .assemble(&term, &var, &[], var.old(), 1.0)
    .unwrap_err();
  assert_eq!(
    err,
    AssemblyError::ShapeMismatch {
      what: "cell 1 offdiag weight",
      expected: 2,
      found: 3
    }
  );
}
