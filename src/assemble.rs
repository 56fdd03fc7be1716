//! Assembly of face terms into a sparse system `M x = b`.
//!
//! Interior faces couple their two adjacent cells through the four stencil
//! roles of the term's weights. Exterior faces only enter through boundary
//! conditions. Implicit weights go into the matrix, explicit weights are
//! applied to the previous values and moved to the right-hand side.

use crate::{
  boundary::{BoundaryCondition, BoundaryContribution},
  error::AssemblyError,
  mesh::{CellIdx, FaceIdx, FaceMesh},
  sparse::{PutAddExt, SparseMatrix, Vector},
  term::{coeff_matrix, FaceTerm, StencilCoeffs, Treatment},
  variable::CellVariable,
};

/// Execution path of the explicit interior contribution.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExplicitStrategy {
  /// Whole-array gather and scatter. The reference path.
  #[default]
  Vectorized,
  /// One face after the other.
  FaceLoop,
}

impl ExplicitStrategy {
  pub fn kernel(self) -> &'static dyn ExplicitKernel {
    match self {
      Self::Vectorized => &VectorizedKernel,
      Self::FaceLoop => &FaceLoopKernel,
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct AssemblyConfig {
  pub explicit_strategy: ExplicitStrategy,
}

impl AssemblyConfig {
  pub fn with_explicit_strategy(mut self, explicit_strategy: ExplicitStrategy) -> Self {
    self.explicit_strategy = explicit_strategy;
    self
  }
}

/// The interior faces with their adjacent cells, in matching order.
#[derive(Debug, Clone, PartialEq)]
pub struct InteriorStencil {
  pub faces: Vec<FaceIdx>,
  pub cells1: Vec<CellIdx>,
  pub cells2: Vec<CellIdx>,
}

impl InteriorStencil {
  pub fn new(mesh: &dyn FaceMesh) -> Result<Self, AssemblyError> {
    let ncells = mesh.ncells();
    let nfaces = mesh.nfaces();
    let (cells1, cells2) = mesh.adjacent_cells();
    AssemblyError::check_len("adjacent cells 1", nfaces, cells1.len())?;
    AssemblyError::check_len("adjacent cells 2", nfaces, cells2.len())?;

    let faces = mesh.interior_faces().to_vec();
    for &iface in &faces {
      AssemblyError::check_index("interior face", iface, nfaces)?;
      AssemblyError::check_index("adjacent cell", cells1[iface], ncells)?;
      AssemblyError::check_index("adjacent cell", cells2[iface], ncells)?;
    }

    Ok(Self {
      cells1: faces.iter().map(|&iface| cells1[iface]).collect(),
      cells2: faces.iter().map(|&iface| cells2[iface]).collect(),
      faces,
    })
  }

  pub fn len(&self) -> usize {
    self.faces.len()
  }
  pub fn is_empty(&self) -> bool {
    self.faces.is_empty()
  }
}

/// Applies explicit coefficients to the previous values of the interior
/// cells: `b[c1] -= d1 old[c1] + o1 old[c2]` and
/// `b[c2] -= d2 old[c2] + o2 old[c1]`.
///
/// `coeffs` are given over all faces.
pub trait ExplicitKernel {
  fn apply(
    &self,
    stencil: &InteriorStencil,
    coeffs: &StencilCoeffs,
    old: &Vector,
    rhs: &mut Vector,
  ) -> Result<(), AssemblyError>;
}

fn check_kernel_inputs(
  stencil: &InteriorStencil,
  coeffs: &StencilCoeffs,
  old: &Vector,
  rhs: &Vector,
) -> Result<(), AssemblyError> {
  AssemblyError::check_len("old values", rhs.len(), old.len())?;
  let nfaces = coeffs.nfaces();
  for role in [&coeffs.cell1_offdiag, &coeffs.cell2_diag, &coeffs.cell2_offdiag] {
    AssemblyError::check_len("stencil coefficients", nfaces, role.len())?;
  }
  for (&iface, &icell1, &icell2) in
    itertools::izip!(&stencil.faces, &stencil.cells1, &stencil.cells2)
  {
    AssemblyError::check_index("interior face", iface, nfaces)?;
    AssemblyError::check_index("adjacent cell", icell1, old.len())?;
    AssemblyError::check_index("adjacent cell", icell2, old.len())?;
  }
  Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct VectorizedKernel;

impl ExplicitKernel for VectorizedKernel {
  fn apply(
    &self,
    stencil: &InteriorStencil,
    coeffs: &StencilCoeffs,
    old: &Vector,
    rhs: &mut Vector,
  ) -> Result<(), AssemblyError> {
    check_kernel_inputs(stencil, coeffs, old, rhs)?;
    let interior = coeffs.restrict(&stencil.faces);
    let old1 = old.select_rows(&stencil.cells1);
    let old2 = old.select_rows(&stencil.cells2);

    let contrib1 =
      -(interior.cell1_diag.component_mul(&old1) + interior.cell1_offdiag.component_mul(&old2));
    let contrib2 =
      -(interior.cell2_diag.component_mul(&old2) + interior.cell2_offdiag.component_mul(&old1));

    rhs.put_add(&stencil.cells1, contrib1.as_slice())?;
    rhs.put_add(&stencil.cells2, contrib2.as_slice())
  }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FaceLoopKernel;

impl ExplicitKernel for FaceLoopKernel {
  fn apply(
    &self,
    stencil: &InteriorStencil,
    coeffs: &StencilCoeffs,
    old: &Vector,
    rhs: &mut Vector,
  ) -> Result<(), AssemblyError> {
    check_kernel_inputs(stencil, coeffs, old, rhs)?;
    for (&iface, &icell1, &icell2) in
      itertools::izip!(&stencil.faces, &stencil.cells1, &stencil.cells2)
    {
      let old1 = old[icell1];
      let old2 = old[icell2];
      rhs[icell1] -= coeffs.cell1_diag[iface] * old1 + coeffs.cell1_offdiag[iface] * old2;
      rhs[icell2] -= coeffs.cell2_diag[iface] * old2 + coeffs.cell2_offdiag[iface] * old1;
    }
    Ok(())
  }
}

/// Turns a [`FaceTerm`] and boundary conditions into `(M, b)`.
#[derive(Debug, Default, Clone)]
pub struct TermAssembler {
  config: AssemblyConfig,
}

impl TermAssembler {
  pub fn new(config: AssemblyConfig) -> Self {
    Self { config }
  }

  /// Assembles `term` on the mesh of `var`.
  ///
  /// `old` holds the previous cell values and is only read if the term has
  /// explicit weights. `dt` is passed on to the term.
  /// On error nothing is returned, there is no partial system.
  pub fn assemble(
    &self,
    term: &dyn FaceTerm,
    var: &CellVariable,
    boundary_conditions: &[&dyn BoundaryCondition],
    old: &Vector,
    dt: f64,
  ) -> Result<(SparseMatrix, Vector), AssemblyError> {
    let mesh = var.mesh();
    let ncells = mesh.ncells();
    let nfaces = mesh.nfaces();

    let stencil = InteriorStencil::new(mesh)?;
    let weights = term.weights(mesh, dt)?;
    let coeff = term.coeff(mesh, dt)?;

    let mut matrix = SparseMatrix::square(ncells);
    let mut rhs = Vector::zeros(ncells);

    for treatment in weights.treatments() {
      let coeffs = coeff_matrix(&coeff, weights.group(treatment)?, nfaces)?;
      tracing::debug!(
        "assembling {treatment} term: {ncells} cells, {} interior faces, {} boundary conditions",
        stencil.len(),
        boundary_conditions.len()
      );
      match treatment {
        Treatment::Implicit => {
          self.add_implicit(&stencil, &coeffs, boundary_conditions, &mut matrix, &mut rhs)?
        }
        Treatment::Explicit => {
          AssemblyError::check_len("old values", ncells, old.len())?;
          self.add_explicit(&stencil, &coeffs, boundary_conditions, old, &mut rhs)?
        }
      }
    }

    Ok((matrix, rhs))
  }

  fn add_implicit(
    &self,
    stencil: &InteriorStencil,
    coeffs: &StencilCoeffs,
    boundary_conditions: &[&dyn BoundaryCondition],
    matrix: &mut SparseMatrix,
    rhs: &mut Vector,
  ) -> Result<(), AssemblyError> {
    let interior = coeffs.restrict(&stencil.faces);
    let (cells1, cells2) = (&stencil.cells1, &stencil.cells2);

    matrix.add_at(interior.cell1_diag.as_slice(), cells1, cells1)?;
    matrix.add_at(interior.cell1_offdiag.as_slice(), cells1, cells2)?;
    matrix.add_at(interior.cell2_offdiag.as_slice(), cells2, cells1)?;
    matrix.add_at(interior.cell2_diag.as_slice(), cells2, cells2)?;

    for bc in boundary_conditions {
      let contrib = boundary_contribution(*bc, coeffs, rhs.len())?;
      matrix.add_at(contrib.diag.as_slice(), &contrib.dofs, &contrib.dofs)?;
      rhs.put_add(&contrib.dofs, contrib.rhs.as_slice())?;
    }
    Ok(())
  }

  fn add_explicit(
    &self,
    stencil: &InteriorStencil,
    coeffs: &StencilCoeffs,
    boundary_conditions: &[&dyn BoundaryCondition],
    old: &Vector,
    rhs: &mut Vector,
  ) -> Result<(), AssemblyError> {
    let strategy = self.config.explicit_strategy;
    tracing::debug!("explicit strategy {strategy:?}");
    strategy.kernel().apply(stencil, coeffs, old, rhs)?;

    for bc in boundary_conditions {
      let contrib = boundary_contribution(*bc, coeffs, rhs.len())?;
      let old_dofs = old.select_rows(&contrib.dofs);
      let correction = contrib.rhs - contrib.diag.component_mul(&old_dofs);
      rhs.put_add(&contrib.dofs, correction.as_slice())?;
    }
    Ok(())
  }
}

/// Queries a boundary condition and validates its answer against the system.
fn boundary_contribution(
  bc: &dyn BoundaryCondition,
  coeffs: &StencilCoeffs,
  ncells: usize,
) -> Result<BoundaryContribution, AssemblyError> {
  let contrib = bc.contribution(&coeffs.cell1_diag, &coeffs.cell1_offdiag)?;
  AssemblyError::check_len("boundary diag", contrib.dofs.len(), contrib.diag.len())?;
  AssemblyError::check_len("boundary rhs", contrib.dofs.len(), contrib.rhs.len())?;
  for &idof in &contrib.dofs {
    AssemblyError::check_index("boundary dof", idof, ncells)?;
  }
  Ok(contrib)
}
