//! Terms without coupling between cells.

use super::CellTerm;
use crate::{error::AssemblyError, mesh::FaceMesh, sparse::SparseMatrix, sparse::Vector};

/// Implicit Euler time derivative `coeff d(phi)/dt`.
///
/// Contributes `coeff V / dt` to the diagonal and `coeff V / dt * old` to the rhs.
#[derive(Debug, Clone)]
pub struct TransientTerm {
  coeff: f64,
}

impl TransientTerm {
  pub fn new(coeff: f64) -> Self {
    Self { coeff }
  }
}

impl Default for TransientTerm {
  fn default() -> Self {
    Self::new(1.0)
  }
}

impl CellTerm for TransientTerm {
  fn build(
    &self,
    mesh: &dyn FaceMesh,
    old: &Vector,
    dt: f64,
  ) -> Result<(SparseMatrix, Vector), AssemblyError> {
    let ncells = mesh.ncells();
    AssemblyError::check_len("old values", ncells, old.len())?;
    let volumes = mesh.cell_volumes();
    AssemblyError::check_len("cell volumes", ncells, volumes.len())?;

    let diag: Vec<f64> = volumes.iter().map(|vol| self.coeff * vol / dt).collect();
    let cells: Vec<usize> = (0..ncells).collect();

    let mut matrix = SparseMatrix::square(ncells);
    matrix.add_at(&diag, &cells, &cells)?;
    let rhs = Vector::from_vec(diag).component_mul(old);
    Ok((matrix, rhs))
  }
}

/// Explicit volumetric source, `b += s V`.
#[derive(Debug, Clone)]
pub struct SourceTerm {
  source: Vector,
}

impl SourceTerm {
  pub fn new(source: Vector) -> Self {
    Self { source }
  }

  pub fn uniform(ncells: usize, source: f64) -> Self {
    Self::new(Vector::from_element(ncells, source))
  }
}

impl CellTerm for SourceTerm {
  fn build(
    &self,
    mesh: &dyn FaceMesh,
    _old: &Vector,
    _dt: f64,
  ) -> Result<(SparseMatrix, Vector), AssemblyError> {
    let ncells = mesh.ncells();
    AssemblyError::check_len("source", ncells, self.source.len())?;
    let volumes = Vector::from_column_slice(mesh.cell_volumes());
    AssemblyError::check_len("cell volumes", ncells, volumes.len())?;
    Ok((SparseMatrix::square(ncells), self.source.component_mul(&volumes)))
  }
}
