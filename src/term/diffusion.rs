//! Diffusion term `-div(D grad phi)`.
//!
//! The flux through a face is approximated by the two-point difference
//! `D area / distance * (phi1 - phi2)`, giving the weights `(1, -1, 1, -1)`.

use super::{FaceTerm, FaceValues, StencilWeights, Treatment, WeightSet};
use crate::{error::AssemblyError, mesh::FaceMesh, sparse::Vector};

#[derive(Debug, Clone)]
pub struct DiffusionTerm {
  diffusivity: FaceValues,
  treatment: Treatment,
}

impl DiffusionTerm {
  pub fn new(diffusivity: impl Into<FaceValues>) -> Self {
    Self {
      diffusivity: diffusivity.into(),
      treatment: Treatment::Implicit,
    }
  }

  pub fn explicit(diffusivity: impl Into<FaceValues>) -> Self {
    Self::new(diffusivity).with_treatment(Treatment::Explicit)
  }

  pub fn with_treatment(mut self, treatment: Treatment) -> Self {
    self.treatment = treatment;
    self
  }
}

/// Geometric diffusion conductance `D area / distance` per face.
pub fn face_conductance(
  diffusivity: &FaceValues,
  mesh: &dyn FaceMesh,
) -> Result<Vector, AssemblyError> {
  let nfaces = mesh.nfaces();
  let diffusivity = diffusivity.broadcast("diffusivity", nfaces)?;
  let areas = Vector::from_column_slice(mesh.face_areas());
  let distances = Vector::from_column_slice(mesh.cell_distances());
  AssemblyError::check_len("face areas", nfaces, areas.len())?;
  AssemblyError::check_len("cell distances", nfaces, distances.len())?;
  Ok(diffusivity.component_mul(&areas).component_div(&distances))
}

impl FaceTerm for DiffusionTerm {
  fn coeff(&self, mesh: &dyn FaceMesh, _dt: f64) -> Result<FaceValues, AssemblyError> {
    face_conductance(&self.diffusivity, mesh).map(FaceValues::PerFace)
  }

  fn weights(&self, _mesh: &dyn FaceMesh, _dt: f64) -> Result<WeightSet, AssemblyError> {
    let weights = StencilWeights::uniform(1.0, -1.0, 1.0, -1.0);
    Ok(WeightSet::new(self.treatment, weights))
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::mesh::cartesian::CartesianGrid;

  #[test]
  fn conductance_on_grid() {
    let grid = CartesianGrid::new_1d(2, 0.5).unwrap();
    let term = DiffusionTerm::new(2.0);
    let coeff = term.coeff(grid.mesh(), 1.0).unwrap();
    assert_eq!(coeff, FaceValues::PerFace(Vector::from_column_slice(&[8.0, 4.0, 8.0])));

    let weights = term.weights(grid.mesh(), 1.0).unwrap();
    assert!(weights.explicit.is_none());
    let explicit = DiffusionTerm::explicit(2.0).weights(grid.mesh(), 1.0).unwrap();
    assert!(explicit.implicit.is_none());
  }

  #[test]
  fn per_face_diffusivity_must_match() {
    let grid = CartesianGrid::new_1d(2, 0.5).unwrap();
    let term = DiffusionTerm::new(vec![1.0, 2.0]);
    assert!(term.coeff(grid.mesh(), 1.0).is_err());
  }
}
