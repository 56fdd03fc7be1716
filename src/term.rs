//! Discretized PDE terms.
//!
//! A face term distributes the flux through every face onto the matrix rows
//! of the two adjacent cells. How it does that is described by its
//! [`WeightSet`]: per treatment (implicit or explicit) four per-face weights,
//! one per stencil role. The weights multiplied by the face coefficient give
//! the [`StencilCoeffs`] that the assembler scatters into the system.

pub mod cell;
pub mod convection;
pub mod diffusion;

use crate::{error::AssemblyError, mesh::FaceMesh, sparse::SparseMatrix, sparse::Vector};

use std::fmt;

/// Whether a term acts on the unknown (matrix) or on the previous values (rhs).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Treatment {
  #[default]
  Implicit,
  Explicit,
}

impl fmt::Display for Treatment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Implicit => write!(f, "implicit"),
      Self::Explicit => write!(f, "explicit"),
    }
  }
}

/// Either one value shared by all faces or one value per face.
#[derive(Debug, Clone, PartialEq)]
pub enum FaceValues {
  Uniform(f64),
  PerFace(Vector),
}

impl FaceValues {
  /// Expands into a vector of length `nfaces`.
  pub fn broadcast(&self, what: &'static str, nfaces: usize) -> Result<Vector, AssemblyError> {
    match self {
      Self::Uniform(v) => Ok(Vector::from_element(nfaces, *v)),
      Self::PerFace(values) => {
        AssemblyError::check_len(what, nfaces, values.len())?;
        Ok(values.clone())
      }
    }
  }
}

impl From<f64> for FaceValues {
  fn from(value: f64) -> Self {
    Self::Uniform(value)
  }
}
impl From<Vector> for FaceValues {
  fn from(values: Vector) -> Self {
    Self::PerFace(values)
  }
}
impl From<Vec<f64>> for FaceValues {
  fn from(values: Vec<f64>) -> Self {
    Self::PerFace(Vector::from_vec(values))
  }
}

/// How a face's flux is split onto the rows of its two adjacent cells.
#[derive(Debug, Clone, PartialEq)]
pub struct StencilWeights {
  pub cell1_diag: FaceValues,
  pub cell1_offdiag: FaceValues,
  pub cell2_diag: FaceValues,
  pub cell2_offdiag: FaceValues,
}

impl StencilWeights {
  pub fn uniform(cell1_diag: f64, cell1_offdiag: f64, cell2_diag: f64, cell2_offdiag: f64) -> Self {
    Self {
      cell1_diag: cell1_diag.into(),
      cell1_offdiag: cell1_offdiag.into(),
      cell2_diag: cell2_diag.into(),
      cell2_offdiag: cell2_offdiag.into(),
    }
  }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct WeightSet {
  pub implicit: Option<StencilWeights>,
  pub explicit: Option<StencilWeights>,
}

impl WeightSet {
  pub fn new(treatment: Treatment, weights: StencilWeights) -> Self {
    let mut set = Self::default();
    match treatment {
      Treatment::Implicit => set.implicit = Some(weights),
      Treatment::Explicit => set.explicit = Some(weights),
    }
    set
  }

  pub fn implicit(weights: StencilWeights) -> Self {
    Self::new(Treatment::Implicit, weights)
  }
  pub fn explicit(weights: StencilWeights) -> Self {
    Self::new(Treatment::Explicit, weights)
  }

  pub fn group(&self, treatment: Treatment) -> Result<&StencilWeights, AssemblyError> {
    let group = match treatment {
      Treatment::Implicit => self.implicit.as_ref(),
      Treatment::Explicit => self.explicit.as_ref(),
    };
    group.ok_or(AssemblyError::MissingWeightGroup(treatment))
  }

  /// The treatments present, implicit first.
  pub fn treatments(&self) -> impl Iterator<Item = Treatment> + '_ {
    [
      (Treatment::Implicit, self.implicit.is_some()),
      (Treatment::Explicit, self.explicit.is_some()),
    ]
    .into_iter()
    .filter_map(|(treatment, present)| present.then_some(treatment))
  }
}

/// Face coefficient times weight, for each stencil role, over all faces.
#[derive(Debug, Clone, PartialEq)]
pub struct StencilCoeffs {
  pub cell1_diag: Vector,
  pub cell1_offdiag: Vector,
  pub cell2_diag: Vector,
  pub cell2_offdiag: Vector,
}

impl StencilCoeffs {
  pub fn nfaces(&self) -> usize {
    self.cell1_diag.len()
  }

  /// Only the entries of the given faces, in that order.
  pub fn restrict(&self, faces: &[usize]) -> Self {
    Self {
      cell1_diag: self.cell1_diag.select_rows(faces),
      cell1_offdiag: self.cell1_offdiag.select_rows(faces),
      cell2_diag: self.cell2_diag.select_rows(faces),
      cell2_offdiag: self.cell2_offdiag.select_rows(faces),
    }
  }
}

/// Combines a face coefficient with the four role weights.
///
/// Pure function of its inputs. Every per-face array must have length `nfaces`.
pub fn coeff_matrix(
  coeff: &FaceValues,
  weights: &StencilWeights,
  nfaces: usize,
) -> Result<StencilCoeffs, AssemblyError> {
  let coeff = coeff.broadcast("face coefficient", nfaces)?;
  let role = |weight: &FaceValues, what: &'static str| -> Result<Vector, AssemblyError> {
    Ok(coeff.component_mul(&weight.broadcast(what, nfaces)?))
  };
  Ok(StencilCoeffs {
    cell1_diag: role(&weights.cell1_diag, "cell 1 diag weight")?,
    cell1_offdiag: role(&weights.cell1_offdiag, "cell 1 offdiag weight")?,
    cell2_diag: role(&weights.cell2_diag, "cell 2 diag weight")?,
    cell2_offdiag: role(&weights.cell2_offdiag, "cell 2 offdiag weight")?,
  })
}

/// A term discretized through fluxes over faces. Plays the role of the
/// weight provider for the [`crate::assemble::TermAssembler`].
pub trait FaceTerm {
  /// The physical transport coefficient per face, e.g. `D * area / distance`.
  fn coeff(&self, mesh: &dyn FaceMesh, dt: f64) -> Result<FaceValues, AssemblyError>;
  fn weights(&self, mesh: &dyn FaceMesh, dt: f64) -> Result<WeightSet, AssemblyError>;
}

/// A term that only acts cell by cell, without any coupling between cells.
pub trait CellTerm {
  fn build(
    &self,
    mesh: &dyn FaceMesh,
    old: &Vector,
    dt: f64,
  ) -> Result<(SparseMatrix, Vector), AssemblyError>;
}

/// A face term with fixed weights and coefficient.
#[derive(Debug, Clone)]
pub struct ConstantFaceTerm {
  pub coeff: FaceValues,
  pub weights: WeightSet,
}

impl ConstantFaceTerm {
  pub fn new(coeff: impl Into<FaceValues>, weights: WeightSet) -> Self {
    Self {
      coeff: coeff.into(),
      weights,
    }
  }
}

impl FaceTerm for ConstantFaceTerm {
  fn coeff(&self, _mesh: &dyn FaceMesh, _dt: f64) -> Result<FaceValues, AssemblyError> {
    Ok(self.coeff.clone())
  }
  fn weights(&self, _mesh: &dyn FaceMesh, _dt: f64) -> Result<WeightSet, AssemblyError> {
    Ok(self.weights.clone())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn coeff_matrix_broadcasts() {
    let weights = StencilWeights {
      cell1_diag: FaceValues::Uniform(1.0),
      cell1_offdiag: vec![1.0, 2.0, 3.0].into(),
      cell2_diag: FaceValues::Uniform(-1.0),
      cell2_offdiag: FaceValues::Uniform(0.0),
    };
    let coeffs = coeff_matrix(&vec![2.0, 4.0, 8.0].into(), &weights, 3).unwrap();
    assert_eq!(coeffs.cell1_diag.as_slice(), &[2.0, 4.0, 8.0]);
    assert_eq!(coeffs.cell1_offdiag.as_slice(), &[2.0, 8.0, 24.0]);
    assert_eq!(coeffs.cell2_diag.as_slice(), &[-2.0, -4.0, -8.0]);
    assert_eq!(coeffs.cell2_offdiag.as_slice(), &[0.0; 3]);

    let restricted = coeffs.restrict(&[2, 0]);
    assert_eq!(restricted.cell1_offdiag.as_slice(), &[24.0, 2.0]);
  }

  #[test]
  fn coeff_matrix_shape_mismatch() {
    let weights = StencilWeights {
      cell2_diag: vec![1.0, 2.0].into(),
      ..StencilWeights::uniform(1.0, 1.0, 1.0, 1.0)
    };
    let err = coeff_matrix(&FaceValues::Uniform(1.0), &weights, 3).unwrap_err();
    assert_eq!(
      err,
      AssemblyError::ShapeMismatch {
        what: "cell 2 diag weight",
        expected: 3,
        found: 2
      }
    );
  }

  #[test]
  fn weight_groups() {
    let set = WeightSet::explicit(StencilWeights::uniform(1.0, 1.0, 1.0, 1.0));
    assert_eq!(set.treatments().collect::<Vec<_>>(), vec![Treatment::Explicit]);
    assert_eq!(
      set.group(Treatment::Implicit),
      Err(AssemblyError::MissingWeightGroup(Treatment::Implicit))
    );
    assert!(set.group(Treatment::Explicit).is_ok());
  }
}
