//! Boundary conditions as corrections to the assembled system.
//!
//! The assembler hands every boundary condition the full-length `cell1_diag`
//! and `cell1_offdiag` coefficient arrays of the term being assembled. The
//! condition picks the entries of its own faces and answers with a diagonal
//! and a right-hand side contribution on a list of dofs.
//!
//! Faces carrying no condition behave as zero flux faces, since the assembler
//! only ever touches interior faces on its own.

use crate::{
  error::AssemblyError,
  mesh::{CellIdx, FaceIdx, FaceMesh},
  sparse::Vector,
};

/// Contribution of a boundary condition, added at `(dofs[k], dofs[k])` of the
/// matrix and at `dofs[k]` of the right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryContribution {
  pub diag: Vector,
  pub rhs: Vector,
  pub dofs: Vec<CellIdx>,
}

impl BoundaryContribution {
  pub fn new(diag: Vector, rhs: Vector, dofs: Vec<CellIdx>) -> Result<Self, AssemblyError> {
    AssemblyError::check_len("boundary diag", dofs.len(), diag.len())?;
    AssemblyError::check_len("boundary rhs", dofs.len(), rhs.len())?;
    Ok(Self { diag, rhs, dofs })
  }

  pub fn len(&self) -> usize {
    self.dofs.len()
  }
  pub fn is_empty(&self) -> bool {
    self.dofs.is_empty()
  }
}

pub trait BoundaryCondition {
  /// `cell1_diag` and `cell1_offdiag` are indexed by face, over all faces.
  fn contribution(
    &self,
    cell1_diag: &Vector,
    cell1_offdiag: &Vector,
  ) -> Result<BoundaryContribution, AssemblyError>;
}

/// Faces, their interior cells and areas, resolved once at construction.
#[derive(Debug, Clone)]
struct BoundaryFaces {
  nfaces: usize,
  faces: Vec<FaceIdx>,
  cells: Vec<CellIdx>,
  areas: Vector,
}

impl BoundaryFaces {
  fn new(mesh: &dyn FaceMesh, faces: &[FaceIdx]) -> Result<Self, AssemblyError> {
    let nfaces = mesh.nfaces();
    let (cells1, _) = mesh.adjacent_cells();
    for &iface in faces {
      AssemblyError::check_index("boundary face", iface, nfaces)?;
      if !mesh.is_exterior(iface) {
        return Err(AssemblyError::NotExteriorFace(iface));
      }
    }
    let cells = faces.iter().map(|&iface| cells1[iface]).collect();
    let areas = Vector::from_iterator(
      faces.len(),
      faces.iter().map(|&iface| mesh.face_areas()[iface]),
    );
    Ok(Self {
      nfaces,
      faces: faces.to_vec(),
      cells,
      areas,
    })
  }

  fn gather(&self, what: &'static str, values: &Vector) -> Result<Vector, AssemblyError> {
    AssemblyError::check_len(what, self.nfaces, values.len())?;
    Ok(values.select_rows(&self.faces))
  }
}

/// Dirichlet condition. The ghost value on the face is `value`.
#[derive(Debug, Clone)]
pub struct FixedValue {
  faces: BoundaryFaces,
  value: f64,
}

impl FixedValue {
  pub fn new(mesh: &dyn FaceMesh, faces: &[FaceIdx], value: f64) -> Result<Self, AssemblyError> {
    Ok(Self {
      faces: BoundaryFaces::new(mesh, faces)?,
      value,
    })
  }
}

impl BoundaryCondition for FixedValue {
  fn contribution(
    &self,
    cell1_diag: &Vector,
    cell1_offdiag: &Vector,
  ) -> Result<BoundaryContribution, AssemblyError> {
    let diag = self.faces.gather("cell 1 diag coefficients", cell1_diag)?;
    let offdiag = self.faces.gather("cell 1 offdiag coefficients", cell1_offdiag)?;
    let rhs = offdiag * -self.value;
    BoundaryContribution::new(diag, rhs, self.faces.cells.clone())
  }
}

/// Neumann condition with a prescribed outward flux density.
#[derive(Debug, Clone)]
pub struct FixedFlux {
  faces: BoundaryFaces,
  flux: f64,
}

impl FixedFlux {
  pub fn new(mesh: &dyn FaceMesh, faces: &[FaceIdx], flux: f64) -> Result<Self, AssemblyError> {
    Ok(Self {
      faces: BoundaryFaces::new(mesh, faces)?,
      flux,
    })
  }
}

impl BoundaryCondition for FixedFlux {
  fn contribution(
    &self,
    cell1_diag: &Vector,
    cell1_offdiag: &Vector,
  ) -> Result<BoundaryContribution, AssemblyError> {
    self.faces.gather("cell 1 diag coefficients", cell1_diag)?;
    self.faces.gather("cell 1 offdiag coefficients", cell1_offdiag)?;
    let n = self.faces.faces.len();
    let rhs = &self.faces.areas * -self.flux;
    BoundaryContribution::new(Vector::zeros(n), rhs, self.faces.cells.clone())
  }
}

/// Ghost value equal to the cell value, e.g. an outflow boundary of a
/// convection term.
#[derive(Debug, Clone)]
pub struct ZeroGradient {
  faces: BoundaryFaces,
}

impl ZeroGradient {
  pub fn new(mesh: &dyn FaceMesh, faces: &[FaceIdx]) -> Result<Self, AssemblyError> {
    Ok(Self {
      faces: BoundaryFaces::new(mesh, faces)?,
    })
  }
}

impl BoundaryCondition for ZeroGradient {
  fn contribution(
    &self,
    cell1_diag: &Vector,
    cell1_offdiag: &Vector,
  ) -> Result<BoundaryContribution, AssemblyError> {
    let diag = self.faces.gather("cell 1 diag coefficients", cell1_diag)?
      + self.faces.gather("cell 1 offdiag coefficients", cell1_offdiag)?;
    let n = diag.len();
    BoundaryContribution::new(diag, Vector::zeros(n), self.faces.cells.clone())
  }
}
