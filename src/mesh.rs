//! A mesh of control volumes (cells) glued together along faces.
//!
//! The assembly only needs the face-to-cell incidence and the split of the
//! faces into interior and exterior ones. Each face has an ordered pair of
//! adjacent cells `(cell1, cell2)`. On exterior faces there is no second cell;
//! by convention `cell2 == cell1` there, acting as a ghost placeholder.
//! Face normals point from `cell1` to `cell2`, on exterior faces outwards.

pub mod boundary;
pub mod cartesian;

use crate::{error::AssemblyError, Dim};

pub type CellIdx = usize;
pub type FaceIdx = usize;

/// Read-only query interface of a finite volume mesh.
pub trait FaceMesh {
  fn dim(&self) -> Dim;
  fn ncells(&self) -> usize;
  fn nfaces(&self) -> usize;

  fn interior_faces(&self) -> &[FaceIdx];
  fn exterior_faces(&self) -> &[FaceIdx];
  /// The two adjacent cells of every face, indexed by face.
  fn adjacent_cells(&self) -> (&[CellIdx], &[CellIdx]);

  fn cell_volumes(&self) -> &[f64];
  fn face_areas(&self) -> &[f64];
  /// Distance between the centers of the two adjacent cells.
  /// For exterior faces the distance between cell center and face center.
  fn cell_distances(&self) -> &[f64];
  /// Unit face normals as columns, `dim x nfaces`.
  fn face_normals(&self) -> &na::DMatrix<f64>;

  fn is_exterior(&self, iface: FaceIdx) -> bool {
    let (cells1, cells2) = self.adjacent_cells();
    cells1[iface] == cells2[iface]
  }
}

/// Geometric quantities of a [`FaceComplex`].
#[derive(Debug, Clone)]
pub struct FaceGeometry {
  pub cell_volumes: Vec<f64>,
  pub face_areas: Vec<f64>,
  pub cell_distances: Vec<f64>,
  pub face_normals: na::DMatrix<f64>,
}

impl FaceGeometry {
  /// Unit volumes, areas and distances on a one dimensional mesh.
  pub fn unit(ncells: usize, nfaces: usize) -> Self {
    Self {
      cell_volumes: vec![1.0; ncells],
      face_areas: vec![1.0; nfaces],
      cell_distances: vec![1.0; nfaces],
      face_normals: na::DMatrix::from_element(1, nfaces, 1.0),
    }
  }
}

/// Cells and faces stored as plain incidence arrays.
#[derive(Debug, Clone)]
pub struct FaceComplex {
  ncells: usize,
  cells1: Vec<CellIdx>,
  cells2: Vec<CellIdx>,
  interior: Vec<FaceIdx>,
  exterior: Vec<FaceIdx>,
  geometry: FaceGeometry,
}

impl FaceComplex {
  /// Builds the mesh from the adjacent cells of each face.
  /// `None` as second cell marks an exterior face.
  /// Geometry defaults to [`FaceGeometry::unit`].
  pub fn from_adjacency(
    ncells: usize,
    adjacency: Vec<(CellIdx, Option<CellIdx>)>,
  ) -> Result<Self, AssemblyError> {
    let nfaces = adjacency.len();
    let mut cells1 = Vec::with_capacity(nfaces);
    let mut cells2 = Vec::with_capacity(nfaces);
    let mut interior = Vec::new();
    let mut exterior = Vec::new();

    for (iface, (icell1, icell2)) in adjacency.into_iter().enumerate() {
      AssemblyError::check_index("adjacent cell", icell1, ncells)?;
      match icell2 {
        Some(icell2) => {
          AssemblyError::check_index("adjacent cell", icell2, ncells)?;
          if icell1 == icell2 {
            return Err(AssemblyError::DegenerateFace(iface));
          }
          interior.push(iface);
          cells1.push(icell1);
          cells2.push(icell2);
        }
        None => {
          exterior.push(iface);
          cells1.push(icell1);
          cells2.push(icell1);
        }
      }
    }

    let geometry = FaceGeometry::unit(ncells, nfaces);
    Ok(Self {
      ncells,
      cells1,
      cells2,
      interior,
      exterior,
      geometry,
    })
  }

  pub fn with_geometry(mut self, geometry: FaceGeometry) -> Result<Self, AssemblyError> {
    let nfaces = self.nfaces();
    AssemblyError::check_len("cell volumes", self.ncells, geometry.cell_volumes.len())?;
    AssemblyError::check_len("face areas", nfaces, geometry.face_areas.len())?;
    AssemblyError::check_len("cell distances", nfaces, geometry.cell_distances.len())?;
    AssemblyError::check_len("face normals", nfaces, geometry.face_normals.ncols())?;
    self.geometry = geometry;
    Ok(self)
  }
}

impl FaceMesh for FaceComplex {
  fn dim(&self) -> Dim {
    self.geometry.face_normals.nrows()
  }
  fn ncells(&self) -> usize {
    self.ncells
  }
  fn nfaces(&self) -> usize {
    self.cells1.len()
  }
  fn interior_faces(&self) -> &[FaceIdx] {
    &self.interior
  }
  fn exterior_faces(&self) -> &[FaceIdx] {
    &self.exterior
  }
  fn adjacent_cells(&self) -> (&[CellIdx], &[CellIdx]) {
    (&self.cells1, &self.cells2)
  }
  fn cell_volumes(&self) -> &[f64] {
    &self.geometry.cell_volumes
  }
  fn face_areas(&self) -> &[f64] {
    &self.geometry.face_areas
  }
  fn cell_distances(&self) -> &[f64] {
    &self.geometry.cell_distances
  }
  fn face_normals(&self) -> &na::DMatrix<f64> {
    &self.geometry.face_normals
  }
}
