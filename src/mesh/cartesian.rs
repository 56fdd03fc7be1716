//! Uniform tensor-product grids in one and two dimensions.
//!
//! Cells are numbered lexicographically, `icell = ix + nx * iy`.
//! Faces normal to x come first (row by row, `nx + 1` per row), then the
//! faces normal to y (`ny + 1` rows of `nx` faces).

use super::{CellIdx, FaceComplex, FaceGeometry, FaceIdx};
use crate::{error::AssemblyError, Dim};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
  Left,
  Right,
  Bottom,
  Top,
}

#[derive(Debug, Clone)]
pub struct CartesianGrid {
  dim: Dim,
  ncells_axis: [usize; 2],
  spacing: [f64; 2],
  mesh: FaceComplex,
}

impl CartesianGrid {
  pub fn new_1d(nx: usize, dx: f64) -> Result<Self, AssemblyError> {
    Self::build(1, [nx, 1], [dx, 1.0])
  }

  pub fn new_2d(nx: usize, ny: usize, dx: f64, dy: f64) -> Result<Self, AssemblyError> {
    Self::build(2, [nx, ny], [dx, dy])
  }

  fn build(dim: Dim, ncells_axis: [usize; 2], spacing: [f64; 2]) -> Result<Self, AssemblyError> {
    let [nx, ny] = ncells_axis;
    let [dx, dy] = spacing;
    let ncells = nx * ny;
    let cell_idx = |ix: usize, iy: usize| -> CellIdx { ix + nx * iy };

    let mut adjacency = Vec::new();
    let mut face_areas = Vec::new();
    let mut cell_distances = Vec::new();
    let mut normals = Vec::new();

    for iy in 0..ny {
      for ix in 0..=nx {
        let (face, sign) = match ix {
          0 => ((cell_idx(0, iy), None), -1.0),
          _ if ix == nx => ((cell_idx(nx - 1, iy), None), 1.0),
          _ => ((cell_idx(ix - 1, iy), Some(cell_idx(ix, iy))), 1.0),
        };
        let distance = if face.1.is_some() { dx } else { 0.5 * dx };
        adjacency.push(face);
        face_areas.push(dy);
        cell_distances.push(distance);
        normals.push([sign, 0.0]);
      }
    }

    if dim == 2 {
      for iy in 0..=ny {
        for ix in 0..nx {
          let (face, sign) = match iy {
            0 => ((cell_idx(ix, 0), None), -1.0),
            _ if iy == ny => ((cell_idx(ix, ny - 1), None), 1.0),
            _ => ((cell_idx(ix, iy - 1), Some(cell_idx(ix, iy))), 1.0),
          };
          let distance = if face.1.is_some() { dy } else { 0.5 * dy };
          adjacency.push(face);
          face_areas.push(dx);
          cell_distances.push(distance);
          normals.push([0.0, sign]);
        }
      }
    }

    let nfaces = adjacency.len();
    let face_normals = na::DMatrix::from_fn(dim, nfaces, |icomp, iface| normals[iface][icomp]);
    let cell_volume = if dim == 2 { dx * dy } else { dx };
    let geometry = FaceGeometry {
      cell_volumes: vec![cell_volume; ncells],
      face_areas,
      cell_distances,
      face_normals,
    };

    let mesh = FaceComplex::from_adjacency(ncells, adjacency)?.with_geometry(geometry)?;
    Ok(Self {
      dim,
      ncells_axis,
      spacing,
      mesh,
    })
  }

  pub fn mesh(&self) -> &FaceComplex {
    &self.mesh
  }

  /// Cell centers as columns, `dim x ncells`.
  pub fn cell_centers(&self) -> na::DMatrix<f64> {
    let [nx, _] = self.ncells_axis;
    let [dx, dy] = self.spacing;
    let ncells = self.ncells_axis.iter().product();
    na::DMatrix::from_fn(self.dim, ncells, |icomp, icell| match icomp {
      0 => (0.5 + (icell % nx) as f64) * dx,
      _ => (0.5 + (icell / nx) as f64) * dy,
    })
  }

  /// Exterior faces on one side of the grid, ordered along the side.
  pub fn faces_on(&self, side: Side) -> Vec<FaceIdx> {
    let [nx, ny] = self.ncells_axis;
    let nxfaces = (nx + 1) * ny;
    match side {
      Side::Left => (0..ny).map(|iy| iy * (nx + 1)).collect(),
      Side::Right => (0..ny).map(|iy| iy * (nx + 1) + nx).collect(),
      Side::Bottom if self.dim == 2 => (0..nx).map(|ix| nxfaces + ix).collect(),
      Side::Top if self.dim == 2 => (0..nx).map(|ix| nxfaces + ny * nx + ix).collect(),
      Side::Bottom | Side::Top => Vec::new(),
    }
  }
}
