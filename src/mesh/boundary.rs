use super::{FaceIdx, FaceMesh};
use crate::error::AssemblyError;

/// Exterior faces whose normal has a positive component along `direction`,
/// e.g. the outflow faces of a uniform velocity.
pub fn exterior_faces_facing(
  mesh: &dyn FaceMesh,
  direction: &[f64],
) -> Result<Vec<FaceIdx>, AssemblyError> {
  AssemblyError::check_len("direction", mesh.dim(), direction.len())?;
  let normals = mesh.face_normals();
  let direction = na::DVector::from_column_slice(direction);
  Ok(
    mesh
      .exterior_faces()
      .iter()
      .copied()
      .filter(|&iface| normals.column(iface).dot(&direction) > 0.0)
      .collect(),
  )
}
