use crate::{error::AssemblyError, mesh::FaceMesh, sparse::Vector};

/// Cell-centered unknown on a mesh, together with its value at the previous
/// time step.
#[derive(Clone)]
pub struct CellVariable<'m> {
  mesh: &'m dyn FaceMesh,
  values: Vector,
  old: Vector,
}

impl<'m> CellVariable<'m> {
  pub fn new(mesh: &'m dyn FaceMesh, values: Vector) -> Result<Self, AssemblyError> {
    AssemblyError::check_len("cell variable", mesh.ncells(), values.len())?;
    let old = values.clone();
    Ok(Self { mesh, values, old })
  }

  pub fn uniform(mesh: &'m dyn FaceMesh, value: f64) -> Self {
    let values = Vector::from_element(mesh.ncells(), value);
    let old = values.clone();
    Self { mesh, values, old }
  }

  pub fn mesh(&self) -> &'m dyn FaceMesh {
    self.mesh
  }
  pub fn values(&self) -> &Vector {
    &self.values
  }
  pub fn old(&self) -> &Vector {
    &self.old
  }
  pub fn len(&self) -> usize {
    self.values.len()
  }
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn set_values(&mut self, values: Vector) -> Result<(), AssemblyError> {
    AssemblyError::check_len("cell variable", self.values.len(), values.len())?;
    self.values = values;
    Ok(())
  }

  /// Mutable access for in-place solves. The length must not change.
  pub(crate) fn values_mut(&mut self) -> &mut Vector {
    &mut self.values
  }

  /// Marks the current values as those of the previous time step.
  pub fn update_old(&mut self) {
    self.old.copy_from(&self.values);
  }

  /// Resets both the current and the previous values. Lengths must match.
  pub(crate) fn restore(&mut self, values: &Vector, old: &Vector) {
    self.values.copy_from(values);
    self.old.copy_from(old);
  }
}

impl std::fmt::Debug for CellVariable<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CellVariable")
      .field("ncells", &self.mesh.ncells())
      .field("values", &self.values)
      .field("old", &self.old)
      .finish()
  }
}
