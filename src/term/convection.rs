//! Convection term `div(u phi)`.
//!
//! The coefficient is the volume flux `F = (u . n) area` through each face.
//! The face value is interpolated as `alpha phi1 + (1 - alpha) phi2`, where the
//! fraction `alpha` is chosen by the [`ConvectionScheme`], possibly depending
//! on the face Peclet number `P = F / (D area / distance)`.

use super::{
  diffusion::face_conductance, FaceTerm, FaceValues, StencilWeights, Treatment, WeightSet,
};
use crate::{error::AssemblyError, mesh::FaceMesh, sparse::Vector};

/// Below this magnitude the Peclet number is treated as zero.
const PECLET_EPS: f64 = 1e-3;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ConvectionScheme {
  #[default]
  Upwind,
  Central,
  Exponential,
  PowerLaw,
}

impl ConvectionScheme {
  /// Interpolation fraction of cell 1 for a face with Peclet number `peclet`.
  pub fn alpha(self, peclet: f64) -> f64 {
    match self {
      Self::Upwind => {
        if peclet > 0.0 {
          1.0
        } else if peclet < 0.0 {
          0.0
        } else {
          0.5
        }
      }
      Self::Central => 0.5,
      Self::Exponential => {
        if peclet.abs() < PECLET_EPS {
          0.5
        } else if peclet.is_infinite() {
          Self::Upwind.alpha(peclet)
        } else {
          (peclet - 1.0) / peclet + 1.0 / peclet.exp_m1()
        }
      }
      Self::PowerLaw => {
        let p = peclet;
        if p.is_infinite() {
          Self::Upwind.alpha(p)
        } else if p > 10.0 {
          (p - 1.0) / p
        } else if p > PECLET_EPS {
          ((p - 1.0) + (1.0 - p / 10.0).powi(5)) / p
        } else if p >= -PECLET_EPS {
          0.5
        } else if p >= -10.0 {
          ((1.0 + p / 10.0).powi(5) - 1.0) / p
        } else {
          -1.0 / p
        }
      }
    }
  }
}

#[derive(Debug, Clone)]
pub enum Velocity {
  /// The same velocity vector everywhere, projected onto the face normals.
  Uniform(na::DVector<f64>),
  /// Normal velocity `u . n` given per face.
  Normal(FaceValues),
}

#[derive(Debug, Clone)]
pub struct ConvectionTerm {
  velocity: Velocity,
  scheme: ConvectionScheme,
  /// Diffusivity entering the Peclet number.
  diffusivity: FaceValues,
  treatment: Treatment,
}

impl ConvectionTerm {
  pub fn new(velocity: Velocity, scheme: ConvectionScheme) -> Self {
    Self {
      velocity,
      scheme,
      diffusivity: FaceValues::Uniform(0.0),
      treatment: Treatment::Implicit,
    }
  }

  pub fn uniform(velocity: &[f64], scheme: ConvectionScheme) -> Self {
    Self::new(
      Velocity::Uniform(na::DVector::from_column_slice(velocity)),
      scheme,
    )
  }

  pub fn with_diffusivity(mut self, diffusivity: impl Into<FaceValues>) -> Self {
    self.diffusivity = diffusivity.into();
    self
  }

  pub fn with_treatment(mut self, treatment: Treatment) -> Self {
    self.treatment = treatment;
    self
  }

  /// `u . n` on every face.
  pub fn normal_velocity(&self, mesh: &dyn FaceMesh) -> Result<Vector, AssemblyError> {
    let nfaces = mesh.nfaces();
    match &self.velocity {
      Velocity::Uniform(u) => {
        let normals = mesh.face_normals();
        AssemblyError::check_len("velocity", normals.nrows(), u.len())?;
        Ok(normals.tr_mul(u))
      }
      Velocity::Normal(values) => values.broadcast("normal velocity", nfaces),
    }
  }

  /// Volume flux `(u . n) area` per face.
  pub fn face_flux(&self, mesh: &dyn FaceMesh) -> Result<Vector, AssemblyError> {
    let normal_velocity = self.normal_velocity(mesh)?;
    let areas = Vector::from_column_slice(mesh.face_areas());
    AssemblyError::check_len("face areas", normal_velocity.len(), areas.len())?;
    Ok(normal_velocity.component_mul(&areas))
  }

  /// Face Peclet numbers. Infinite where there is no diffusion.
  pub fn peclet(&self, mesh: &dyn FaceMesh) -> Result<Vector, AssemblyError> {
    let flux = self.face_flux(mesh)?;
    let conductance = face_conductance(&self.diffusivity, mesh)?;
    Ok(flux.zip_map(&conductance, |f, g| {
      if g == 0.0 {
        f * f64::INFINITY
      } else {
        f / g
      }
    }))
  }
}

impl FaceTerm for ConvectionTerm {
  fn coeff(&self, mesh: &dyn FaceMesh, _dt: f64) -> Result<FaceValues, AssemblyError> {
    self.face_flux(mesh).map(FaceValues::PerFace)
  }

  fn weights(&self, mesh: &dyn FaceMesh, _dt: f64) -> Result<WeightSet, AssemblyError> {
    let peclet = self.peclet(mesh)?;
    // 0 * inf is NaN on faces without flux and diffusion
    let alpha = peclet.map(|p| {
      if p.is_nan() {
        0.5
      } else {
        self.scheme.alpha(p)
      }
    });
    let weights = StencilWeights {
      cell1_diag: alpha.clone().into(),
      cell1_offdiag: alpha.map(|a| 1.0 - a).into(),
      cell2_diag: alpha.map(|a| -(1.0 - a)).into(),
      cell2_offdiag: alpha.map(|a| -a).into(),
    };
    Ok(WeightSet::new(self.treatment, weights))
  }
}
