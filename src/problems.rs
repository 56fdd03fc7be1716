pub mod convection_diffusion;
pub mod diffusion;
