extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod assemble;
pub mod boundary;
pub mod equation;
pub mod error;
pub mod linalg;
pub mod lse;
pub mod mesh;
pub mod problems;
pub mod sparse;
pub mod term;
pub mod variable;

pub type Dim = usize;

pub use error::{AssemblyError, Error, SolveError};
