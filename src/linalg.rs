pub mod faer;

use crate::sparse::Vector;

pub trait DMatrixExt {
  fn is_symmetric(&self, eps: f64) -> bool;
  fn is_spd(&self) -> bool;
}
impl DMatrixExt for na::DMatrix<f64> {
  fn is_symmetric(&self, eps: f64) -> bool {
    self.is_square() && (self - self.transpose()).amax() <= eps
  }
  fn is_spd(&self) -> bool {
    self.is_symmetric(0.0) && na::Cholesky::new(self.clone()).is_some()
  }
}

/// Relative residual `|b - A x| / |b|`, or `|A x|` for `b = 0`.
pub fn relative_residual(a: &nas::CsrMatrix<f64>, x: &Vector, b: &Vector) -> f64 {
  let residual = (b - a * x).norm();
  let bnorm = b.norm();
  if bnorm == 0.0 {
    residual
  } else {
    residual / bnorm
  }
}

/// Inverted diagonal of `a`. Fails on a zero (or missing) diagonal entry.
pub fn inverse_diagonal(a: &nas::CsrMatrix<f64>) -> Option<Vector> {
  let mut diag = Vector::zeros(a.nrows());
  for (r, c, &v) in a.triplet_iter() {
    if r == c {
      diag[r] += v;
    }
  }
  diag
    .iter()
    .all(|&d| d != 0.0 && d.is_finite())
    .then(|| diag.map(|d| 1.0 / d))
}

pub fn assert_mat_eq(a: &na::DMatrix<f64>, b: &na::DMatrix<f64>, tol: Option<f64>) {
  let tol = tol.unwrap_or(10e-12);
  let diff = a - b;
  let error = diff.norm();
  let equal = error <= tol;
  if !equal {
    println!("Matrix a={a:.3}");
    println!("Matrix b={b:.3}");
    println!("a-b={diff:.3}");
    panic!("Matrices not equal.");
  }
}
