//! Generalized Schur (QZ) Factorization and Stable-Root Ordering
//!
//! The commitment pencil `(G, D)` is factored as
//! ```text
//! G = Q S Z^H,   D = Q T Z^H
//! ```
//! with `S`, `T` upper triangular and `Q`, `Z` unitary. Each diagonal pair
//! `(S_ii, T_ii)` is one generalized eigenvalue `μ_i = T_ii / S_ii`, the growth
//! factor of one mode of `G y(t+1) = D y(t)`.
//!
//! Factorization and reordering are consumed through the [`GeneralizedSchur`]
//! trait. [`LapackQz`] implements it with the complex LAPACK routines ZGGES
//! and ZTGSEN, so no 2×2 diagonal blocks appear and each diagonal entry can
//! be classified on its own.

use ndarray::{Array2, ShapeBuilder};
use num_complex::Complex64;
use std::os::raw::c_char;

use crate::error::{RamseyError, Result};

/// One generalized eigenvalue of a pencil.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GeneralizedEigenvalue {
    /// `T_ii / S_ii` with `S_ii != 0`
    Finite(Complex64),
    /// `S_ii == 0` (or the quotient overflows): a static or explosive mode
    Infinite,
}

impl GeneralizedEigenvalue {
    /// Eigenvalue of the diagonal pair `(s, t)`, i.e. `t / s`.
    pub fn from_pair(s: Complex64, t: Complex64) -> Self {
        if s.norm() == 0.0 {
            return Self::Infinite;
        }
        let mu = t / s;
        if mu.is_finite() {
            Self::Finite(mu)
        } else {
            Self::Infinite
        }
    }

    /// Modulus, `+∞` for an infinite eigenvalue.
    pub fn modulus(&self) -> f64 {
        match self {
            Self::Finite(mu) => mu.norm(),
            Self::Infinite => f64::INFINITY,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }
}

/// Stability classification of diagonal pairs.
///
/// Entry `i` is stable iff `|T_ii| <= cutoff * |S_ii|`. The comparison is
/// made on the diagonal magnitudes rather than on `|T_ii / S_ii|`, so an
/// infinite eigenvalue (`S_ii = 0`, `T_ii != 0`) is never stable and no
/// division takes place.
///
/// # Examples
///
/// ```
/// use num_complex::Complex64;
/// use ramsey_rs::qz::classify_stable;
///
/// let s = [Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];
/// let t = [Complex64::new(0.5, 0.0), Complex64::new(1.0, 0.0)];
/// assert_eq!(classify_stable(&s, &t, 1.00001), vec![true, false]);
/// ```
pub fn classify_stable(s_diag: &[Complex64], t_diag: &[Complex64], cutoff: f64) -> Vec<bool> {
    s_diag
        .iter()
        .zip(t_diag)
        .map(|(s, t)| t.norm() <= cutoff * s.norm())
        .collect()
}

/// Number of `true` entries of a classification vector.
pub fn count_stable(stable: &[bool]) -> usize {
    stable.iter().filter(|&&flag| flag).count()
}

/// Triangular generalized Schur form `(S, T)` with its unitary factors.
#[derive(Clone, Debug)]
pub struct SchurPencil {
    /// Upper triangular factor of G
    pub s: Array2<Complex64>,
    /// Upper triangular factor of D
    pub t: Array2<Complex64>,
    /// Left unitary factor
    pub q: Array2<Complex64>,
    /// Right unitary factor
    pub z: Array2<Complex64>,
}

impl SchurPencil {
    /// Dimension of the pencil.
    pub fn dim(&self) -> usize {
        self.s.nrows()
    }

    /// Diagonals of `S` and `T`.
    pub fn diagonals(&self) -> (Vec<Complex64>, Vec<Complex64>) {
        (self.s.diag().to_vec(), self.t.diag().to_vec())
    }

    /// Generalized eigenvalues in diagonal order.
    ///
    /// Always has `dim()` entries; positions without a diagonal pair are
    /// reported as `Infinite`.
    pub fn eigenvalues(&self) -> Vec<GeneralizedEigenvalue> {
        let (s_diag, t_diag) = self.diagonals();
        let mut eigs: Vec<_> = s_diag
            .iter()
            .zip(&t_diag)
            .map(|(&s, &t)| GeneralizedEigenvalue::from_pair(s, t))
            .collect();
        eigs.resize(self.dim(), GeneralizedEigenvalue::Infinite);
        eigs
    }

    /// Stability classification of the current diagonal, see
    /// [`classify_stable`]. Missing pairs count as unstable.
    pub fn stable_mask(&self, cutoff: f64) -> Vec<bool> {
        let (s_diag, t_diag) = self.diagonals();
        let mut mask = classify_stable(&s_diag, &t_diag, cutoff);
        mask.resize(self.dim(), false);
        mask
    }
}

/// Generalized Schur factorization and reordering.
///
/// Implementations must preserve `G = Q S Z^H` and `D = Q T Z^H` through
/// `reorder`, and be deterministic for fixed input.
pub trait GeneralizedSchur {
    /// Factor the real pencil `(g, d)`.
    fn factorize(&self, g: &Array2<f64>, d: &Array2<f64>) -> Result<SchurPencil>;

    /// Move the diagonal pairs flagged in `select` to the leading positions.
    fn reorder(&self, pencil: SchurPencil, select: &[bool]) -> Result<SchurPencil>;
}

/// LAPACK backend: ZGGES for the factorization, ZTGSEN for reordering.
#[derive(Clone, Copy, Debug, Default)]
pub struct LapackQz;

/// Column-major copy of a square matrix (Fortran convention).
fn to_column_major(a: &Array2<Complex64>) -> Vec<Complex64> {
    a.t().iter().copied().collect()
}

/// Rebuild a square matrix from column-major LAPACK output.
fn from_column_major(n: usize, data: Vec<Complex64>) -> Result<Array2<Complex64>> {
    Array2::from_shape_vec((n, n).f(), data)
        .map_err(|e| RamseyError::dimensions(format!("LAPACK output: {}", e)))
}

fn lapack_dim(n: usize) -> Result<i32> {
    i32::try_from(n)
        .map_err(|_| RamseyError::dimensions(format!("pencil of order {} is too large", n)))
}

impl GeneralizedSchur for LapackQz {
    fn factorize(&self, g: &Array2<f64>, d: &Array2<f64>) -> Result<SchurPencil> {
        let n = g.nrows();
        if g.ncols() != n || d.nrows() != n || d.ncols() != n {
            return Err(RamseyError::dimensions(format!(
                "pencil matrices must be square and equal in size, got {:?} and {:?}",
                g.shape(),
                d.shape()
            )));
        }

        if n == 0 {
            return Ok(SchurPencil {
                s: Array2::zeros((0, 0)),
                t: Array2::zeros((0, 0)),
                q: Array2::zeros((0, 0)),
                z: Array2::zeros((0, 0)),
            });
        }

        let n_i32 = lapack_dim(n)?;
        let mut a = to_column_major(&g.mapv(|v| Complex64::new(v, 0.0)));
        let mut b = to_column_major(&d.mapv(|v| Complex64::new(v, 0.0)));
        let mut alpha = vec![Complex64::new(0.0, 0.0); n];
        let mut beta = vec![Complex64::new(0.0, 0.0); n];
        let mut vsl = vec![Complex64::new(0.0, 0.0); n * n];
        let mut vsr = vec![Complex64::new(0.0, 0.0); n * n];
        let mut rwork = vec![0.0f64; 8 * n];
        let mut bwork = vec![0i32; n];
        let mut sdim: i32 = 0;
        let mut info: i32 = 0;

        let jobv = b'V' as c_char;
        let nosort = b'N' as c_char;

        // Query optimal workspace size (lwork = -1)
        let mut work_query = [Complex64::new(0.0, 0.0)];
        unsafe {
            lapack_sys::zgges_(
                &jobv,                      // JOBVSL: compute Q
                &jobv,                      // JOBVSR: compute Z
                &nosort,                    // SORT: ordering is done by ZTGSEN
                None,                       // SELCTG: unused without sorting
                &n_i32,                     // N
                a.as_mut_ptr() as *mut _,   // A: G on entry, S on exit
                &n_i32,                     // LDA
                b.as_mut_ptr() as *mut _,   // B: D on entry, T on exit
                &n_i32,                     // LDB
                &mut sdim,                  // SDIM
                alpha.as_mut_ptr() as *mut _,
                beta.as_mut_ptr() as *mut _,
                vsl.as_mut_ptr() as *mut _, // VSL: Q
                &n_i32,
                vsr.as_mut_ptr() as *mut _, // VSR: Z
                &n_i32,
                work_query.as_mut_ptr() as *mut _,
                &-1,
                rwork.as_mut_ptr(),
                bwork.as_mut_ptr(),
                &mut info,
            );
        }
        if info != 0 {
            return Err(RamseyError::Lapack {
                routine: "ZGGES",
                info,
            });
        }

        let optimal_lwork = (work_query[0].re as usize).max(2 * n).max(1);
        let mut work = vec![Complex64::new(0.0, 0.0); optimal_lwork];
        let lwork = lapack_dim(work.len())?;

        unsafe {
            lapack_sys::zgges_(
                &jobv,
                &jobv,
                &nosort,
                None,
                &n_i32,
                a.as_mut_ptr() as *mut _,
                &n_i32,
                b.as_mut_ptr() as *mut _,
                &n_i32,
                &mut sdim,
                alpha.as_mut_ptr() as *mut _,
                beta.as_mut_ptr() as *mut _,
                vsl.as_mut_ptr() as *mut _,
                &n_i32,
                vsr.as_mut_ptr() as *mut _,
                &n_i32,
                work.as_mut_ptr() as *mut _,
                &lwork,
                rwork.as_mut_ptr(),
                bwork.as_mut_ptr(),
                &mut info,
            );
        }
        if info != 0 {
            return Err(RamseyError::Lapack {
                routine: "ZGGES",
                info,
            });
        }

        Ok(SchurPencil {
            s: from_column_major(n, a)?,
            t: from_column_major(n, b)?,
            q: from_column_major(n, vsl)?,
            z: from_column_major(n, vsr)?,
        })
    }

    fn reorder(&self, pencil: SchurPencil, select: &[bool]) -> Result<SchurPencil> {
        let n = pencil.dim();
        if select.len() != n {
            return Err(RamseyError::dimensions(format!(
                "selection has {} entries for a pencil of order {}",
                select.len(),
                n
            )));
        }
        if n == 0 {
            return Ok(pencil);
        }

        let n_i32 = lapack_dim(n)?;
        let select_flags: Vec<i32> = select.iter().map(|&flag| i32::from(flag)).collect();
        let mut a = to_column_major(&pencil.s);
        let mut b = to_column_major(&pencil.t);
        let mut q = to_column_major(&pencil.q);
        let mut z = to_column_major(&pencil.z);
        let mut alpha = vec![Complex64::new(0.0, 0.0); n];
        let mut beta = vec![Complex64::new(0.0, 0.0); n];
        let mut m: i32 = 0;
        let mut pl = 0.0f64;
        let mut pr = 0.0f64;
        let mut dif = [0.0f64; 2];
        let mut info: i32 = 0;

        // Query workspace sizes (lwork = liwork = -1)
        let mut work_query = [Complex64::new(0.0, 0.0)];
        let mut iwork_query = [0i32];
        unsafe {
            lapack_sys::ztgsen_(
                &0,                   // IJOB: reorder only
                &1,                   // WANTQ
                &1,                   // WANTZ
                select_flags.as_ptr(),
                &n_i32,
                a.as_mut_ptr() as *mut _,
                &n_i32,
                b.as_mut_ptr() as *mut _,
                &n_i32,
                alpha.as_mut_ptr() as *mut _,
                beta.as_mut_ptr() as *mut _,
                q.as_mut_ptr() as *mut _,
                &n_i32,
                z.as_mut_ptr() as *mut _,
                &n_i32,
                &mut m,
                &mut pl,
                &mut pr,
                dif.as_mut_ptr(),
                work_query.as_mut_ptr() as *mut _,
                &-1,
                iwork_query.as_mut_ptr(),
                &-1,
                &mut info,
            );
        }
        if info != 0 {
            return Err(RamseyError::Lapack {
                routine: "ZTGSEN",
                info,
            });
        }

        let mut work = vec![Complex64::new(0.0, 0.0); (work_query[0].re as usize).max(1)];
        let mut iwork = vec![0i32; (iwork_query[0].max(1)) as usize];
        let lwork = lapack_dim(work.len())?;
        let liwork = lapack_dim(iwork.len())?;

        unsafe {
            lapack_sys::ztgsen_(
                &0,
                &1,
                &1,
                select_flags.as_ptr(),
                &n_i32,
                a.as_mut_ptr() as *mut _,
                &n_i32,
                b.as_mut_ptr() as *mut _,
                &n_i32,
                alpha.as_mut_ptr() as *mut _,
                beta.as_mut_ptr() as *mut _,
                q.as_mut_ptr() as *mut _,
                &n_i32,
                z.as_mut_ptr() as *mut _,
                &n_i32,
                &mut m,
                &mut pl,
                &mut pr,
                dif.as_mut_ptr(),
                work.as_mut_ptr() as *mut _,
                &lwork,
                iwork.as_mut_ptr(),
                &liwork,
                &mut info,
            );
        }
        if info != 0 {
            // INFO = 1: the swap was rejected because the pencil is too
            // close to ill-conditioned; the factors are left unchanged.
            return Err(RamseyError::Lapack {
                routine: "ZTGSEN",
                info,
            });
        }

        Ok(SchurPencil {
            s: from_column_major(n, a)?,
            t: from_column_major(n, b)?,
            q: from_column_major(n, q)?,
            z: from_column_major(n, z)?,
        })
    }
}

/// Factor `(g, d)`, move the stable roots to the front and classify again.
///
/// The classification is recomputed on the reordered diagonal rather than
/// permuted, since reordering may perturb entries lying on the boundary.
pub fn ordered_qz<B: GeneralizedSchur + ?Sized>(
    backend: &B,
    g: &Array2<f64>,
    d: &Array2<f64>,
    cutoff: f64,
) -> Result<(SchurPencil, Vec<bool>)> {
    let pencil = backend.factorize(g, d)?;
    let select = pencil.stable_mask(cutoff);
    log::trace!("stable roots before reordering: {:?}", select);

    let pencil = backend.reorder(pencil, &select)?;
    let stable = pencil.stable_mask(cutoff);
    Ok((pencil, stable))
}
