//! Optimal Policy Under Commitment
//!
//! This module solves the discounted linear-quadratic control problem with
//! forward-looking constraints when the policymaker can commit (the "Ramsey"
//! problem). The solution is expressed in the reduced state
//! `k(t) = [x1(t); p2(t)]` of predetermined states and the costates of the
//! forward-looking block:
//!
//! ```text
//! k(t+1) = M k(t) + [e(t+1); 0]
//! [x2(t); u(t); p1(t)] = C k(t)
//! ```
//!
//! with `p2(0) = 0` at the start of the commitment.

use ndarray::{s, Array2, ArrayView2};
use ndarray_linalg::{Inverse, SVD};
use num_complex::Complex64;

use crate::error::{RamseyError, Result};
use crate::pencil::{build_pencil, RamseyProblem};
use crate::qz::{count_stable, ordered_qz, GeneralizedEigenvalue, GeneralizedSchur, LapackQz};

/// Default eigenvalue modulus cutoff; slightly above one so that numerical
/// unit roots count as stable.
pub const DEFAULT_CUTOFF: f64 = 1.00001;

/// Default upper bound on the condition number of the stable-subspace block.
pub const DEFAULT_MAX_CONDITION: f64 = 1e14;

/// Imaginary residue (relative to the output norm) above which a warning is logged.
const IMAGINARY_WARN_TOL: f64 = 1e-8;

/// Tunables of the commitment solver.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverOptions {
    /// A root is stable iff `|T_ii| <= cutoff * |S_ii|`
    pub cutoff: f64,
    /// Largest admissible condition number of `Z11`
    pub max_condition: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            max_condition: DEFAULT_MAX_CONDITION,
        }
    }
}

impl SolverOptions {
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_max_condition(mut self, max_condition: f64) -> Self {
        self.max_condition = max_condition;
        self
    }

    /// Check that both tunables are positive and finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.cutoff.is_finite() && self.cutoff > 0.0) {
            return Err(RamseyError::parameter(format!(
                "cutoff must be positive and finite, got {}",
                self.cutoff
            )));
        }
        if !(self.max_condition.is_finite() && self.max_condition > 0.0) {
            return Err(RamseyError::parameter(format!(
                "max_condition must be positive and finite, got {}",
                self.max_condition
            )));
        }
        Ok(())
    }
}

/// Numerical diagnostics of a successful solve.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    /// Generalized eigenvalues after reordering (stable ones first)
    pub eigenvalues: Vec<GeneralizedEigenvalue>,
    /// Stability classification of `eigenvalues`
    pub stable: Vec<bool>,
    /// Number of stable roots (equals n on success)
    pub n_stable: usize,
    /// 2-norm condition number of `Z11`
    pub transform_condition: f64,
    /// Largest absolute imaginary component dropped from `M` and `C`
    pub imaginary_residue: f64,
}

/// Commitment solution `(M, C)`.
#[derive(Clone, Debug)]
pub struct CommitmentSolution {
    /// n×n transition of `[x1; p2]`
    pub m: Array2<f64>,
    /// (n2+k+n1)×n map from `[x1; p2]` to `[x2; u; p1]`
    pub c: Array2<f64>,
    /// Number of predetermined states
    pub n1: usize,
    /// Number of forward-looking states
    pub n2: usize,
    /// Number of controls
    pub k: usize,
    pub diagnostics: Diagnostics,
}

impl CommitmentSolution {
    /// Rows of `C` giving the forward-looking states `x2`.
    pub fn x2_rows(&self) -> ArrayView2<'_, f64> {
        self.c.slice(s![0..self.n2, ..])
    }

    /// Rows of `C` giving the controls `u`.
    pub fn u_rows(&self) -> ArrayView2<'_, f64> {
        self.c.slice(s![self.n2..self.n2 + self.k, ..])
    }

    /// Rows of `C` giving the costates `p1` of the predetermined block.
    pub fn p1_rows(&self) -> ArrayView2<'_, f64> {
        self.c.slice(s![self.n2 + self.k.., ..])
    }

    /// Number of entries of the reduced state, n1 + n2.
    pub fn n_states(&self) -> usize {
        self.n1 + self.n2
    }
}

/// Solve the commitment problem with default solver options except `cutoff`.
///
/// # Arguments
///
/// * `a` - n×n transition matrix, n = n1 + n2
/// * `b` - n×k control-impact matrix
/// * `q` - n×n state cost (only its symmetric part is used)
/// * `r` - k×k control cost (only its symmetric part is used)
/// * `u` - n×k state-control cross cost; the period loss is
///   `x'Qx + 2x'Uu + u'Ru`
/// * `bet` - discount factor
/// * `n1` - number of predetermined states (first n1 entries of x)
/// * `n2` - number of forward-looking states (last n2 entries of x)
/// * `cutoff` - a root `μ` counts as stable iff `|T_ii| <= cutoff·|S_ii|`,
///   i.e. `|μ| <= cutoff`; values slightly above 1 (e.g. 1.00001) keep
///   numerical unit roots
///
/// # Returns
///
/// `Ok(CommitmentSolution)` with `M` (n×n) and `C` ((n2+k+n1)×n), or the
/// tagged failure: `InsufficientStableRoots`, `ExcessStableRoots`,
/// `RankDeficientTransform`, or an input/LAPACK error.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use ramsey_rs::commitment::commitment_solution;
///
/// // Scalar regulator: x(t+1) = 0.5 x(t) + u(t), loss Σ 0.95^t (x² + u²)
/// let sol = commitment_solution(
///     &arr2(&[[0.5]]),
///     &arr2(&[[1.0]]),
///     &arr2(&[[1.0]]),
///     &arr2(&[[1.0]]),
///     &arr2(&[[0.0]]),
///     0.95,
///     1,
///     0,
///     1.000001,
/// )
/// .unwrap();
///
/// assert_eq!(sol.m.dim(), (1, 1));
/// assert_eq!(sol.c.dim(), (2, 1)); // [u; p1]
/// assert!(sol.m[(0, 0)] > 0.0 && sol.m[(0, 0)] < 0.5);
/// ```
///
/// # Algorithm
///
/// 1. **Pencil**: symmetrize Q and R, build `(G, D)` of order 2n+k and order
///    its columns as `[x1, p2, x2, u, p1]` (see [`crate::pencil`])
/// 2. **QZ**: `G = Q S Z^H`, `D = Q T Z^H` via LAPACK's **ZGGES**
/// 3. **Ordering**: move the stable roots to the top-left with **ZTGSEN** and
///    classify the reordered diagonal again
/// 4. **Diagnostics**: exactly n stable roots are required, and
///    `Z11 = Z[0..n, 0..n]` must have condition number below `1e14`
/// 5. **Assembly**: `M = Re(Z11 S11⁻¹ T11 Z11⁻¹)`, `C = Re(Z21 Z11⁻¹)`
#[allow(clippy::too_many_arguments)]
pub fn commitment_solution(
    a: &Array2<f64>,
    b: &Array2<f64>,
    q: &Array2<f64>,
    r: &Array2<f64>,
    u: &Array2<f64>,
    bet: f64,
    n1: usize,
    n2: usize,
    cutoff: f64,
) -> Result<CommitmentSolution> {
    let problem = RamseyProblem::new(a, b, q, r, u, bet, n1, n2)?;
    let options = SolverOptions::default().with_cutoff(cutoff);
    solve_commitment(&problem, &options, &LapackQz)
}

/// Solve a validated problem with explicit options and QZ backend.
pub fn solve_commitment<B: GeneralizedSchur + ?Sized>(
    problem: &RamseyProblem,
    options: &SolverOptions,
    backend: &B,
) -> Result<CommitmentSolution> {
    options.validate()?;

    let n = problem.n_states();
    let k = problem.n_controls();
    let pencil = build_pencil(problem);
    log::debug!(
        "commitment pencil of order {} (n1={}, n2={}, k={})",
        problem.pencil_dim(),
        problem.n1,
        problem.n2,
        k
    );

    let (schur, stable) = ordered_qz(backend, &pencil.g, &pencil.d, options.cutoff)?;
    let eigenvalues = schur.eigenvalues();
    let n_stable = count_stable(&stable);
    log::debug!("{} stable roots, {} required", n_stable, n);
    log::trace!("reordered roots: {:?}", eigenvalues);

    check_solvability(n_stable, n)?;

    if n == 0 {
        return Ok(CommitmentSolution {
            m: Array2::zeros((0, 0)),
            c: Array2::zeros((k, 0)),
            n1: problem.n1,
            n2: problem.n2,
            k,
            diagnostics: Diagnostics {
                eigenvalues,
                stable,
                n_stable,
                transform_condition: 1.0,
                imaginary_residue: 0.0,
            },
        });
    }

    let stt = schur.s.slice(s![0..n, 0..n]);
    let ttt = schur.t.slice(s![0..n, 0..n]);
    let zkt = schur.z.slice(s![0..n, 0..n]);
    let zlt = schur.z.slice(s![n.., 0..n]);

    let condition = transform_condition(zkt)?;
    log::debug!("condition number of Z11: {:.3e}", condition);
    if !(condition <= options.max_condition) {
        return Err(RamseyError::RankDeficientTransform {
            condition,
            threshold: options.max_condition,
        });
    }

    let feedback = assemble_feedback(stt, ttt, zkt, zlt)?;

    Ok(CommitmentSolution {
        m: feedback.m,
        c: feedback.c,
        n1: problem.n1,
        n2: problem.n2,
        k,
        diagnostics: Diagnostics {
            eigenvalues,
            stable,
            n_stable,
            transform_condition: condition,
            imaginary_residue: feedback.imaginary_residue,
        },
    })
}

/// Saddle-path counting condition: exactly `n` stable roots.
pub fn check_solvability(n_stable: usize, n: usize) -> Result<()> {
    if n_stable < n {
        return Err(RamseyError::InsufficientStableRoots {
            found: n_stable,
            required: n,
        });
    }
    if n_stable > n {
        return Err(RamseyError::ExcessStableRoots {
            found: n_stable,
            required: n,
        });
    }
    Ok(())
}

/// 2-norm condition number `σmax / σmin` of a square block.
///
/// Returns `+∞` for an exactly singular block and 1 for an empty one.
pub fn transform_condition(zkt: ArrayView2<'_, Complex64>) -> Result<f64> {
    if zkt.is_empty() {
        return Ok(1.0);
    }
    let (_, sigma, _) = zkt.svd(false, false)?;
    let smax = sigma.iter().copied().fold(0.0, f64::max);
    let smin = sigma.iter().copied().fold(f64::INFINITY, f64::min);
    if smin == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok(smax / smin)
}

/// Real feedback matrices and the imaginary residue that was dropped.
#[derive(Clone, Debug)]
pub struct Feedback {
    pub m: Array2<f64>,
    pub c: Array2<f64>,
    pub imaginary_residue: f64,
}

/// `M = Re(Z11 S11⁻¹ T11 Z11⁻¹)` and `C = Re(Z21 Z11⁻¹)`.
///
/// `G` and `D` are real, so the exact result is real and the imaginary
/// parts are rounding noise. Their largest magnitude is returned in
/// [`Feedback::imaginary_residue`].
pub fn assemble_feedback(
    stt: ArrayView2<'_, Complex64>,
    ttt: ArrayView2<'_, Complex64>,
    zkt: ArrayView2<'_, Complex64>,
    zlt: ArrayView2<'_, Complex64>,
) -> Result<Feedback> {
    let zkt_inv = zkt.inv()?;
    let stt_inv = stt.inv()?;

    let m_complex = zkt.dot(&stt_inv).dot(&ttt).dot(&zkt_inv);
    let c_complex = zlt.dot(&zkt_inv);

    let imaginary_residue = m_complex
        .iter()
        .chain(c_complex.iter())
        .map(|v| v.im.abs())
        .fold(0.0, f64::max);
    let scale = m_complex
        .iter()
        .chain(c_complex.iter())
        .map(|v| v.norm())
        .fold(1.0, f64::max);
    if imaginary_residue > IMAGINARY_WARN_TOL * scale {
        log::warn!(
            "discarding imaginary residue {:.3e} from commitment solution (scale {:.3e})",
            imaginary_residue,
            scale
        );
    }

    Ok(Feedback {
        m: m_complex.mapv(|v| v.re),
        c: c_complex.mapv(|v| v.re),
        imaginary_residue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr2, Array2};

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn test_options_default() {
        let opts = SolverOptions::default();
        assert_eq!(opts.cutoff, 1.00001);
        assert_eq!(opts.max_condition, 1e14);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_options_reject_bad_values() {
        assert!(SolverOptions::default().with_cutoff(0.0).validate().is_err());
        assert!(SolverOptions::default()
            .with_cutoff(f64::NAN)
            .validate()
            .is_err());
        assert!(SolverOptions::default()
            .with_max_condition(-1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_check_solvability() {
        assert!(check_solvability(2, 2).is_ok());
        assert!(matches!(
            check_solvability(1, 2),
            Err(RamseyError::InsufficientStableRoots {
                found: 1,
                required: 2
            })
        ));
        assert!(matches!(
            check_solvability(3, 2),
            Err(RamseyError::ExcessStableRoots {
                found: 3,
                required: 2
            })
        ));
    }

    #[test]
    fn test_transform_condition() {
        let well = arr2(&[[c(2.0), c(0.0)], [c(0.0), c(1.0)]]);
        assert_abs_diff_eq!(transform_condition(well.view()).unwrap(), 2.0, epsilon = 1e-12);

        let singular = arr2(&[[c(1.0), c(2.0)], [c(2.0), c(4.0)]]);
        assert!(transform_condition(singular.view()).unwrap() > 1e14);

        let empty: Array2<Complex64> = Array2::zeros((0, 0));
        assert_eq!(transform_condition(empty.view()).unwrap(), 1.0);
    }

    #[test]
    fn test_assemble_feedback_scalar() {
        // M = z s⁻¹ t z⁻¹ = t / s for 1×1 blocks
        let stt = arr2(&[[c(2.0)]]);
        let ttt = arr2(&[[c(0.5)]]);
        let zkt = arr2(&[[c(0.8)]]);
        let zlt = arr2(&[[c(0.4)], [c(-0.2)]]);
        let fb = assemble_feedback(stt.view(), ttt.view(), zkt.view(), zlt.view()).unwrap();

        assert_abs_diff_eq!(fb.m[(0, 0)], 0.25, epsilon = 1e-14);
        assert_abs_diff_eq!(fb.c[(0, 0)], 0.5, epsilon = 1e-14);
        assert_abs_diff_eq!(fb.c[(1, 0)], -0.25, epsilon = 1e-14);
        assert_eq!(fb.imaginary_residue, 0.0);
    }

    #[test]
    fn test_assemble_feedback_drops_imaginary_part() {
        let stt = arr2(&[[Complex64::new(1.0, 1.0)]]);
        let ttt = arr2(&[[Complex64::new(0.0, 1.0)]]);
        let zkt = arr2(&[[c(1.0)]]);
        let zlt = arr2(&[[c(1.0)]]);
        let fb = assemble_feedback(stt.view(), ttt.view(), zkt.view(), zlt.view()).unwrap();

        // i / (1 + i) = (1 + i) / 2
        assert_abs_diff_eq!(fb.m[(0, 0)], 0.5, epsilon = 1e-14);
        assert_abs_diff_eq!(fb.imaginary_residue, 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_solution_row_blocks() {
        let sol = CommitmentSolution {
            m: Array2::eye(2),
            c: Array2::from_shape_fn((4, 2), |(i, j)| (10 * i + j) as f64),
            n1: 1,
            n2: 1,
            k: 2,
            diagnostics: Diagnostics {
                eigenvalues: vec![],
                stable: vec![],
                n_stable: 2,
                transform_condition: 1.0,
                imaginary_residue: 0.0,
            },
        };
        assert_eq!(sol.x2_rows().dim(), (1, 2));
        assert_eq!(sol.u_rows().dim(), (2, 2));
        assert_eq!(sol.p1_rows().dim(), (1, 2));
        assert_eq!(sol.u_rows()[(0, 1)], 11.0);
        assert_eq!(sol.p1_rows()[(0, 0)], 30.0);
        assert_eq!(sol.n_states(), 2);
    }

    #[test]
    fn test_solve_rejects_bad_cutoff() {
        let m = arr2(&[[1.0]]);
        let problem = RamseyProblem::new(&m, &m, &m, &m, &m, 0.9, 1, 0).unwrap();
        let opts = SolverOptions::default().with_cutoff(-1.0);
        let err = solve_commitment(&problem, &opts, &LapackQz).unwrap_err();
        assert!(matches!(err, RamseyError::InvalidParameter { .. }));
    }
}
