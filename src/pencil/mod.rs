//! Problem Data and Pencil Construction
//!
//! This module holds the validated inputs of a linear-quadratic commitment
//! problem and turns them into the generalized eigenvalue problem whose
//! stable deflating subspace is the optimal policy.
//!
//! The model is
//! ```text
//! [x1(t+1); E_t x2(t+1)] = A [x1(t); x2(t)] + B u(t) + [e(t+1); 0]
//! ```
//! with loss `E_0 Σ β^t (x'Qx + 2x'Uu + u'Ru)`, where `x1` are the
//! predetermined states (n1 of them) and `x2` the forward-looking states (n2).

use ndarray::{s, Array2, Axis};

use crate::error::{RamseyError, Result};

/// Symmetric part of a square matrix: `(M + M')/2`.
///
/// Cost matrices enter the loss only through their quadratic form, so an
/// asymmetric input is silently replaced by its symmetric part.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use ramsey_rs::pencil::symmetrize;
///
/// let q = arr2(&[[1.0, 4.0], [0.0, 2.0]]);
/// let qs = symmetrize(&q);
/// assert_eq!(qs, arr2(&[[1.0, 2.0], [2.0, 2.0]]));
/// ```
pub fn symmetrize(m: &Array2<f64>) -> Array2<f64> {
    (m + &m.t()) * 0.5
}

/// Validated commitment problem.
///
/// `q` and `r` are stored in symmetrized form. `k` (the number of controls)
/// is inferred from the dimension of `R`.
#[derive(Clone, Debug)]
pub struct RamseyProblem {
    /// n×n transition matrix, n = n1 + n2
    pub a: Array2<f64>,
    /// n×k control-impact matrix
    pub b: Array2<f64>,
    /// n×n state cost (symmetric)
    pub q: Array2<f64>,
    /// k×k control cost (symmetric)
    pub r: Array2<f64>,
    /// n×k state-control cross cost
    pub u: Array2<f64>,
    /// Discount factor
    pub beta: f64,
    /// Number of predetermined states
    pub n1: usize,
    /// Number of forward-looking states
    pub n2: usize,
}

impl RamseyProblem {
    /// Validate shapes and build a problem.
    ///
    /// # Arguments
    ///
    /// * `a` - n×n transition matrix with n = n1 + n2
    /// * `b` - n×k control-impact matrix
    /// * `q` - n×n state cost, symmetrized on entry
    /// * `r` - k×k control cost, symmetrized on entry
    /// * `u` - n×k cross cost
    /// * `beta` - discount factor; economically 0 < β ≤ 1 but only finiteness
    ///   is checked
    /// * `n1`, `n2` - numbers of predetermined and forward-looking states
    ///
    /// # Errors
    ///
    /// `InvalidDimensions` when any shape disagrees with `n1 + n2` or with
    /// `k = rows(R)`, `InvalidParameter` for a non-finite `beta`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        a: &Array2<f64>,
        b: &Array2<f64>,
        q: &Array2<f64>,
        r: &Array2<f64>,
        u: &Array2<f64>,
        beta: f64,
        n1: usize,
        n2: usize,
    ) -> Result<Self> {
        let n = n1 + n2;
        let k = r.nrows();

        if a.nrows() != n || a.ncols() != n {
            return Err(RamseyError::dimensions(format!(
                "A must be {}×{} (n1 + n2 = {}), got {}×{}",
                n,
                n,
                n,
                a.nrows(),
                a.ncols()
            )));
        }
        if r.ncols() != k {
            return Err(RamseyError::dimensions(format!(
                "R must be square, got {}×{}",
                k,
                r.ncols()
            )));
        }
        if b.nrows() != n || b.ncols() != k {
            return Err(RamseyError::dimensions(format!(
                "B must be {}×{}, got {}×{}",
                n,
                k,
                b.nrows(),
                b.ncols()
            )));
        }
        if q.nrows() != n || q.ncols() != n {
            return Err(RamseyError::dimensions(format!(
                "Q must be {}×{}, got {}×{}",
                n,
                n,
                q.nrows(),
                q.ncols()
            )));
        }
        if u.nrows() != n || u.ncols() != k {
            return Err(RamseyError::dimensions(format!(
                "U must be {}×{}, got {}×{}",
                n,
                k,
                u.nrows(),
                u.ncols()
            )));
        }
        if !beta.is_finite() {
            return Err(RamseyError::parameter(format!(
                "discount factor must be finite, got {}",
                beta
            )));
        }

        Ok(Self {
            a: a.clone(),
            b: b.clone(),
            q: symmetrize(q),
            r: symmetrize(r),
            u: u.clone(),
            beta,
            n1,
            n2,
        })
    }

    /// Total number of states n = n1 + n2.
    pub fn n_states(&self) -> usize {
        self.n1 + self.n2
    }

    /// Number of controls k.
    pub fn n_controls(&self) -> usize {
        self.r.nrows()
    }

    /// Dimension of the pencil, 2n + k.
    pub fn pencil_dim(&self) -> usize {
        2 * self.n_states() + self.n_controls()
    }
}

/// Matrix pencil `(G, D)` with `G y(t+1) = D y(t)`.
///
/// Columns are ordered `[x1, p2, x2, u, p1]`: the first n entries of `y` are
/// known at t (predetermined states and the costates of the forward block),
/// the remaining n + k are determined at t.
#[derive(Clone, Debug)]
pub struct Pencil {
    /// Left-hand matrix (multiplies y(t+1))
    pub g: Array2<f64>,
    /// Right-hand matrix (multiplies y(t))
    pub d: Array2<f64>,
    /// Number of predetermined entries of y (n1 + n2)
    pub n: usize,
    /// Number of controls
    pub k: usize,
}

/// Column permutation from natural order `[x1, x2, u, p1, p2]` to
/// `[x1, p2, x2, u, p1]`.
///
/// Entry `j` of the result is the natural-order column placed at position `j`.
///
/// # Examples
///
/// ```
/// use ramsey_rs::pencil::commitment_permutation;
///
/// // n1 = 1, n2 = 1, k = 1: natural [x1, x2, u, p1, p2]
/// assert_eq!(commitment_permutation(1, 1, 1), vec![0, 4, 1, 2, 3]);
/// ```
pub fn commitment_permutation(n1: usize, n2: usize, k: usize) -> Vec<usize> {
    let n = n1 + n2;
    let p2_start = n + k + n1;
    (0..n1)
        .chain(p2_start..p2_start + n2)
        .chain(n1..n + k + n1)
        .collect()
}

/// Build the pencil of first-order conditions of the commitment problem.
///
/// With Lagrange multipliers `p(t+1)` on the transition law, the optimality
/// conditions stacked over `y = [x; u; p]` read
/// ```text
/// G = [ I   0    0   ]      D = [  A    B   0 ]
///     [ 0   0   βA'  ]          [ -βQ  -βU  I ]
///     [ 0   0  -βB'  ]          [  βU'  βR  0 ]
/// ```
/// (transition law; costate law `p(t) = β(Qx + Uu + A'p(t+1))`; control
/// condition `U'x + Ru + B'p(t+1) = 0`). The columns are then permuted with
/// [`commitment_permutation`].
///
/// Row operations do not change the deflating subspaces, so only the column
/// order matters downstream.
pub fn build_pencil(problem: &RamseyProblem) -> Pencil {
    let n = problem.n_states();
    let k = problem.n_controls();
    let dim = problem.pencil_dim();
    let beta = problem.beta;

    // Row/column offsets of the blocks in natural order
    let u0 = n;
    let p0 = n + k;

    let mut g = Array2::zeros((dim, dim));
    let mut d = Array2::zeros((dim, dim));

    // Transition law: x(t+1) = A x(t) + B u(t)
    g.slice_mut(s![0..n, 0..n]).assign(&Array2::eye(n));
    d.slice_mut(s![0..n, 0..n]).assign(&problem.a);
    d.slice_mut(s![0..n, u0..p0]).assign(&problem.b);

    // Costate law: β A' p(t+1) = p(t) - β Q x(t) - β U u(t)
    g.slice_mut(s![n..2 * n, p0..dim])
        .assign(&(&problem.a.t() * beta));
    d.slice_mut(s![n..2 * n, 0..n])
        .assign(&(&problem.q * -beta));
    d.slice_mut(s![n..2 * n, u0..p0])
        .assign(&(&problem.u * -beta));
    d.slice_mut(s![n..2 * n, p0..dim]).assign(&Array2::eye(n));

    // Control condition: -β B' p(t+1) = β U' x(t) + β R u(t)
    g.slice_mut(s![2 * n..dim, p0..dim])
        .assign(&(&problem.b.t() * -beta));
    d.slice_mut(s![2 * n..dim, 0..n])
        .assign(&(&problem.u.t() * beta));
    d.slice_mut(s![2 * n..dim, u0..p0])
        .assign(&(&problem.r * beta));

    let perm = commitment_permutation(problem.n1, problem.n2, k);
    Pencil {
        g: g.select(Axis(1), &perm),
        d: d.select(Axis(1), &perm),
        n,
        k,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    fn scalar_problem() -> RamseyProblem {
        RamseyProblem::new(
            &arr2(&[[0.5]]),
            &arr2(&[[1.0]]),
            &arr2(&[[1.0]]),
            &arr2(&[[1.0]]),
            &arr2(&[[0.0]]),
            0.95,
            1,
            0,
        )
        .unwrap()
    }

    #[test]
    fn test_symmetrize_is_symmetric() {
        let q = arr2(&[[1.0, 3.0, -2.0], [0.5, 2.0, 7.0], [4.0, 1.0, 3.0]]);
        let qs = symmetrize(&q);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(qs[(i, j)], qs[(j, i)]);
            }
        }
        assert_abs_diff_eq!(qs[(0, 1)], 1.75, epsilon = 1e-15);
    }

    #[test]
    fn test_symmetrize_idempotent() {
        let q = arr2(&[[1.0, 3.0], [-5.0, 2.0]]);
        let once = symmetrize(&q);
        let twice = symmetrize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_problem_stores_symmetrized_costs() {
        let p = RamseyProblem::new(
            &arr2(&[[0.9, 0.0], [0.1, 1.1]]),
            &arr2(&[[0.0], [1.0]]),
            &arr2(&[[1.0, 2.0], [0.0, 1.0]]),
            &arr2(&[[0.5]]),
            &arr2(&[[0.0], [0.0]]),
            0.99,
            1,
            1,
        )
        .unwrap();
        assert_eq!(p.q, arr2(&[[1.0, 1.0], [1.0, 1.0]]));
        assert_eq!(p.n_states(), 2);
        assert_eq!(p.n_controls(), 1);
        assert_eq!(p.pencil_dim(), 5);
    }

    #[test]
    fn test_problem_dimension_mismatch() {
        let a = arr2(&[[0.5]]);
        let b = arr2(&[[1.0]]);
        let q = arr2(&[[1.0]]);
        let r = arr2(&[[1.0]]);
        let u = arr2(&[[0.0]]);

        // n1 + n2 disagrees with A
        let err = RamseyProblem::new(&a, &b, &q, &r, &u, 0.95, 1, 1).unwrap_err();
        assert!(matches!(err, RamseyError::InvalidDimensions { .. }));

        // B with the wrong number of controls
        let b_bad = arr2(&[[1.0, 0.0]]);
        let err = RamseyProblem::new(&a, &b_bad, &q, &r, &u, 0.95, 1, 0).unwrap_err();
        assert!(matches!(err, RamseyError::InvalidDimensions { .. }));

        // Non-square R
        let r_bad = arr2(&[[1.0, 0.0]]);
        let err = RamseyProblem::new(&a, &b, &q, &r_bad, &u, 0.95, 1, 0).unwrap_err();
        assert!(matches!(err, RamseyError::InvalidDimensions { .. }));
    }

    #[test]
    fn test_problem_rejects_nan_beta() {
        let m = arr2(&[[1.0]]);
        let err = RamseyProblem::new(&m, &m, &m, &m, &m, f64::NAN, 1, 0).unwrap_err();
        assert!(matches!(err, RamseyError::InvalidParameter { .. }));
    }

    #[test]
    fn test_permutation_blocks() {
        // natural: x1 = 0..2, x2 = 2..3, u = 3..5, p1 = 5..7, p2 = 7..8
        let perm = commitment_permutation(2, 1, 2);
        assert_eq!(perm, vec![0, 1, 7, 2, 3, 4, 5, 6]);

        // no forward-looking block: order is unchanged
        assert_eq!(commitment_permutation(2, 0, 1), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_scalar_pencil_layout() {
        let pencil = build_pencil(&scalar_problem());
        assert_eq!(pencil.n, 1);
        assert_eq!(pencil.k, 1);

        // columns [x, u, p]
        let g_expected = arr2(&[[1.0, 0.0, 0.0], [0.0, 0.0, 0.475], [0.0, 0.0, -0.95]]);
        let d_expected = arr2(&[[0.5, 1.0, 0.0], [-0.95, 0.0, 1.0], [0.0, 0.95, 0.0]]);
        for i in 0..3 {
            for j in 0..3 {
                assert_abs_diff_eq!(pencil.g[(i, j)], g_expected[(i, j)], epsilon = 1e-15);
                assert_abs_diff_eq!(pencil.d[(i, j)], d_expected[(i, j)], epsilon = 1e-15);
            }
        }
    }

    #[test]
    fn test_forward_costate_moves_to_front() {
        // n1 = 1, n2 = 1, k = 1 -> natural [x1, x2, u, p1, p2]
        let p = RamseyProblem::new(
            &arr2(&[[0.5, 0.0], [-2.0, 2.0]]),
            &arr2(&[[0.0], [-0.1]]),
            &arr2(&[[0.0, 0.0], [0.0, 1.0]]),
            &arr2(&[[0.25]]),
            &arr2(&[[0.0], [0.0]]),
            0.5,
            1,
            1,
        )
        .unwrap();
        let pencil = build_pencil(&p);
        assert_eq!(pencil.g.dim(), (5, 5));

        // Column 1 is p2: in G it carries β A'[:, 1] in the costate rows
        // and -β B'[1] in the control row.
        assert_abs_diff_eq!(pencil.g[(2, 1)], 0.5 * -2.0, epsilon = 1e-15);
        assert_abs_diff_eq!(pencil.g[(3, 1)], 0.5 * 2.0, epsilon = 1e-15);
        assert_abs_diff_eq!(pencil.g[(4, 1)], -0.5 * -0.1, epsilon = 1e-15);
        // and the identity in D's costate rows
        assert_abs_diff_eq!(pencil.d[(3, 1)], 1.0, epsilon = 1e-15);

        // Column 2 is x2: identity in G's first block, A[:, 1] in D
        assert_abs_diff_eq!(pencil.g[(1, 2)], 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(pencil.d[(1, 2)], 2.0, epsilon = 1e-15);
    }
}
