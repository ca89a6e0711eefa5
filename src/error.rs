//! Error types for the commitment solver.

use ndarray_linalg::error::LinalgError;

/// Errors that can occur while setting up or solving a commitment problem.
///
/// The three solvability outcomes (`InsufficientStableRoots`,
/// `ExcessStableRoots`, `RankDeficientTransform`) are properties of the input
/// data: they are reported, never retried, and no partial solution is
/// returned alongside them.
#[derive(Debug, thiserror::Error)]
pub enum RamseyError {
    /// Matrix shapes are inconsistent with each other or with `n1 + n2`.
    #[error("invalid dimensions: {msg}")]
    InvalidDimensions {
        /// Human-readable error description.
        msg: String,
    },

    /// A scalar parameter is outside its admissible range.
    #[error("invalid parameter: {msg}")]
    InvalidParameter {
        /// Human-readable error description.
        msg: String,
    },

    /// Fewer stable generalized eigenvalues than predetermined variables.
    #[error(
        "no bounded solution: {found} stable roots but {required} are required \
         (too few stable roots)"
    )]
    InsufficientStableRoots {
        /// Number of stable roots found after reordering.
        found: usize,
        /// Number of predetermined variables `n1 + n2`.
        required: usize,
    },

    /// More stable generalized eigenvalues than predetermined variables.
    #[error(
        "solution not unique: {found} stable roots but {required} are required \
         (too many stable roots)"
    )]
    ExcessStableRoots {
        /// Number of stable roots found after reordering.
        found: usize,
        /// Number of predetermined variables `n1 + n2`.
        required: usize,
    },

    /// The stable-subspace block of the right transformation is singular.
    #[error(
        "rank condition fails: condition number of Z11 is {condition:.3e} \
         (threshold {threshold:.1e})"
    )]
    RankDeficientTransform {
        /// 2-norm condition number of the leading block.
        condition: f64,
        /// Threshold the condition number was compared against.
        threshold: f64,
    },

    /// A LAPACK routine returned a non-zero INFO code.
    #[error("{routine} failed with INFO={info}")]
    Lapack {
        /// Name of the routine.
        routine: &'static str,
        /// INFO value as returned by LAPACK.
        info: i32,
    },

    /// Dense linear algebra failure (inversion, SVD).
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

/// Result type for commitment-solver operations.
pub type Result<T> = std::result::Result<T, RamseyError>;

impl RamseyError {
    /// Create an invalid dimensions error.
    pub fn dimensions<S: Into<String>>(msg: S) -> Self {
        Self::InvalidDimensions { msg: msg.into() }
    }

    /// Create an invalid parameter error.
    pub fn parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter { msg: msg.into() }
    }

    /// True for the outcomes meaning "the problem has no unique bounded
    /// solution", as opposed to bad input or a numerical library failure.
    pub fn is_no_solution(&self) -> bool {
        matches!(
            self,
            Self::InsufficientStableRoots { .. }
                | Self::ExcessStableRoots { .. }
                | Self::RankDeficientTransform { .. }
        )
    }
}
