//! ramsey-rs: optimal linear-quadratic policy under commitment
//!
//! Solves the discounted linear-quadratic control problem with forward-looking
//! (expectational) constraints when the policymaker can commit to a state-
//! contingent plan, the "Ramsey policy" problem of macroeconomic policy design.
//! The method is the generalized Schur (QZ) approach: build the pencil of
//! first-order conditions, order its stable roots first, and read the policy
//! off the stable deflating subspace.
//!
//! # Organization
//!
//! - `pencil`: problem validation, cost symmetrization and the `(G, D)` pencil
//! - `qz`: generalized Schur factorization and stable-root ordering (LAPACK
//!   ZGGES/ZTGSEN behind the `GeneralizedSchur` trait)
//! - `commitment`: solvability diagnostics and the feedback matrices `(M, C)`
//! - `simulation`: impulse responses, shock simulation, discounted loss
//!
//! # Example
//!
//! ```
//! use ndarray::arr2;
//! use ramsey_rs::commitment::commitment_solution;
//!
//! let sol = commitment_solution(
//!     &arr2(&[[0.5]]),
//!     &arr2(&[[1.0]]),
//!     &arr2(&[[1.0]]),
//!     &arr2(&[[1.0]]),
//!     &arr2(&[[0.0]]),
//!     0.95,
//!     1,
//!     0,
//!     1.000001,
//! )
//! .unwrap();
//! assert_eq!(sol.diagnostics.n_stable, 1);
//! ```

pub mod commitment;
pub mod error;
pub mod pencil;
pub mod qz;
pub mod simulation;

pub use commitment::{commitment_solution, solve_commitment, CommitmentSolution, SolverOptions};
pub use error::{RamseyError, Result};
pub use pencil::RamseyProblem;
