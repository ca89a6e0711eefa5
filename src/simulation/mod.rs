//! Simulation of Commitment Solutions
//!
//! Iterates the reduced law of motion
//! ```text
//! k(t) = M k(t-1) + [e(t); 0],   [x2(t); u(t); p1(t)] = C k(t)
//! ```
//! where `k = [x1; p2]`. Shocks only hit the predetermined states; the
//! costates `p2` are never shocked and start at zero under a fresh
//! commitment.

use ndarray::{s, Array1, Array2, ArrayView2};

use crate::commitment::CommitmentSolution;
use crate::error::{RamseyError, Result};
use crate::pencil::RamseyProblem;

/// Simulated path, one row per period.
#[derive(Clone, Debug)]
pub struct Trajectory {
    /// periods × n, columns `[x1, p2]`
    pub reduced: Array2<f64>,
    /// periods × (n2+k+n1), columns `[x2, u, p1]`
    pub determined: Array2<f64>,
    n1: usize,
    n2: usize,
    k: usize,
}

impl Trajectory {
    pub fn periods(&self) -> usize {
        self.reduced.nrows()
    }

    pub fn x1(&self) -> ArrayView2<'_, f64> {
        self.reduced.slice(s![.., 0..self.n1])
    }

    pub fn p2(&self) -> ArrayView2<'_, f64> {
        self.reduced.slice(s![.., self.n1..])
    }

    pub fn x2(&self) -> ArrayView2<'_, f64> {
        self.determined.slice(s![.., 0..self.n2])
    }

    pub fn u(&self) -> ArrayView2<'_, f64> {
        self.determined.slice(s![.., self.n2..self.n2 + self.k])
    }

    pub fn p1(&self) -> ArrayView2<'_, f64> {
        self.determined.slice(s![.., self.n2 + self.k..])
    }

    /// Full state `[x1, x2]` per period (periods × n).
    pub fn states(&self) -> Array2<f64> {
        let mut x = Array2::zeros((self.periods(), self.n1 + self.n2));
        x.slice_mut(s![.., 0..self.n1]).assign(&self.x1());
        x.slice_mut(s![.., self.n1..]).assign(&self.x2());
        x
    }
}

/// Simulate from `initial = [x1(0); p2(0)]` under a shock sequence.
///
/// `shocks` has one row per period and n1 columns; row `t` is added to
/// `x1(t)` (row 0 shocks the initial state).
///
/// # Examples
///
/// ```no_run
/// use ndarray::{arr1, Array2};
/// use ramsey_rs::simulation::simulate;
/// # fn demo(sol: &ramsey_rs::commitment::CommitmentSolution) {
/// let mut shocks = Array2::zeros((20, sol.n1));
/// shocks[(5, 0)] = 1.0;
/// let path = simulate(sol, &arr1(&[0.0, 0.0]), &shocks).unwrap();
/// println!("{}", path.u());
/// # }
/// ```
pub fn simulate(
    solution: &CommitmentSolution,
    initial: &Array1<f64>,
    shocks: &Array2<f64>,
) -> Result<Trajectory> {
    let n1 = solution.n1;
    let n = solution.n_states();

    if initial.len() != n {
        return Err(RamseyError::dimensions(format!(
            "initial reduced state must have {} entries, got {}",
            n,
            initial.len()
        )));
    }
    if shocks.ncols() != n1 {
        return Err(RamseyError::dimensions(format!(
            "shocks must have {} columns (one per predetermined state), got {}",
            n1,
            shocks.ncols()
        )));
    }

    let periods = shocks.nrows();
    let mut reduced = Array2::zeros((periods, n));
    let mut determined = Array2::zeros((periods, solution.c.nrows()));

    let mut state = initial.clone();
    for t in 0..periods {
        if t > 0 {
            state = solution.m.dot(&state);
        }
        {
            let mut x1 = state.slice_mut(s![0..n1]);
            x1 += &shocks.row(t);
        }
        determined.row_mut(t).assign(&solution.c.dot(&state));
        reduced.row_mut(t).assign(&state);
    }

    Ok(Trajectory {
        reduced,
        determined,
        n1,
        n2: solution.n2,
        k: solution.k,
    })
}

/// Deterministic path from `initial` over `periods` periods.
pub fn impulse_response(
    solution: &CommitmentSolution,
    initial: &Array1<f64>,
    periods: usize,
) -> Result<Trajectory> {
    simulate(solution, initial, &Array2::zeros((periods, solution.n1)))
}

/// Discounted loss `Σ_t β^t (x'Qx + 2x'Uu + u'Ru)` along a trajectory.
pub fn discounted_loss(problem: &RamseyProblem, trajectory: &Trajectory) -> Result<f64> {
    if trajectory.n1 != problem.n1
        || trajectory.n2 != problem.n2
        || trajectory.k != problem.n_controls()
    {
        return Err(RamseyError::dimensions(format!(
            "trajectory has (n1, n2, k) = ({}, {}, {}), problem has ({}, {}, {})",
            trajectory.n1,
            trajectory.n2,
            trajectory.k,
            problem.n1,
            problem.n2,
            problem.n_controls()
        )));
    }

    let states = trajectory.states();
    let controls = trajectory.u();
    let mut discount = 1.0;
    let mut loss = 0.0;
    for (x, u) in states.outer_iter().zip(controls.outer_iter()) {
        let period = x.dot(&problem.q.dot(&x))
            + 2.0 * x.dot(&problem.u.dot(&u))
            + u.dot(&problem.r.dot(&u));
        loss += discount * period;
        discount *= problem.beta;
    }
    Ok(loss)
}
