//! Integration tests for simulating commitment solutions

use approx::assert_abs_diff_eq;
use ndarray::{arr1, arr2, Array2};
use ramsey_rs::commitment::{solve_commitment, SolverOptions};
use ramsey_rs::qz::LapackQz;
use ramsey_rs::simulation::{discounted_loss, impulse_response, simulate};
use ramsey_rs::RamseyProblem;

fn regulator(a: f64, beta: f64) -> RamseyProblem {
    RamseyProblem::new(
        &arr2(&[[a]]),
        &arr2(&[[1.0]]),
        &arr2(&[[1.0]]),
        &arr2(&[[1.0]]),
        &arr2(&[[0.0]]),
        beta,
        1,
        0,
    )
    .unwrap()
}

#[test]
fn test_loss_equals_value_function() {
    // Optimal loss from x(0) = x0 is P x0² with P the Riccati solution
    let (a, beta) = (0.5, 0.95);
    let problem = regulator(a, beta);
    let sol = solve_commitment(&problem, &SolverOptions::default(), &LapackQz).unwrap();

    let lin = 1.0 - beta - beta * a * a;
    let p = (-lin + (lin * lin + 4.0 * beta).sqrt()) / (2.0 * beta);

    let x0 = 2.0;
    let path = impulse_response(&sol, &arr1(&[x0]), 200).unwrap();
    let loss = discounted_loss(&problem, &path).unwrap();
    assert_abs_diff_eq!(loss, p * x0 * x0, epsilon = 1e-9);
}

#[test]
fn test_optimal_policy_beats_perturbed_policy() {
    let problem = regulator(0.9, 0.95);
    let sol = solve_commitment(&problem, &SolverOptions::default(), &LapackQz).unwrap();
    let optimal = discounted_loss(&problem, &impulse_response(&sol, &arr1(&[1.0]), 300).unwrap())
        .unwrap();

    // Same structure, feedback coefficient nudged by 5%
    let mut perturbed = sol.clone();
    let f = sol.u_rows()[(0, 0)] * 1.05;
    perturbed.c[(0, 0)] = f;
    perturbed.m[(0, 0)] = 0.9 + f;
    let worse = discounted_loss(
        &problem,
        &impulse_response(&perturbed, &arr1(&[1.0]), 300).unwrap(),
    )
    .unwrap();

    assert!(worse > optimal);
}

#[test]
fn test_new_keynesian_shock_response() {
    let beta = 0.99;
    let problem = RamseyProblem::new(
        &arr2(&[[0.5, 0.0], [-1.0 / beta, 1.0 / beta]]),
        &arr2(&[[0.0], [-0.1 / beta]]),
        &arr2(&[[0.0, 0.0], [0.0, 1.0]]),
        &arr2(&[[0.5]]),
        &arr2(&[[0.0], [0.0]]),
        beta,
        1,
        1,
    )
    .unwrap();
    let sol = solve_commitment(&problem, &SolverOptions::default(), &LapackQz).unwrap();

    let mut shocks = Array2::zeros((40, 1));
    shocks[(0, 0)] = 1.0;
    let path = simulate(&sol, &arr1(&[0.0, 0.0]), &shocks).unwrap();

    // cost-push shock decays geometrically
    for t in 0..10 {
        assert_abs_diff_eq!(path.x1()[(t, 0)], 0.5f64.powi(t as i32), epsilon = 1e-9);
    }
    // inflation jumps up, output gap falls, and both die out
    assert!(path.x2()[(0, 0)] > 0.0);
    assert!(path.u()[(0, 0)] < 0.0);
    assert!(path.x2()[(39, 0)].abs() < 1e-2);
    assert!(path.u()[(39, 0)].abs() < 1e-2);
    assert_eq!(path.p1().ncols(), 1);
    assert_eq!(path.states().dim(), (40, 2));
}
