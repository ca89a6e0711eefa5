//! Demonstration of the commitment solver on a scalar regulator
//!
//! Minimizes Σ β^t (x_t² + u_t²) subject to x_{t+1} = a x_t + u_t and
//! compares the QZ solution with the closed-form Riccati fixed point.

use ndarray::{arr1, arr2};
use ramsey_rs::commitment::commitment_solution;
use ramsey_rs::qz::GeneralizedEigenvalue;
use ramsey_rs::simulation::{discounted_loss, impulse_response};
use ramsey_rs::RamseyProblem;

fn main() {
    println!("=== Scalar Commitment Demonstration ===\n");

    let (a, beta) = (0.9, 0.95);
    let am = arr2(&[[a]]);
    let bm = arr2(&[[1.0]]);
    let q = arr2(&[[1.0]]);
    let r = arr2(&[[1.0]]);
    let u = arr2(&[[0.0]]);

    println!("a = {}, beta = {}", a, beta);

    let sol = match commitment_solution(&am, &bm, &q, &r, &u, beta, 1, 0, 1.000001) {
        Ok(sol) => sol,
        Err(e) => {
            println!("Solver failed: {}", e);
            return;
        }
    };

    println!("\nGeneralized eigenvalues (stable first):");
    for (eig, stable) in sol
        .diagnostics
        .eigenvalues
        .iter()
        .zip(&sol.diagnostics.stable)
    {
        match eig {
            GeneralizedEigenvalue::Finite(mu) => {
                println!("  μ = {:10.6} {:+.6}i  stable: {}", mu.re, mu.im, stable)
            }
            GeneralizedEigenvalue::Infinite => println!("  μ = ∞  stable: {}", stable),
        }
    }

    println!("\n=== Solution ===");
    println!("M = {:.6}", sol.m[(0, 0)]);
    println!("u = {:.6} x", sol.u_rows()[(0, 0)]);
    println!("p1 = {:.6} x", sol.p1_rows()[(0, 0)]);

    // Riccati fixed point: β P² + (1 − β − β a²) P − 1 = 0
    let lin = 1.0 - beta - beta * a * a;
    let p = (-lin + (lin * lin + 4.0 * beta).sqrt()) / (2.0 * beta);
    println!("\nClosed form:");
    println!("M = {:.6}", a / (1.0 + beta * p));
    println!("u = {:.6} x", -beta * p * a / (1.0 + beta * p));
    println!("p1 = {:.6} x", beta * p);

    println!("\nDiagnostics:");
    println!(
        "  Transform condition number: {:.3e}",
        sol.diagnostics.transform_condition
    );
    println!(
        "  Imaginary residue: {:.3e}",
        sol.diagnostics.imaginary_residue
    );

    let problem = match RamseyProblem::new(&am, &bm, &q, &r, &u, beta, 1, 0) {
        Ok(p) => p,
        Err(e) => {
            println!("Invalid problem: {}", e);
            return;
        }
    };
    match impulse_response(&sol, &arr1(&[1.0]), 300).and_then(|path| discounted_loss(&problem, &path)) {
        Ok(loss) => {
            println!("\nDiscounted loss from x0 = 1: {:.6}", loss);
            println!("Value function P:            {:.6}", p);
        }
        Err(e) => println!("Simulation failed: {}", e),
    }
}
