//! Optimal monetary policy under commitment in the New Keynesian model
//!
//! States: cost-push shock e (predetermined) and inflation π (forward-looking).
//! Control: output gap y. Loss: π² + λ y².
//!
//!   e_{t+1} = ρ e_t
//!   π_t = β π_{t+1} + κ y_t + e_t

use ndarray::{arr1, arr2, Array2};
use ramsey_rs::commitment::{solve_commitment, SolverOptions};
use ramsey_rs::qz::LapackQz;
use ramsey_rs::simulation::simulate;
use ramsey_rs::RamseyProblem;

fn main() {
    println!("=== New Keynesian Commitment Demonstration ===\n");

    let (beta, kappa, lambda, rho) = (0.99, 0.1, 0.5, 0.5);
    println!(
        "beta = {}, kappa = {}, lambda = {}, rho = {}",
        beta, kappa, lambda, rho
    );

    let a = arr2(&[[rho, 0.0], [-1.0 / beta, 1.0 / beta]]);
    let b = arr2(&[[0.0], [-kappa / beta]]);
    let q = arr2(&[[0.0, 0.0], [0.0, 1.0]]);
    let r = arr2(&[[lambda]]);
    let u = arr2(&[[0.0], [0.0]]);

    let problem = match RamseyProblem::new(&a, &b, &q, &r, &u, beta, 1, 1) {
        Ok(p) => p,
        Err(e) => {
            println!("Invalid problem: {}", e);
            return;
        }
    };

    let sol = match solve_commitment(&problem, &SolverOptions::default(), &LapackQz) {
        Ok(sol) => sol,
        Err(e) => {
            println!("Solver failed: {}", e);
            return;
        }
    };

    println!("\nTransition M of [e; ρ_π]:");
    for i in 0..sol.m.nrows() {
        print!("  [");
        for j in 0..sol.m.ncols() {
            print!("{:10.6}", sol.m[(i, j)]);
        }
        println!(" ]");
    }

    println!("\nPolicy rows C (π, y, ρ_e):");
    for i in 0..sol.c.nrows() {
        print!("  [");
        for j in 0..sol.c.ncols() {
            print!("{:10.6}", sol.c[(i, j)]);
        }
        println!(" ]");
    }

    let slope = 1.0 + beta + kappa * kappa / lambda;
    let root = (slope - (slope * slope - 4.0 * beta).sqrt()) / (2.0 * beta);
    println!("\nCommitment root: {:.6} (M[1,1] = {:.6})", root, sol.m[(1, 1)]);

    let mut shocks = Array2::zeros((12, 1));
    shocks[(0, 0)] = 1.0;
    match simulate(&sol, &arr1(&[0.0, 0.0]), &shocks) {
        Ok(path) => {
            println!("\nResponse to a unit cost-push shock:");
            println!("  {:>3} {:>10} {:>10} {:>10}", "t", "e", "π", "y");
            for t in 0..path.periods() {
                println!(
                    "  {:>3} {:10.5} {:10.5} {:10.5}",
                    t,
                    path.x1()[(t, 0)],
                    path.x2()[(t, 0)],
                    path.u()[(t, 0)]
                );
            }
        }
        Err(e) => println!("Simulation failed: {}", e),
    }
}
