//! SIR over a 10000-node Erdős–Rényi network with mean degree 5, run with
//! Gillespie dynamics until the epidemic dies out.
use epinet::prelude::*;
use epinet::rand::rngs::SmallRng;
use epinet::rand::SeedableRng;
use epinet::sir::{P_INFECT, P_INFECTED, P_REMOVE};

const N: usize = 10_000;
const KMEAN: f64 = 5.0;

#[allow(clippy::cast_precision_loss)]
fn main() -> anyhow::Result<()> {
    let parameters = Parameters::new()
        .with(P_INFECT, 0.1)
        .with(P_REMOVE, 0.5)
        .with(P_INFECTED, 0.01);

    let phi = KMEAN / N as f64;
    let mut rng = SmallRng::seed_from_u64(0);
    let network = Network::erdos_renyi(N, phi, &mut rng)?;

    let mut dynamics = StochasticDynamics::new(SIR, network);
    dynamics.set(parameters);
    let result = dynamics.run()?;

    println!(
        "stopped by {} at t={:.3} after {} events",
        result.stop_reason, result.final_time, result.events
    );
    for (compartment, count) in &result.counts {
        println!("{compartment}: {count}");
    }
    Ok(())
}
