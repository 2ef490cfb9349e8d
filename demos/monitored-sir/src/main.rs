//! The hello-world SIR run with a monitor sampling compartment sizes every
//! time unit. The time series is written to `timeseries.csv` in the output
//! directory given as the first argument, or the current directory.
use std::path::PathBuf;

use epinet::prelude::*;
use epinet::report::{write_timeseries_csv, TIMESERIES_FILE};
use epinet::sir::{INFECTED, P_INFECT, P_INFECTED, P_REMOVE, REMOVED, SUSCEPTIBLE};

fn main() -> anyhow::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("."), PathBuf::from);

    let parameters = Parameters::new()
        .with(P_INFECT, 0.1)
        .with(P_REMOVE, 0.5)
        .with(P_INFECTED, 0.01)
        .with(MONITORING_INTERVAL, 1.0)
        .with("maxTime", 100.0);

    let mut context = Context::new();
    context.init_random(0);
    let network = context.sample(NetworkRng, |rng| {
        Network::erdos_renyi(10_000, 5.0 / 10_000.0, rng)
    })?;

    let mut dynamics = StochasticDynamics::new(Monitor::new(SIR), network);
    dynamics.set(parameters);
    let result = dynamics.run()?;

    let timeseries = result.timeseries.unwrap_or_default();
    for sample in timeseries.iter().step_by(10) {
        println!(
            "t={:>5.1}  S={:>5}  I={:>5}  R={:>5}",
            sample.t,
            sample.count(SUSCEPTIBLE),
            sample.count(INFECTED),
            sample.count(REMOVED)
        );
    }

    let path = output_dir.join(TIMESERIES_FILE);
    write_timeseries_csv(&path, &timeseries)?;
    println!("{} samples written to {}", timeseries.len(), path.display());
    Ok(())
}

define_rng!(NetworkRng);
