use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use log::info;

use crate::context::Context;
use crate::define_rng;
use crate::dynamics::{Dynamics, StochasticDynamics, SynchronousDynamics};
use crate::error::EpiError;
use crate::monitor::{Monitor, MONITORING_INTERVAL};
use crate::network::Network;
use crate::parameters::Parameters;
use crate::random::ContextRandomExt;
use crate::report::write_run_outputs;
use crate::results::RunResult;
use crate::sir::{P_INFECT, P_INFECTED, P_REMOVE, SIR};

pub const DEFAULT_NODES: usize = 10_000;
pub const DEFAULT_MEAN_DEGREE: f64 = 5.0;
pub const DEFAULT_MONITORING_INTERVAL: f64 = 10.0;

define_rng!(NetworkRng);

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DynamicsKind {
    /// Continuous-time Gillespie simulation
    Stochastic,
    /// Discrete unit time steps
    Synchronous,
}

/// Default cli arguments for the epinet runner
#[derive(Args, Debug, Clone)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path to a JSON file of parameters
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional directory for results.json and timeseries.csv
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Enable logging at a level (`info`) or per module (`epinet::dynamics=trace`)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Number of nodes of the generated network
    #[arg(short, long, default_value_t = DEFAULT_NODES)]
    pub nodes: usize,

    /// Mean degree of the generated network
    #[arg(short = 'k', long, default_value_t = DEFAULT_MEAN_DEGREE)]
    pub mean_degree: f64,

    /// Load the network from a `v1,v2` CSV edge list instead of generating one
    #[arg(short, long)]
    pub edge_list: Option<PathBuf>,

    /// Dynamics used to run the model
    #[arg(short, long, value_enum, default_value_t = DynamicsKind::Stochastic)]
    pub dynamics: DynamicsKind,

    /// Do not sample compartment sizes during the run
    #[arg(long)]
    pub no_monitor: bool,

    /// Override a parameter, e.g. `--param pInfect=0.2`. May be repeated.
    #[arg(short, long = "param", value_parser = parse_parameter)]
    pub params: Vec<(String, f64)>,
}

impl Default for BaseArgs {
    fn default() -> Self {
        BaseArgs {
            random_seed: 0,
            config: None,
            output_dir: None,
            log_level: None,
            nodes: DEFAULT_NODES,
            mean_degree: DEFAULT_MEAN_DEGREE,
            edge_list: None,
            dynamics: DynamicsKind::Stochastic,
            no_monitor: false,
            params: Vec::new(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "epinet", version)]
#[command(about = "Run an SIR epidemic over a random network")]
pub struct Cli {
    #[command(flatten)]
    pub args: BaseArgs,
}

fn parse_parameter(text: &str) -> Result<(String, f64), String> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{text}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if !value.is_finite() {
        return Err(format!("'{}' must be finite, got {value}", key.trim()));
    }
    Ok((key.trim().to_string(), value))
}

/// The parameters of the hello-world run: 1% of nodes initially infected,
/// infection rate 0.1 per SI edge and removal rate 0.5.
#[must_use]
pub fn default_parameters() -> Parameters {
    Parameters::new()
        .with(P_INFECT, 0.1)
        .with(P_REMOVE, 0.5)
        .with(P_INFECTED, 0.01)
        .with(MONITORING_INTERVAL, DEFAULT_MONITORING_INTERVAL)
}

/// Defaults, overridden by the config file, overridden by `--param` values.
///
/// # Errors
///
/// Any error reading the config file.
pub fn parameters_from_args(args: &BaseArgs) -> Result<Parameters, EpiError> {
    let mut parameters = default_parameters();
    if let Some(config) = &args.config {
        info!("loading parameters from {}", config.display());
        parameters.merge(&Parameters::from_json_file(config)?);
    }
    for (key, value) in &args.params {
        parameters.set(key, *value);
    }
    Ok(parameters)
}

/// Loads the edge list if one was given, otherwise generates G(n, k/n) from
/// its own random stream.
///
/// # Errors
///
/// `EpiError::NetworkError` for an empty network or a mean degree that does
/// not give a valid edge probability, or any error loading the edge list.
#[allow(clippy::cast_precision_loss)]
pub fn build_network(args: &BaseArgs) -> Result<Network, EpiError> {
    if let Some(path) = &args.edge_list {
        return Network::from_edge_list_csv(path, None);
    }
    if args.nodes == 0 {
        return Err(EpiError::NetworkError(
            "The network needs at least one node".to_string(),
        ));
    }
    let phi = args.mean_degree / args.nodes as f64;
    let mut context = Context::new();
    context.init_random(args.random_seed);
    context.sample(NetworkRng, |rng| Network::erdos_renyi(args.nodes, phi, rng))
}

fn make_dynamics(args: &BaseArgs, network: Network) -> Box<dyn Dynamics> {
    match (args.dynamics, args.no_monitor) {
        (DynamicsKind::Stochastic, false) => {
            Box::new(StochasticDynamics::new(Monitor::new(SIR), network))
        }
        (DynamicsKind::Stochastic, true) => Box::new(StochasticDynamics::new(SIR, network)),
        (DynamicsKind::Synchronous, false) => {
            Box::new(SynchronousDynamics::new(Monitor::new(SIR), network))
        }
        (DynamicsKind::Synchronous, true) => Box::new(SynchronousDynamics::new(SIR, network)),
    }
}

/// Runs one SIR simulation as configured by `args`, writing the outputs if an
/// output directory was given.
///
/// # Errors
///
/// Invalid log specification, parameters or network, errors during the run,
/// or errors writing the outputs.
pub fn run_simulation(args: &BaseArgs) -> Result<RunResult, EpiError> {
    if let Some(spec) = &args.log_level {
        crate::log::apply_log_spec(spec)?;
    }

    let parameters = parameters_from_args(args)?;
    let network = build_network(args)?;
    let mut dynamics = make_dynamics(args, network);
    dynamics.set(parameters);
    dynamics.set_seed(args.random_seed);
    let result = dynamics.run()?;

    if let Some(output_dir) = &args.output_dir {
        write_run_outputs(output_dir, &result)?;
    }
    Ok(result)
}

/// Parses the command line and runs the simulation it describes.
///
/// # Errors
/// Returns an error if argument parsing or the run fails
pub fn run_with_args() -> Result<RunResult, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    Ok(run_simulation(&cli.args)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::StopReason;
    use clap::CommandFactory;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn small_args() -> BaseArgs {
        BaseArgs {
            nodes: 300,
            ..BaseArgs::default()
        }
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "epinet",
            "--random-seed",
            "7",
            "--nodes",
            "100",
            "--mean-degree",
            "3",
            "--dynamics",
            "synchronous",
            "--no-monitor",
            "--param",
            "pInfect=0.3",
        ])
        .unwrap();
        assert_eq!(cli.args.random_seed, 7);
        assert_eq!(cli.args.nodes, 100);
        assert_eq!(cli.args.dynamics, DynamicsKind::Synchronous);
        assert!(cli.args.no_monitor);
        assert_eq!(cli.args.params, vec![("pInfect".to_string(), 0.3)]);
    }

    #[test]
    fn rejects_malformed_parameter() {
        assert!(parse_parameter("pInfect").is_err());
        assert!(parse_parameter("pInfect=high").is_err());
        assert!(parse_parameter("foo=NaN").is_err());
        assert!(parse_parameter("foo=inf").is_err());
        assert!(Cli::try_parse_from(["epinet", "--param", "foo=-inf"]).is_err());
        assert_eq!(
            parse_parameter(" pRemove = 0.25 ").unwrap(),
            ("pRemove".to_string(), 0.25)
        );
    }

    #[test]
    fn parameter_precedence() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"pInfect": 0.2, "pRemove": 0.4}}"#).unwrap();
        let args = BaseArgs {
            config: Some(file.path().to_path_buf()),
            params: vec![("pRemove".to_string(), 0.3)],
            ..BaseArgs::default()
        };
        let parameters = parameters_from_args(&args).unwrap();
        assert!((parameters.get(P_INFECT).unwrap() - 0.2).abs() < f64::EPSILON);
        assert!((parameters.get(P_REMOVE).unwrap() - 0.3).abs() < f64::EPSILON);
        assert!((parameters.get(P_INFECTED).unwrap() - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn network_depends_on_seed() {
        let args = small_args();
        assert_eq!(build_network(&args).unwrap(), build_network(&args).unwrap());
        let other = BaseArgs {
            random_seed: 1,
            ..small_args()
        };
        assert_ne!(build_network(&args).unwrap(), build_network(&other).unwrap());

        let empty = BaseArgs {
            nodes: 0,
            ..BaseArgs::default()
        };
        assert!(build_network(&empty).is_err());
    }

    #[test]
    fn edge_list_replaces_generated_network() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "v1,v2\n0,1\n1,2\n3,2").unwrap();
        let args = BaseArgs {
            edge_list: Some(file.path().to_path_buf()),
            no_monitor: true,
            ..small_args()
        };
        let network = build_network(&args).unwrap();
        assert_eq!(network.order(), 4);
        assert_eq!(network.size(), 3);

        let result = run_simulation(&args).unwrap();
        assert_eq!(result.counts.values().sum::<usize>(), 4);
    }

    #[test]
    fn monitored_run_writes_outputs() {
        let temp_dir = tempdir().unwrap();
        let args = BaseArgs {
            output_dir: Some(temp_dir.path().to_path_buf()),
            params: vec![("maxTime".to_string(), 50.0)],
            ..small_args()
        };
        let result = run_simulation(&args).unwrap();
        assert_eq!(result.timeseries.as_ref().unwrap().len(), 6);
        assert!(temp_dir.path().join("results.json").exists());
        assert!(temp_dir.path().join("timeseries.csv").exists());
    }

    #[test]
    fn unmonitored_synchronous_run() {
        let args = BaseArgs {
            dynamics: DynamicsKind::Synchronous,
            no_monitor: true,
            ..small_args()
        };
        let result = run_simulation(&args).unwrap();
        assert!(result.timeseries.is_none());
        assert_eq!(result.stop_reason, StopReason::Equilibrium);
        assert_eq!(result.counts.values().sum::<usize>(), 300);
    }
}
