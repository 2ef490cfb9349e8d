//! Stochastic compartmented epidemic models on networks
//!
//! Epinet runs compartmented models, such as SIR, over a contact network.
//! A model is declared rather than coded: it names its compartments and the
//! fraction of nodes starting in each, the *loci* it wants tracked (nodes in
//! a compartment, or edges between two compartments), and the per-element
//! events that occur at those loci with a given probability. A dynamics
//! driver then decides when events happen and runs their actions.
//!
//! The central object of a run is a `Context` that provides:
//! * a notion of simulation time
//! * a queue of plans executed in time order, with phases ordering plans
//!   scheduled at the same instant
//! * typed data plugins holding the state of each module
//! * named, independently seeded random number streams
//!
//! A typical run:
//! * generate a network with `Network::erdos_renyi`
//! * wrap the model in a `Monitor` if a time series is wanted
//! * build a `StochasticDynamics` around the model and the network
//! * set the parameters and call `run`, which returns a `RunResult`
pub mod compartments;
pub mod context;
pub mod dynamics;
pub mod error;
pub mod log;
pub mod monitor;
pub mod network;
pub mod parameters;
pub mod plan;
pub mod prelude;
pub mod random;
pub mod report;
pub mod results;
pub mod runner;
pub mod sir;

mod hashing;

pub use compartments::{
    Compartment, CompartmentedModel, ContextCompartmentsExt, Element, ModelBuilder,
};
pub use context::{Context, ExecutionPhase};
pub use dynamics::{Dynamics, StochasticDynamics, SynchronousDynamics};
pub use error::EpiError;
pub use hashing::{hash_str, HashMap, HashMapExt};
pub use crate::log::{debug, error, info, trace, warn};
pub use monitor::{ContextMonitorExt, Monitor};
pub use network::{ContextNetworkExt, Edge, Network, NodeId};
pub use parameters::{ContextParametersExt, Parameters};
pub use random::{ContextRandomExt, RngId};
pub use results::{RunResult, Sample, StopReason};
pub use sir::SIR;

// Re-exports for use by `define_rng!` in downstream crates
pub use rand;
