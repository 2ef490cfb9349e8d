pub use crate::compartments::{
    Compartment, CompartmentedModel, ContextCompartmentsExt, Element, ModelBuilder,
};
pub use crate::context::{Context, ExecutionPhase};
pub use crate::dynamics::{Dynamics, StochasticDynamics, SynchronousDynamics};
pub use crate::error::EpiError;
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::monitor::{ContextMonitorExt, Monitor, MONITORING_INTERVAL};
pub use crate::network::{ContextNetworkExt, Edge, Network, NodeId};
pub use crate::parameters::{ContextParametersExt, Parameters};
pub use crate::random::ContextRandomExt;
pub use crate::results::{RunResult, Sample, StopReason};
pub use crate::sir::SIR;
pub use crate::{define_data_plugin, define_rng};
