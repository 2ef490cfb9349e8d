//! Drivers that run a compartmented model over a network.
//!
//! A dynamics owns a model, a network and a parameter set. Each call to
//! [`Dynamics::run`] builds a fresh `Context`, installs the network and the
//! model, runs the event loop, and returns a [`RunResult`]. Every run is
//! bounded by the `maxTime` parameter: a plan in the `Last` phase at
//! `maxTime` stops the loop.
//!
//! When no per-element event can fire the driver goes idle. An idle run stops
//! at once if nothing but the stop plan is left in the queue. Otherwise it
//! waits: fixed plans posted by the model keep running, and the first of them
//! that moves a node wakes the driver up again.
//!
//! Two drivers are provided:
//! * [`StochasticDynamics`]: continuous-time Gillespie simulation
//! * [`SynchronousDynamics`]: discrete unit time steps
mod stochastic;
mod synchronous;

use std::time::Instant;

use log::{error, info};

pub use stochastic::StochasticDynamics;
pub use synchronous::SynchronousDynamics;

use crate::compartments::{CompartmentedModel, ContextCompartmentsExt};
use crate::context::{Context, ExecutionPhase};
use crate::plan::PlanId;
use crate::define_data_plugin;
use crate::error::EpiError;
use crate::network::{ContextNetworkExt, Network};
use crate::parameters::{ContextParametersExt, Parameters};
use crate::random::ContextRandomExt;
use crate::results::{RunResult, StopReason};

/// Parameter bounding the simulation time of a run.
pub const MAX_TIME: &str = "maxTime";

/// `maxTime` used when the parameter is not set.
pub const DEFAULT_MAX_TIME: f64 = 20000.0;

pub trait Dynamics {
    /// Replaces the parameters used by subsequent runs.
    fn set(&mut self, parameters: Parameters);

    fn parameters(&self) -> &Parameters;

    /// Sets the base seed of subsequent runs. Runs with the same seed and
    /// parameters produce the same result.
    fn set_seed(&mut self, seed: u64);

    /// Runs the model once from its initial state.
    ///
    /// # Errors
    ///
    /// Invalid parameters or model definition, or any error raised by an
    /// event action during the run.
    fn run(&mut self) -> Result<RunResult, EpiError>;
}

#[derive(Default)]
struct RunState {
    error: Option<EpiError>,
    idle: bool,
    stop_plan: Option<PlanId>,
}

define_data_plugin!(RunStatePlugin, RunState, RunState::default());

/// Stops the run and keeps `error` to be returned from `run`.
pub(crate) fn abort_run(context: &mut Context, error: EpiError) {
    error!(
        "stopping run at t={}: {error}",
        context.get_current_time()
    );
    let state = context.get_data_mut(RunStatePlugin);
    if state.error.is_none() {
        state.error = Some(error);
    }
    context.shutdown();
}

/// Records that no per-element event can fire. The run stops unless plans
/// other than the stop plan are still waiting; in that case `restart` runs
/// after the next node changes compartment.
pub(crate) fn reach_equilibrium(
    context: &mut Context,
    restart: impl FnOnce(&mut Context) + 'static,
) {
    let t = context.get_current_time();
    let state = context.get_data_mut(RunStatePlugin);
    if !state.idle {
        info!("equilibrium reached at t={t}");
        state.idle = true;
    }
    let stop_plan = state.stop_plan;

    let stop_pending = stop_plan.is_some_and(|id| context.is_plan_pending(&id));
    if context.remaining_plan_count() > usize::from(stop_pending) {
        context.on_next_transition(move |context| {
            info!("leaving equilibrium at t={}", context.get_current_time());
            context.get_data_mut(RunStatePlugin).idle = false;
            restart(context);
        });
    } else {
        context.shutdown();
    }
}

/// Reads and checks `maxTime`.
pub(crate) fn max_time(parameters: &Parameters) -> Result<f64, EpiError> {
    if parameters.contains(MAX_TIME) {
        parameters.positive(MAX_TIME)
    } else {
        Ok(DEFAULT_MAX_TIME)
    }
}

/// Builds the context of one run: random streams, parameters, network,
/// installed model and the stop plan at `max_time`.
pub(crate) fn prepare_run(
    model: &dyn CompartmentedModel,
    network: &Network,
    parameters: &Parameters,
    seed: u64,
    max_time: f64,
) -> Result<Context, EpiError> {
    let mut context = Context::new();
    context.init_random(seed);
    context.set_parameters(parameters.clone());
    context.set_network(network.clone());
    context.install_model(model)?;
    let stop_plan = context.add_plan_with_phase(max_time, Context::shutdown, ExecutionPhase::Last);
    context.get_data_mut(RunStatePlugin).stop_plan = Some(stop_plan);
    info!(
        "running {} on {} nodes and {} edges (seed {seed}, maxTime {max_time})",
        model.name(),
        network.order(),
        network.size()
    );
    Ok(context)
}

/// Collects the result of a finished run, or returns the error that stopped it.
pub(crate) fn finish_run(
    mut context: Context,
    model: &dyn CompartmentedModel,
    parameters: &Parameters,
    seed: u64,
    started: Instant,
) -> Result<RunResult, EpiError> {
    let state = std::mem::take(context.get_data_mut(RunStatePlugin));
    if let Some(error) = state.error {
        return Err(error);
    }

    let events_by_name = context.events_fired();
    let mut result = RunResult {
        model: model.name().to_string(),
        seed,
        parameters: parameters.clone(),
        final_time: context.get_current_time(),
        events: events_by_name.values().sum(),
        events_by_name,
        counts: context.compartment_counts(),
        stop_reason: if state.idle {
            StopReason::Equilibrium
        } else {
            StopReason::TimeLimit
        },
        timeseries: None,
    };
    model.results(&context, &mut result);

    info!(
        "run stopped by {} at t={} after {} events in {}",
        result.stop_reason,
        result.final_time,
        result.events,
        humantime::format_duration(started.elapsed())
    );
    Ok(result)
}
