use std::time::Instant;

use log::{debug, trace};

use crate::compartments::{CompartmentedModel, ContextCompartmentsExt, Element};
use crate::context::{Context, ExecutionPhase};
use crate::define_rng;
use crate::dynamics::{abort_run, finish_run, max_time, prepare_run, reach_equilibrium, Dynamics};
use crate::error::EpiError;
use crate::network::Network;
use crate::parameters::Parameters;
use crate::random::ContextRandomExt;
use crate::results::RunResult;

define_rng!(SynchronousRng);

/// Discrete-time dynamics with unit time steps.
///
/// At every step each event's locus is snapshotted, then every element of
/// the snapshot fires the event with the event's probability, provided an
/// earlier firing in the same step has not already removed it from the locus.
/// Steps run in the `First` phase so that samples taken at the same instant
/// see the state after the step. After an idle spell, steps resume one time
/// unit after the move that woke the run.
pub struct SynchronousDynamics<M> {
    model: M,
    network: Network,
    parameters: Parameters,
    seed: u64,
}

impl<M: CompartmentedModel + 'static> SynchronousDynamics<M> {
    pub fn new(model: M, network: Network) -> SynchronousDynamics<M> {
        SynchronousDynamics {
            model,
            network,
            parameters: Parameters::new(),
            seed: 0,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
}

fn schedule_step(context: &mut Context, max_time: f64) {
    let total: f64 = context.event_rates().iter().sum();
    if total <= 0.0 {
        reach_equilibrium(context, move |context| schedule_step(context, max_time));
        return;
    }
    let t = context.get_current_time() + 1.0;
    if t <= max_time {
        context.add_plan_with_phase(
            t,
            move |context| {
                if let Err(error) = step(context) {
                    abort_run(context, error);
                    return;
                }
                schedule_step(context, max_time);
            },
            ExecutionPhase::First,
        );
    }
}

fn step(context: &mut Context) -> Result<(), EpiError> {
    let snapshots: Vec<(f64, Vec<Element>)> = (0..context.event_names().len())
        .map(|event| {
            (
                context.event_probability(event).unwrap_or(0.0),
                context.event_elements(event),
            )
        })
        .collect();

    let mut fired = 0;
    for (event, (probability, elements)) in snapshots.into_iter().enumerate() {
        for element in elements {
            if context.sample_bool(SynchronousRng, probability)
                && context.event_locus_contains(event, element)
            {
                context.fire_event(event, element)?;
                fired += 1;
            }
        }
    }
    trace!("step at t={} fired {fired} events", context.get_current_time());
    Ok(())
}

impl<M: CompartmentedModel + 'static> Dynamics for SynchronousDynamics<M> {
    fn set(&mut self, parameters: Parameters) {
        debug!("synchronous dynamics parameters: {parameters}");
        self.parameters = parameters;
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    fn run(&mut self) -> Result<RunResult, EpiError> {
        let started = Instant::now();
        let max_time = max_time(&self.parameters)?;
        let mut context = prepare_run(
            &self.model,
            &self.network,
            &self.parameters,
            self.seed,
            max_time,
        )?;
        schedule_step(&mut context, max_time);
        context.execute();
        finish_run(context, &self.model, &self.parameters, self.seed, started)
    }
}
