use std::time::Instant;

use log::{debug, trace};
use rand_distr::Exp;

use crate::compartments::{CompartmentedModel, ContextCompartmentsExt};
use crate::context::Context;
use crate::define_rng;
use crate::dynamics::{abort_run, finish_run, max_time, prepare_run, reach_equilibrium, Dynamics};
use crate::error::EpiError;
use crate::network::Network;
use crate::parameters::Parameters;
use crate::random::ContextRandomExt;
use crate::results::RunResult;

define_rng!(GillespieRng);

/// Continuous-time stochastic dynamics using Gillespie's algorithm.
///
/// Each per-element event `k` has total rate `r_k = p_k * |locus_k|`. With
/// `a = sum r_k`, the next event happens after an `Exp(a)` waiting time; its
/// kind is drawn with probability `r_k / a` and its element uniformly from the
/// kind's locus. Only one next-event plan is ever pending, so plans posted by
/// the model (such as monitor samples) interleave with events in time order.
///
/// The run ends at `maxTime`, or as soon as `a` drops to zero with no other
/// plan waiting. While plans are waiting an idle run resumes drawing events
/// from the moment one of them moves a node.
pub struct StochasticDynamics<M> {
    model: M,
    network: Network,
    parameters: Parameters,
    seed: u64,
}

impl<M: CompartmentedModel + 'static> StochasticDynamics<M> {
    pub fn new(model: M, network: Network) -> StochasticDynamics<M> {
        StochasticDynamics {
            model,
            network,
            parameters: Parameters::new(),
            seed: 0,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

/// Posts the next event, or declares equilibrium if nothing can happen.
fn schedule_next_event(context: &mut Context, max_time: f64) {
    let total: f64 = context.event_rates().iter().sum();
    if total <= 0.0 {
        reach_equilibrium(context, move |context| schedule_next_event(context, max_time));
        return;
    }

    let waiting = match Exp::new(total) {
        Ok(distribution) => context.sample_distr(GillespieRng, distribution),
        Err(error) => {
            abort_run(
                context,
                EpiError::ModelError(format!("Invalid total event rate {total}: {error}")),
            );
            return;
        }
    };
    let t = context.get_current_time() + waiting;
    // Past the bound the stop plan ends the run
    if t <= max_time {
        context.add_plan(t, move |context| fire_next_event(context, max_time));
    }
}

fn fire_next_event(context: &mut Context, max_time: f64) {
    let rates = context.event_rates();
    if rates.iter().sum::<f64>() > 0.0 {
        let event = context.sample_weighted(GillespieRng, &rates);
        let size = context.event_locus_size(event);
        let index = context.sample_range(GillespieRng, 0..size);
        trace!("event {event} at element {index} of {size}");
        if let Some(element) = context.event_element(event, index) {
            if let Err(error) = context.fire_event(event, element) {
                abort_run(context, error);
                return;
            }
        }
    }
    schedule_next_event(context, max_time);
}

impl<M: CompartmentedModel + 'static> Dynamics for StochasticDynamics<M> {
    fn set(&mut self, parameters: Parameters) {
        debug!("stochastic dynamics parameters: {parameters}");
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
        schedule_next_event(&mut context, max_time);
        context.execute();
        finish_run(context, &self.model, &self.parameters, self.seed, started)
    }
}
