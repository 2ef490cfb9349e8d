//! Periodic sampling of compartment sizes.
//!
//! `Monitor` wraps a compartmented model without changing its dynamics. When
//! installed it posts a repeating plan, every `monitoringInterval` time units
//! from the start of the run, that records the current size of every
//! compartment. The samples are attached to the run result as its time series.
//!
//! The sampling plan runs in the `Normal` phase while the run's stop plan runs
//! in `Last`, so a sample falling exactly on `maxTime` is still taken.
use log::trace;

use crate::compartments::{CompartmentedModel, ContextCompartmentsExt, ModelBuilder};
use crate::context::{Context, ExecutionPhase};
use crate::define_data_plugin;
use crate::error::EpiError;
use crate::parameters::Parameters;
use crate::results::{RunResult, Sample};

/// Parameter holding the sampling interval.
pub const MONITORING_INTERVAL: &str = "monitoringInterval";

define_data_plugin!(MonitorPlugin, Vec<Sample>, Vec::new());

pub struct Monitor<M> {
    model: M,
    name: String,
}

impl<M: CompartmentedModel> Monitor<M> {
    pub fn new(model: M) -> Monitor<M> {
        let name = format!("Monitor({})", model.name());
        Monitor { model, name }
    }
}

fn record_sample(context: &mut Context) {
    let sample = Sample {
        t: context.get_current_time(),
        counts: context.compartment_counts(),
    };
    trace!("sample at {}: {:?}", sample.t, sample.counts);
    context.get_data_mut(MonitorPlugin).push(sample);
}

pub trait ContextMonitorExt {
    /// Samples recorded so far in this run, in time order.
    fn get_timeseries(&self) -> Vec<Sample>;
}

impl ContextMonitorExt for Context {
    fn get_timeseries(&self) -> Vec<Sample> {
        self.get_data(MonitorPlugin).cloned().unwrap_or_default()
    }
}

impl<M: CompartmentedModel> CompartmentedModel for Monitor<M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self, builder: &mut ModelBuilder, parameters: &Parameters) -> Result<(), EpiError> {
        parameters.positive(MONITORING_INTERVAL)?;
        self.model.build(builder, parameters)
    }

    fn setup(&self, context: &mut Context, parameters: &Parameters) -> Result<(), EpiError> {
        self.model.setup(context, parameters)?;
        let interval = parameters.positive(MONITORING_INTERVAL)?;
        context.get_data_mut(MonitorPlugin).clear();
        context.add_periodic_plan_with_phase(interval, record_sample, ExecutionPhase::Normal);
        Ok(())
    }

    fn results(&self, context: &Context, result: &mut RunResult) {
        self.model.results(context, result);
        result.timeseries = Some(context.get_timeseries());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{ContextNetworkExt, Network};
    use crate::parameters::ContextParametersExt;
    use crate::random::ContextRandomExt;

    struct Static;

    impl CompartmentedModel for Static {
        fn name(&self) -> &str {
            "static"
        }

        fn build(
            &self,
            builder: &mut ModelBuilder,
            _parameters: &Parameters,
        ) -> Result<(), EpiError> {
            builder.add_compartment("A", 1.0);
            Ok(())
        }
    }

    fn context_with(parameters: Parameters) -> Context {
        let mut context = Context::new();
        context.init_random(0);
        context.set_network(Network::with_nodes(10));
        context.set_parameters(parameters);
        context
    }

    #[test]
    fn samples_until_last_plan() {
        let mut context = context_with(Parameters::new().with(MONITORING_INTERVAL, 2.0));
        let monitor = Monitor::new(Static);
        assert_eq!(monitor.name(), "Monitor(static)");
        context.install_model(&monitor).unwrap();
        context.add_plan_with_phase(7.0, Context::shutdown, ExecutionPhase::Last);
        context.execute();

        let samples = context.get_timeseries();
        let times: Vec<f64> = samples.iter().map(|sample| sample.t).collect();
        assert_eq!(times, vec![0.0, 2.0, 4.0, 6.0]);
        assert!(samples.iter().all(|sample| sample.count("A") == 10));

        let mut result = RunResult {
            model: monitor.name().to_string(),
            seed: 0,
            parameters: Parameters::new(),
            final_time: 7.0,
            events: 0,
            events_by_name: indexmap::IndexMap::new(),
            counts: context.compartment_counts(),
            stop_reason: crate::results::StopReason::TimeLimit,
            timeseries: None,
        };
        monitor.results(&context, &mut result);
        assert_eq!(result.timeseries.unwrap().len(), 4);
    }

    #[test]
    fn sample_on_stop_time_is_kept() {
        let mut context = context_with(Parameters::new().with(MONITORING_INTERVAL, 1.0));
        context.install_model(&Monitor::new(Static)).unwrap();
        context.add_plan_with_phase(3.0, Context::shutdown, ExecutionPhase::Last);
        context.execute();
        assert_eq!(context.get_timeseries().len(), 4);
    }

    #[test]
    fn interval_is_required() {
        let mut context = context_with(Parameters::new());
        let err = context.install_model(&Monitor::new(Static)).unwrap_err();
        assert!(matches!(err, EpiError::ParameterError(ref m) if m.contains(MONITORING_INTERVAL)));

        let mut context = context_with(Parameters::new().with(MONITORING_INTERVAL, 0.0));
        assert!(context.install_model(&Monitor::new(Static)).is_err());
    }
}
