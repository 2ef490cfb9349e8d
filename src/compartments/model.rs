use approx::abs_diff_eq;
use log::trace;

use crate::compartments::locus::{Locus, LocusKind};
use crate::compartments::{Compartment, CompartmentId, Element};
use crate::context::Context;
use crate::error::EpiError;
use crate::parameters::Parameters;
use crate::results::RunResult;

/// The action run when a per-element event fires: it receives the context, the
/// simulation time and the element the event was drawn at.
pub type EventAction = fn(&mut Context, f64, Element) -> Result<(), EpiError>;

/// Tolerance on the sum of the initial compartment fractions.
pub const FRACTION_TOLERANCE: f64 = 1e-9;

/// A compartmented epidemic model: a set of compartments nodes can occupy,
/// loci tracking nodes or edges by compartment, and stochastic events that
/// occur at the elements of a locus.
///
/// A model only declares its structure. The dynamics decides when events
/// occur and calls their actions.
pub trait CompartmentedModel {
    /// Name used in log messages and run results
    fn name(&self) -> &str;

    /// Declares compartments, loci and events, reading any parameters needed.
    ///
    /// # Errors
    ///
    /// Missing or invalid parameters.
    fn build(&self, builder: &mut ModelBuilder, parameters: &Parameters) -> Result<(), EpiError>;

    /// Called once after the model has been installed and nodes have been
    /// assigned their initial compartments. Use it to post fixed or
    /// repeating events.
    ///
    /// # Errors
    ///
    /// Missing or invalid parameters.
    fn setup(&self, _context: &mut Context, _parameters: &Parameters) -> Result<(), EpiError> {
        Ok(())
    }

    /// Adds model-specific data to the result of a finished run.
    fn results(&self, _context: &Context, _result: &mut RunResult) {}
}

impl<M: CompartmentedModel + ?Sized> CompartmentedModel for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn build(&self, builder: &mut ModelBuilder, parameters: &Parameters) -> Result<(), EpiError> {
        (**self).build(builder, parameters)
    }

    fn setup(&self, context: &mut Context, parameters: &Parameters) -> Result<(), EpiError> {
        (**self).setup(context, parameters)
    }

    fn results(&self, context: &Context, result: &mut RunResult) {
        (**self).results(context, result);
    }
}

#[derive(Clone, Debug)]
struct LocusDefinition {
    name: String,
    from: Compartment,
    to: Option<Compartment>,
}

#[derive(Clone)]
struct EventDefinition {
    locus: String,
    probability: f64,
    action: EventAction,
}

/// An event that fires at the elements of one locus, each element at rate
/// `probability`.
#[derive(Clone)]
pub(crate) struct PerElementEvent {
    pub(crate) name: String,
    pub(crate) locus: usize,
    pub(crate) probability: f64,
    pub(crate) action: EventAction,
}

/// The resolved and validated structure of a model.
pub(crate) struct ModelDefinition {
    pub(crate) compartments: Vec<Compartment>,
    pub(crate) fractions: Vec<f64>,
    pub(crate) loci: Vec<Locus>,
    pub(crate) events: Vec<PerElementEvent>,
}

/// Collects the declarations a `CompartmentedModel` makes in `build`.
#[derive(Default)]
pub struct ModelBuilder {
    compartments: Vec<(Compartment, f64)>,
    loci: Vec<LocusDefinition>,
    events: Vec<EventDefinition>,
}

impl ModelBuilder {
    #[must_use]
    pub fn new() -> ModelBuilder {
        ModelBuilder::default()
    }

    /// Declares a compartment and the fraction of nodes that start in it.
    pub fn add_compartment(&mut self, compartment: Compartment, fraction: f64) -> &mut Self {
        trace!("adding compartment {compartment} with initial fraction {fraction}");
        self.compartments.push((compartment, fraction));
        self
    }

    /// Tracks the nodes in `compartment` in a locus named after the compartment.
    pub fn track_nodes_in_compartment(&mut self, compartment: Compartment) -> &mut Self {
        self.loci.push(LocusDefinition {
            name: compartment.to_string(),
            from: compartment,
            to: None,
        });
        self
    }

    /// Tracks the edges joining a node in `from` to a node in `to` in a locus
    /// called `name`. Elements are oriented: the first endpoint is in `from`.
    pub fn track_edges_between_compartments(
        &mut self,
        from: Compartment,
        to: Compartment,
        name: &str,
    ) -> &mut Self {
        self.loci.push(LocusDefinition {
            name: name.to_string(),
            from,
            to: Some(to),
        });
        self
    }

    /// Adds an event occurring at each element of `locus` with rate
    /// `probability`. The event is named after its locus.
    pub fn add_event_per_element(
        &mut self,
        locus: &str,
        probability: f64,
        action: EventAction,
    ) -> &mut Self {
        self.events.push(EventDefinition {
            locus: locus.to_string(),
            probability,
            action,
        });
        self
    }

    fn compartment_id(&self, compartment: Compartment) -> Result<CompartmentId, EpiError> {
        self.compartments
            .iter()
            .position(|(c, _)| *c == compartment)
            .map(CompartmentId)
            .ok_or_else(|| EpiError::ModelError(format!("Unknown compartment '{compartment}'")))
    }

    /// Resolves names to indices and checks the declarations are consistent.
    pub(crate) fn finish(self) -> Result<ModelDefinition, EpiError> {
        if self.compartments.is_empty() {
            return Err(EpiError::ModelError(
                "A model needs at least one compartment".to_string(),
            ));
        }

        let mut compartments = Vec::with_capacity(self.compartments.len());
        let mut fractions = Vec::with_capacity(self.compartments.len());
        for (compartment, fraction) in &self.compartments {
            if compartments.contains(compartment) {
                return Err(EpiError::ModelError(format!(
                    "Compartment '{compartment}' declared twice"
                )));
            }
            if !fraction.is_finite() || !(0.0..=1.0).contains(fraction) {
                return Err(EpiError::ModelError(format!(
                    "Initial fraction of compartment '{compartment}' must be in [0, 1], got {fraction}"
                )));
            }
            compartments.push(*compartment);
            fractions.push(*fraction);
        }
        let total: f64 = fractions.iter().sum();
        if !abs_diff_eq!(total, 1.0, epsilon = FRACTION_TOLERANCE) {
            return Err(EpiError::ModelError(format!(
                "Initial compartment fractions must sum to 1, got {total}"
            )));
        }

        let mut loci: Vec<Locus> = Vec::with_capacity(self.loci.len());
        for definition in &self.loci {
            if loci.iter().any(|locus| locus.name == definition.name) {
                return Err(EpiError::ModelError(format!(
                    "Locus '{}' declared twice",
                    definition.name
                )));
            }
            let from = self.compartment_id(definition.from)?;
            let kind = match definition.to {
                None => LocusKind::Nodes(from),
                Some(to) => LocusKind::Edges {
                    from,
                    to: self.compartment_id(to)?,
                },
            };
            loci.push(Locus::new(definition.name.clone(), kind));
        }

        let mut events = Vec::with_capacity(self.events.len());
        for definition in self.events {
            let locus = loci
                .iter()
                .position(|locus| locus.name == definition.locus)
                .ok_or_else(|| {
                    EpiError::ModelError(format!(
                        "Event refers to unknown locus '{}'",
                        definition.locus
                    ))
                })?;
            let probability = definition.probability;
            if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
                return Err(EpiError::ModelError(format!(
                    "Probability of event at locus '{}' must be in [0, 1], got {probability}",
                    definition.locus
                )));
            }
            events.push(PerElementEvent {
                name: definition.locus,
                locus,
                probability,
                action: definition.action,
            });
        }

        Ok(ModelDefinition {
            compartments,
            fractions,
            loci,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_context: &mut Context, _t: f64, _element: Element) -> Result<(), EpiError> {
        Ok(())
    }

    fn sir_builder() -> ModelBuilder {
        let mut builder = ModelBuilder::new();
        builder
            .add_compartment("I", 0.1)
            .add_compartment("R", 0.0)
            .add_compartment("S", 0.9)
            .track_nodes_in_compartment("I")
            .track_edges_between_compartments("S", "I", "SI")
            .add_event_per_element("SI", 0.2, noop)
            .add_event_per_element("I", 0.5, noop);
        builder
    }

    #[test]
    fn resolves_definition() {
        let definition = sir_builder().finish().unwrap();
        assert_eq!(definition.compartments, vec!["I", "R", "S"]);
        assert_eq!(definition.loci.len(), 2);
        assert_eq!(
            definition.loci[1].kind,
            LocusKind::Edges {
                from: CompartmentId(2),
                to: CompartmentId(0)
            }
        );
        assert_eq!(definition.events[0].name, "SI");
        assert_eq!(definition.events[0].locus, 1);
        assert_eq!(definition.events[1].locus, 0);
    }

    #[test]
    fn fractions_must_sum_to_one() {
        let mut builder = ModelBuilder::new();
        builder.add_compartment("S", 0.5).add_compartment("I", 0.4);
        let err = builder.finish().err().unwrap();
        assert!(matches!(err, EpiError::ModelError(ref m) if m.contains("sum to 1")));
    }

    #[test]
    fn fractions_within_tolerance() {
        let mut builder = ModelBuilder::new();
        builder
            .add_compartment("S", 1.0 - 0.01)
            .add_compartment("I", 0.01);
        assert!(builder.finish().is_ok());
    }

    #[test]
    fn rejects_empty_model() {
        assert!(ModelBuilder::new().finish().is_err());
    }

    #[test]
    fn rejects_duplicate_compartment() {
        let mut builder = ModelBuilder::new();
        builder.add_compartment("S", 0.5).add_compartment("S", 0.5);
        assert!(builder.finish().is_err());
    }

    #[test]
    fn rejects_negative_fraction() {
        let mut builder = ModelBuilder::new();
        builder.add_compartment("S", 1.5).add_compartment("I", -0.5);
        assert!(builder.finish().is_err());
    }

    #[test]
    fn rejects_unknown_compartment_in_locus() {
        let mut builder = ModelBuilder::new();
        builder
            .add_compartment("S", 1.0)
            .track_nodes_in_compartment("X");
        let err = builder.finish().err().unwrap();
        assert!(matches!(err, EpiError::ModelError(ref m) if m.contains("'X'")));
    }

    #[test]
    fn rejects_unknown_locus_in_event() {
        let mut builder = ModelBuilder::new();
        builder
            .add_compartment("S", 1.0)
            .add_event_per_element("nowhere", 0.5, noop);
        assert!(builder.finish().is_err());
    }

    #[test]
    fn rejects_duplicate_locus() {
        let mut builder = ModelBuilder::new();
        builder
            .add_compartment("S", 1.0)
            .track_nodes_in_compartment("S")
            .track_nodes_in_compartment("S");
        assert!(builder.finish().is_err());
    }

    #[test]
    fn rejects_bad_probability() {
        let mut builder = sir_builder();
        builder.add_event_per_element("I", 1.5, noop);
        assert!(builder.finish().is_err());
    }
}
