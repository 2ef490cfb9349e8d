//! A module for compartmented models on a network.
//!
//! Every node of the network is in exactly one compartment at any time. A
//! model declares its compartments with the fraction of nodes that start in
//! each, and a set of *loci*: named sets of nodes in one compartment, or of
//! edges joining nodes in two compartments. Per-element events are attached
//! to loci and fire at rate `probability` for every element of their locus.
//!
//! Installing a model in a `Context` with [`ContextCompartmentsExt::install_model`]
//! validates the declarations, assigns every node an initial compartment, and
//! fills the loci. From then on [`ContextCompartmentsExt::change_compartment`]
//! is the only way a node moves, and it keeps counts and loci consistent:
//! * the compartment counts always sum to the number of nodes
//! * every locus holds exactly the elements matching its definition
//!
//! A driver that has nothing left to fire can ask to be woken by the next
//! move with [`ContextCompartmentsExt::on_next_transition`].
mod locus;
mod model;

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use log::{debug, trace};
use serde::Serialize;

pub use model::{CompartmentedModel, EventAction, ModelBuilder, FRACTION_TOLERANCE};

use crate::compartments::locus::{Locus, LocusKind};
use crate::compartments::model::{ModelDefinition, PerElementEvent};
use crate::context::Context;
use crate::error::EpiError;
use crate::network::{ContextNetworkExt, Edge, Network, NodeId};
use crate::parameters::ContextParametersExt;
use crate::rand::distr::weighted::WeightedIndex;
use crate::rand::distr::Distribution;
use crate::random::ContextRandomExt;
use crate::{define_data_plugin, define_rng};

/// A compartment label such as `"S"`, `"I"` or `"R"`.
pub type Compartment = &'static str;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompartmentId(pub(crate) usize);

/// Where a per-element event occurs: at a node, or at an edge whose first
/// endpoint is in the locus' `from` compartment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Element {
    Node(NodeId),
    Edge(NodeId, NodeId),
}

impl Element {
    #[must_use]
    pub fn node(self) -> Option<NodeId> {
        match self {
            Element::Node(node) => Some(node),
            Element::Edge(..) => None,
        }
    }

    /// The endpoints of an edge element, in locus order.
    #[must_use]
    pub fn endpoints(self) -> Option<(NodeId, NodeId)> {
        match self {
            Element::Edge(a, b) => Some((a, b)),
            Element::Node(_) => None,
        }
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Node(node) => write!(f, "{node}"),
            Element::Edge(a, b) => write!(f, "({a}, {b})"),
        }
    }
}

define_rng!(CompartmentSeedingRng);

struct CompartmentsData {
    compartments: Vec<Compartment>,
    node_compartments: Vec<CompartmentId>,
    counts: Vec<usize>,
    loci: Vec<Locus>,
    events: Vec<PerElementEvent>,
    event_counts: Vec<usize>,
    occupied: IndexMap<Edge, f64>,
}

impl CompartmentsData {
    fn new(
        definition: ModelDefinition,
        assignments: Vec<CompartmentId>,
        network: &Network,
    ) -> CompartmentsData {
        let mut counts = vec![0; definition.compartments.len()];
        for compartment in &assignments {
            counts[compartment.0] += 1;
        }
        let event_counts = vec![0; definition.events.len()];
        let mut data = CompartmentsData {
            compartments: definition.compartments,
            node_compartments: assignments,
            counts,
            loci: definition.loci,
            events: definition.events,
            event_counts,
            occupied: IndexMap::new(),
        };

        for locus in &mut data.loci {
            match locus.kind {
                LocusKind::Nodes(compartment) => {
                    for (index, c) in data.node_compartments.iter().enumerate() {
                        if *c == compartment {
                            locus.insert(Element::Node(NodeId::new(index)));
                        }
                    }
                }
                LocusKind::Edges { .. } => {
                    for edge in network.edges() {
                        let (a, b) = edge.endpoints();
                        let a_compartment = data.node_compartments[a.index()];
                        let b_compartment = data.node_compartments[b.index()];
                        if let Some(element) = locus.edge_element(a, a_compartment, b, b_compartment)
                        {
                            locus.insert(element);
                        }
                    }
                }
            }
        }
        data
    }

    fn compartment_id(&self, compartment: &str) -> Result<CompartmentId, EpiError> {
        self.compartments
            .iter()
            .position(|c| *c == compartment)
            .map(CompartmentId)
            .ok_or_else(|| EpiError::ModelError(format!("Unknown compartment '{compartment}'")))
    }

    fn compartment_of(&self, node: NodeId) -> Result<CompartmentId, EpiError> {
        self.node_compartments
            .get(node.index())
            .copied()
            .ok_or_else(|| EpiError::ModelError(format!("Node {node} is not in the model")))
    }

    fn locus_index(&self, name: &str) -> Result<usize, EpiError> {
        self.loci
            .iter()
            .position(|locus| locus.name == name)
            .ok_or_else(|| EpiError::ModelError(format!("Unknown locus '{name}'")))
    }

    // Moves `node` to `to`, updating counts and every locus the move affects.
    fn transition(&mut self, node: NodeId, to: CompartmentId, neighbors: &[NodeId]) {
        let from = self.node_compartments[node.index()];
        if from == to {
            return;
        }

        for locus in &mut self.loci {
            match locus.kind {
                LocusKind::Nodes(compartment) => {
                    if compartment == from {
                        locus.remove(&Element::Node(node));
                    } else if compartment == to {
                        locus.insert(Element::Node(node));
                    }
                }
                LocusKind::Edges { .. } => {
                    if !locus.tracks_edges_touching(from) && !locus.tracks_edges_touching(to) {
                        continue;
                    }
                    for &neighbor in neighbors {
                        let neighbor_compartment = self.node_compartments[neighbor.index()];
                        if let Some(element) =
                            locus.edge_element(node, from, neighbor, neighbor_compartment)
                        {
                            locus.remove(&element);
                        }
                        if let Some(element) =
                            locus.edge_element(node, to, neighbor, neighbor_compartment)
                        {
                            locus.insert(element);
                        }
                    }
                }
            }
        }

        self.counts[from.0] -= 1;
        self.counts[to.0] += 1;
        self.node_compartments[node.index()] = to;
    }
}

define_data_plugin!(CompartmentsPlugin, Option<CompartmentsData>, None);

define_data_plugin!(
    TransitionListenerPlugin,
    Option<Box<dyn FnOnce(&mut Context)>>,
    None
);

fn model_data(context: &Context) -> Result<&CompartmentsData, EpiError> {
    context
        .get_data(CompartmentsPlugin)
        .and_then(Option::as_ref)
        .ok_or_else(|| EpiError::ModelError("No model installed".to_string()))
}

fn model_data_mut(context: &mut Context) -> Result<&mut CompartmentsData, EpiError> {
    context
        .get_data_mut(CompartmentsPlugin)
        .as_mut()
        .ok_or_else(|| EpiError::ModelError("No model installed".to_string()))
}

pub trait ContextCompartmentsExt {
    /// Builds `model` against the parameters stored in the context, assigns
    /// every node of the installed network an initial compartment, fills the
    /// loci, and finally runs the model's `setup` hook.
    ///
    /// Requires a network, parameters and an initialized random module.
    ///
    /// # Errors
    ///
    /// `EpiError::ModelError` if there is no network or the model definition is
    /// inconsistent, `EpiError::ParameterError` if the model's parameters are
    /// missing or invalid.
    fn install_model(&mut self, model: &dyn CompartmentedModel) -> Result<(), EpiError>;

    /// The compartments of the installed model, in declaration order.
    fn compartments(&self) -> Vec<Compartment>;

    /// # Errors
    ///
    /// `EpiError::ModelError` if no model is installed or the node is unknown.
    fn get_compartment(&self, node: NodeId) -> Result<Compartment, EpiError>;

    /// Moves `node` into `compartment`, keeping counts and loci consistent.
    /// Moving a node into the compartment it is already in does nothing.
    ///
    /// # Errors
    ///
    /// `EpiError::ModelError` if no model is installed, or the node or
    /// compartment is unknown.
    fn change_compartment(&mut self, node: NodeId, compartment: &str) -> Result<(), EpiError>;

    /// Queues `callback` to run as soon as the plan or callback in progress
    /// returns, once some node next changes compartment. Only one listener is
    /// kept; registering another replaces it.
    fn on_next_transition(&mut self, callback: impl FnOnce(&mut Context) + 'static);

    /// # Errors
    ///
    /// `EpiError::ModelError` if no model is installed or the compartment is unknown.
    fn compartment_count(&self, compartment: &str) -> Result<usize, EpiError>;

    /// Current size of every compartment, in declaration order. Empty if no
    /// model is installed.
    fn compartment_counts(&self) -> IndexMap<String, usize>;

    /// Records that `edge` was used, e.g. by an infection, at time `t`.
    /// A later mark overwrites an earlier one.
    ///
    /// # Errors
    ///
    /// `EpiError::ModelError` if no model is installed.
    fn mark_occupied(&mut self, edge: Edge, t: f64) -> Result<(), EpiError>;

    fn is_occupied(&self, edge: Edge) -> bool;

    /// Occupied edges with the time they were marked, in marking order.
    fn occupied_edges(&self) -> Vec<(Edge, f64)>;

    /// # Errors
    ///
    /// `EpiError::ModelError` if no model is installed or the locus is unknown.
    fn locus_size(&self, name: &str) -> Result<usize, EpiError>;

    /// Names of the per-element events, in declaration order.
    fn event_names(&self) -> Vec<String>;

    /// The total rate of each per-element event: its probability times the
    /// size of its locus. Empty if no model is installed.
    fn event_rates(&self) -> Vec<f64>;

    /// Probability of per-element event `event`, if it exists.
    fn event_probability(&self, event: usize) -> Option<f64>;

    /// Number of elements in the locus of event `event`.
    fn event_locus_size(&self, event: usize) -> usize;

    /// The `index`-th element of the locus of event `event`.
    fn event_element(&self, event: usize, index: usize) -> Option<Element>;

    /// A snapshot of the locus of event `event`.
    fn event_elements(&self, event: usize) -> Vec<Element>;

    /// True if `element` is currently in the locus of event `event`.
    fn event_locus_contains(&self, event: usize, element: Element) -> bool;

    /// Runs the action of event `event` at `element` at the current time.
    ///
    /// # Errors
    ///
    /// `EpiError::ModelError` if no model is installed or the event is unknown,
    /// otherwise any error the action returns.
    fn fire_event(&mut self, event: usize, element: Element) -> Result<(), EpiError>;

    /// How many times each event has fired, keyed by event name.
    fn events_fired(&self) -> IndexMap<String, usize>;
}

impl ContextCompartmentsExt for Context {
    fn install_model(&mut self, model: &dyn CompartmentedModel) -> Result<(), EpiError> {
        let parameters = self.get_parameters();
        let mut builder = ModelBuilder::new();
        model.build(&mut builder, &parameters)?;
        let definition = builder.finish()?;

        let order = self
            .get_network()
            .map(Network::order)
            .ok_or_else(|| EpiError::ModelError("No network installed".to_string()))?;
        let seeding = WeightedIndex::new(&definition.fractions)
            .map_err(|error| EpiError::ModelError(format!("Invalid fractions: {error}")))?;
        let assignments: Vec<CompartmentId> = self.sample(CompartmentSeedingRng, |rng| {
            (0..order)
                .map(|_| CompartmentId(seeding.sample(rng)))
                .collect()
        });

        let data = match self.get_network() {
            Some(network) => CompartmentsData::new(definition, assignments, network),
            None => return Err(EpiError::ModelError("No network installed".to_string())),
        };
        *self.get_data_mut(CompartmentsPlugin) = Some(data);
        debug!(
            "installed model {} on {order} nodes: {:?}",
            model.name(),
            self.compartment_counts()
        );

        model.setup(self, &parameters)
    }

    fn compartments(&self) -> Vec<Compartment> {
        model_data(self)
            .map(|data| data.compartments.clone())
            .unwrap_or_default()
    }

    fn get_compartment(&self, node: NodeId) -> Result<Compartment, EpiError> {
        let data = model_data(self)?;
        let id = data.compartment_of(node)?;
        Ok(data.compartments[id.0])
    }

    fn change_compartment(&mut self, node: NodeId, compartment: &str) -> Result<(), EpiError> {
        let neighbors = self.get_neighbors(node);
        let data = model_data_mut(self)?;
        let to = data.compartment_id(compartment)?;
        let from = data.compartment_of(node)?;
        if from == to {
            return Ok(());
        }
        trace!(
            "node {node}: {} -> {compartment}",
            data.compartments[from.0]
        );
        data.transition(node, to, &neighbors);

        if let Some(listener) = self.get_data_mut(TransitionListenerPlugin).take() {
            self.queue_callback(listener);
        }
        Ok(())
    }

    fn on_next_transition(&mut self, callback: impl FnOnce(&mut Context) + 'static) {
        *self.get_data_mut(TransitionListenerPlugin) = Some(Box::new(callback));
    }

    fn compartment_count(&self, compartment: &str) -> Result<usize, EpiError> {
        let data = model_data(self)?;
        let id = data.compartment_id(compartment)?;
        Ok(data.counts[id.0])
    }

    fn compartment_counts(&self) -> IndexMap<String, usize> {
        model_data(self)
            .map(|data| {
                data.compartments
                    .iter()
                    .zip(&data.counts)
                    .map(|(compartment, count)| ((*compartment).to_string(), *count))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn mark_occupied(&mut self, edge: Edge, t: f64) -> Result<(), EpiError> {
        model_data_mut(self)?.occupied.insert(edge, t);
        Ok(())
    }

    fn is_occupied(&self, edge: Edge) -> bool {
        model_data(self).is_ok_and(|data| data.occupied.contains_key(&edge))
    }

    fn occupied_edges(&self) -> Vec<(Edge, f64)> {
        model_data(self)
            .map(|data| data.occupied.iter().map(|(edge, t)| (*edge, *t)).collect())
            .unwrap_or_default()
    }

    fn locus_size(&self, name: &str) -> Result<usize, EpiError> {
        let data = model_data(self)?;
        let index = data.locus_index(name)?;
        Ok(data.loci[index].len())
    }

    fn event_names(&self) -> Vec<String> {
        model_data(self)
            .map(|data| data.events.iter().map(|event| event.name.clone()).collect())
            .unwrap_or_default()
    }

    #[allow(clippy::cast_precision_loss)]
    fn event_rates(&self) -> Vec<f64> {
        model_data(self)
            .map(|data| {
                data.events
                    .iter()
                    .map(|event| event.probability * data.loci[event.locus].len() as f64)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn event_probability(&self, event: usize) -> Option<f64> {
        let data = model_data(self).ok()?;
        data.events.get(event).map(|event| event.probability)
    }

    fn event_locus_size(&self, event: usize) -> usize {
        model_data(self)
            .ok()
            .and_then(|data| data.events.get(event).map(|event| data.loci[event.locus].len()))
            .unwrap_or(0)
    }

    fn event_element(&self, event: usize, index: usize) -> Option<Element> {
        let data = model_data(self).ok()?;
        let event = data.events.get(event)?;
        data.loci[event.locus].get(index)
    }

    fn event_elements(&self, event: usize) -> Vec<Element> {
        model_data(self)
            .ok()
            .and_then(|data| {
                data.events
                    .get(event)
                    .map(|event| data.loci[event.locus].elements().collect())
            })
            .unwrap_or_default()
    }

    fn event_locus_contains(&self, event: usize, element: Element) -> bool {
        model_data(self).is_ok_and(|data| {
            data.events
                .get(event)
                .is_some_and(|event| data.loci[event.locus].contains(&element))
        })
    }

    fn fire_event(&mut self, event: usize, element: Element) -> Result<(), EpiError> {
        let data = model_data_mut(self)?;
        let action = data
            .events
            .get(event)
            .map(|event| event.action)
            .ok_or_else(|| EpiError::ModelError(format!("Unknown event {event}")))?;
        data.event_counts[event] += 1;
        trace!("firing event {} at {element}", data.events[event].name);

        let t = self.get_current_time();
        action(self, t, element)
    }

    fn events_fired(&self) -> IndexMap<String, usize> {
        let mut fired = IndexMap::new();
        if let Ok(data) = model_data(self) {
            for (event, count) in data.events.iter().zip(&data.event_counts) {
                *fired.entry(event.name.clone()).or_insert(0) += count;
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Parameters;
    use crate::rand::rngs::SmallRng;
    use crate::rand::SeedableRng;

    struct ToyModel {
        susceptible: f64,
    }

    fn infect(context: &mut Context, t: f64, element: Element) -> Result<(), EpiError> {
        let (s, i) = element
            .endpoints()
            .ok_or_else(|| EpiError::ModelError("expected an edge".to_string()))?;
        context.change_compartment(s, "I")?;
        context.mark_occupied(Edge::new(s, i), t)
    }

    fn remove(context: &mut Context, _t: f64, element: Element) -> Result<(), EpiError> {
        let node = element
            .node()
            .ok_or_else(|| EpiError::ModelError("expected a node".to_string()))?;
        context.change_compartment(node, "R")
    }

    impl CompartmentedModel for ToyModel {
        fn name(&self) -> &str {
            "toy"
        }

        fn build(
            &self,
            builder: &mut ModelBuilder,
            parameters: &Parameters,
        ) -> Result<(), EpiError> {
            let p_infect = parameters.probability("pInfect")?;
            builder
                .add_compartment("S", self.susceptible)
                .add_compartment("I", 1.0 - self.susceptible)
                .add_compartment("R", 0.0)
                .track_nodes_in_compartment("I")
                .track_edges_between_compartments("S", "I", "SI")
                .add_event_per_element("SI", p_infect, infect)
                .add_event_per_element("I", 1.0, remove);
            Ok(())
        }
    }

    fn path_network(order: usize) -> Network {
        let mut network = Network::with_nodes(order);
        for i in 1..order {
            network.add_edge(NodeId::new(i - 1), NodeId::new(i)).unwrap();
        }
        network
    }

    fn setup_context(network: Network, susceptible: f64) -> Context {
        let mut context = Context::new();
        context.init_random(42);
        context.set_network(network);
        context.set_parameters(Parameters::new().with("pInfect", 0.5));
        context
            .install_model(&ToyModel { susceptible })
            .unwrap();
        context
    }

    fn n(i: usize) -> NodeId {
        NodeId::new(i)
    }

    // Recomputes the SI locus from scratch and checks it against the maintained one.
    fn check_loci(context: &Context) {
        let network = context.get_network().unwrap();
        let mut si = 0;
        for edge in network.edges() {
            let (a, b) = edge.endpoints();
            let pair = (
                context.get_compartment(a).unwrap(),
                context.get_compartment(b).unwrap(),
            );
            if pair == ("S", "I") || pair == ("I", "S") {
                si += 1;
                let element = if pair.0 == "S" {
                    Element::Edge(a, b)
                } else {
                    Element::Edge(b, a)
                };
                assert!(context.event_locus_contains(0, element));
            }
        }
        assert_eq!(context.locus_size("SI").unwrap(), si);
        assert_eq!(
            context.locus_size("I").unwrap(),
            context.compartment_count("I").unwrap()
        );
        let total: usize = context.compartment_counts().values().sum();
        assert_eq!(total, network.order());
    }

    #[test]
    fn no_model_installed() {
        let mut context = Context::new();
        assert!(context.compartment_counts().is_empty());
        assert!(context.event_rates().is_empty());
        let err = context.change_compartment(n(0), "I").unwrap_err();
        assert!(matches!(err, EpiError::ModelError(ref m) if m == "No model installed"));
    }

    #[test]
    fn install_requires_network() {
        let mut context = Context::new();
        context.init_random(1);
        context.set_parameters(Parameters::new().with("pInfect", 0.5));
        let err = context
            .install_model(&ToyModel { susceptible: 1.0 })
            .unwrap_err();
        assert!(matches!(err, EpiError::ModelError(ref m) if m.contains("network")));
    }

    #[test]
    fn install_reports_parameter_errors() {
        let mut context = Context::new();
        context.init_random(1);
        context.set_network(path_network(3));
        let err = context
            .install_model(&ToyModel { susceptible: 1.0 })
            .unwrap_err();
        assert!(matches!(err, EpiError::ParameterError(_)));
    }

    #[test]
    fn transitions_keep_loci_consistent() {
        let mut context = setup_context(path_network(4), 1.0);
        assert_eq!(context.compartment_count("S").unwrap(), 4);
        assert_eq!(context.locus_size("SI").unwrap(), 0);

        context.change_compartment(n(1), "I").unwrap();
        assert_eq!(context.locus_size("SI").unwrap(), 2);
        assert!(context.event_locus_contains(0, Element::Edge(n(0), n(1))));
        assert!(context.event_locus_contains(0, Element::Edge(n(2), n(1))));
        check_loci(&context);

        context.change_compartment(n(2), "I").unwrap();
        assert_eq!(context.locus_size("SI").unwrap(), 2);
        assert!(context.event_locus_contains(0, Element::Edge(n(3), n(2))));
        assert!(!context.event_locus_contains(0, Element::Edge(n(2), n(1))));
        check_loci(&context);

        context.change_compartment(n(1), "R").unwrap();
        assert_eq!(context.event_elements(0), vec![Element::Edge(n(3), n(2))]);
        assert_eq!(context.event_elements(1), vec![Element::Node(n(2))]);
        check_loci(&context);

        // A no-op move changes nothing
        context.change_compartment(n(2), "I").unwrap();
        check_loci(&context);
        assert_eq!(context.compartment_count("I").unwrap(), 1);
    }

    define_data_plugin!(WakeCountPlugin, usize, 0);

    #[test]
    fn listener_fires_once_after_a_move() {
        let mut context = setup_context(path_network(3), 1.0);
        context.on_next_transition(|context| *context.get_data_mut(WakeCountPlugin) += 1);

        // Staying put is not a transition
        context.change_compartment(n(0), "S").unwrap();
        context.execute();
        assert!(context.get_data(WakeCountPlugin).is_none());

        context.add_plan(1.0, |context| {
            context.change_compartment(n(0), "I").unwrap();
            context.change_compartment(n(1), "I").unwrap();
        });
        context.execute();
        assert_eq!(*context.get_data_mut(WakeCountPlugin), 1);

        context.add_plan(2.0, |context| {
            context.change_compartment(n(2), "I").unwrap();
        });
        context.execute();
        assert_eq!(*context.get_data_mut(WakeCountPlugin), 1);
    }

    #[test]
    fn unknown_compartment_or_node() {
        let mut context = setup_context(path_network(2), 1.0);
        assert!(context.change_compartment(n(0), "X").is_err());
        assert!(context.change_compartment(n(5), "I").is_err());
        assert!(context.get_compartment(n(5)).is_err());
        assert!(context.compartment_count("X").is_err());
        assert!(context.locus_size("X").is_err());
    }

    #[test]
    fn rates_follow_locus_sizes() {
        let mut context = setup_context(path_network(3), 1.0);
        context.change_compartment(n(1), "I").unwrap();
        let rates = context.event_rates();
        assert_eq!(rates.len(), 2);
        assert!((rates[0] - 2.0 * 0.5).abs() < f64::EPSILON);
        assert!((rates[1] - 1.0).abs() < f64::EPSILON);
        assert_eq!(context.event_names(), vec!["SI", "I"]);
        assert_eq!(context.event_probability(0), Some(0.5));
        assert_eq!(context.event_probability(9), None);
    }

    #[test]
    fn firing_events_runs_actions() {
        let mut context = setup_context(path_network(3), 1.0);
        context.change_compartment(n(1), "I").unwrap();
        assert_eq!(context.event_locus_size(0), 2);
        let element = context.event_element(0, 0).unwrap();
        context.fire_event(0, element).unwrap();
        assert_eq!(context.compartment_count("I").unwrap(), 2);
        let (s, i) = element.endpoints().unwrap();
        assert!(context.is_occupied(Edge::new(i, s)));
        assert_eq!(context.occupied_edges().len(), 1);

        context.fire_event(1, Element::Node(n(1))).unwrap();
        assert_eq!(context.get_compartment(n(1)).unwrap(), "R");
        check_loci(&context);

        let fired = context.events_fired();
        assert_eq!(fired["SI"], 1);
        assert_eq!(fired["I"], 1);
        assert!(context.fire_event(7, Element::Node(n(0))).is_err());
    }

    #[test]
    fn action_errors_are_returned() {
        let mut context = setup_context(path_network(2), 1.0);
        let err = context.fire_event(0, Element::Node(n(0))).unwrap_err();
        assert!(matches!(err, EpiError::ModelError(ref m) if m.contains("edge")));
    }

    #[test]
    fn seeding_follows_fractions() {
        let mut rng = SmallRng::seed_from_u64(5);
        let network = Network::erdos_renyi(5000, 0.001, &mut rng).unwrap();
        let context = setup_context(network, 0.8);
        let infected = context.compartment_count("I").unwrap();
        // Expected 1000 with standard deviation about 28
        assert!((850..1150).contains(&infected));
        assert_eq!(context.compartment_count("R").unwrap(), 0);
        check_loci(&context);
    }

    #[test]
    fn random_transitions_keep_invariants() {
        let mut rng = SmallRng::seed_from_u64(11);
        let network = Network::erdos_renyi(300, 0.03, &mut rng).unwrap();
        let mut context = setup_context(network, 0.9);
        for step in 0..200 {
            let node = n((step * 37) % 300);
            let target = ["S", "I", "R"][step % 3];
            context.change_compartment(node, target).unwrap();
        }
        check_loci(&context);
    }

    #[test]
    fn same_seed_same_seeding() {
        let mut rng = SmallRng::seed_from_u64(3);
        let network = Network::erdos_renyi(500, 0.01, &mut rng).unwrap();
        let a = setup_context(network.clone(), 0.5);
        let b = setup_context(network, 0.5);
        for node in 0..500 {
            assert_eq!(
                a.get_compartment(n(node)).unwrap(),
                b.get_compartment(n(node)).unwrap()
            );
        }
    }
}
