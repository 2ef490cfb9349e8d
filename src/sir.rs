//! The SIR (Susceptible-Infected-Removed) model on a network.
//!
//! Nodes start infected with probability `pInfected` and susceptible
//! otherwise. Infection travels along SI edges at rate `pInfect` per edge,
//! and infected nodes are removed at rate `pRemove`. Every edge that carries
//! an infection is marked occupied at the time of infection.
use log::trace;

use crate::compartments::{CompartmentedModel, ContextCompartmentsExt, Element, ModelBuilder};
use crate::context::Context;
use crate::error::EpiError;
use crate::network::Edge;
use crate::parameters::Parameters;

pub const SUSCEPTIBLE: &str = "S";
pub const INFECTED: &str = "I";
pub const REMOVED: &str = "R";

/// Initial probability of a node being infected.
pub const P_INFECTED: &str = "pInfected";
/// Rate of infection along an SI edge.
pub const P_INFECT: &str = "pInfect";
/// Rate at which an infected node is removed.
pub const P_REMOVE: &str = "pRemove";

/// Locus of the edges joining a susceptible node to an infected one.
pub const SI: &str = "SI";

#[derive(Copy, Clone, Debug, Default)]
pub struct SIR;

impl SIR {
    #[must_use]
    pub fn new() -> SIR {
        SIR
    }
}

fn infect(context: &mut Context, t: f64, element: Element) -> Result<(), EpiError> {
    let (susceptible, infected) = element
        .endpoints()
        .ok_or_else(|| EpiError::ModelError(format!("Infection at non-edge {element}")))?;
    trace!("{infected} infects {susceptible} at {t}");
    context.change_compartment(susceptible, INFECTED)?;
    context.mark_occupied(Edge::new(susceptible, infected), t)
}

fn remove(context: &mut Context, _t: f64, element: Element) -> Result<(), EpiError> {
    let node = element
        .node()
        .ok_or_else(|| EpiError::ModelError(format!("Removal at non-node {element}")))?;
    context.change_compartment(node, REMOVED)
}

impl CompartmentedModel for SIR {
    fn name(&self) -> &str {
        "SIR"
    }

    fn build(&self, builder: &mut ModelBuilder, parameters: &Parameters) -> Result<(), EpiError> {
        let p_infected = parameters.probability(P_INFECTED)?;
        let p_infect = parameters.probability(P_INFECT)?;
        let p_remove = parameters.probability(P_REMOVE)?;

        builder
            .add_compartment(INFECTED, p_infected)
            .add_compartment(REMOVED, 0.0)
            .add_compartment(SUSCEPTIBLE, 1.0 - p_infected)
            .track_nodes_in_compartment(INFECTED)
            .track_edges_between_compartments(SUSCEPTIBLE, INFECTED, SI)
            .add_event_per_element(SI, p_infect, infect)
            .add_event_per_element(INFECTED, p_remove, remove);
        Ok(())
    }
}
