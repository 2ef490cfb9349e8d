use indexmap::IndexSet;

use crate::compartments::{CompartmentId, Element};
use crate::network::NodeId;

/// What a locus tracks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum LocusKind {
    /// Nodes in one compartment
    Nodes(CompartmentId),
    /// Edges whose first endpoint is in `from` and second endpoint in `to`.
    /// When `from == to` each edge appears once, lowest node first.
    Edges {
        from: CompartmentId,
        to: CompartmentId,
    },
}

/// A dynamically maintained set of elements at which per-element events can
/// occur.
///
/// Elements are held in an `IndexSet` so that membership updates are *O*(1)
/// and a uniformly random element can be drawn by index.
#[derive(Clone, Debug)]
pub(crate) struct Locus {
    pub(crate) name: String,
    pub(crate) kind: LocusKind,
    elements: IndexSet<Element>,
}

impl Locus {
    pub(crate) fn new(name: String, kind: LocusKind) -> Locus {
        Locus {
            name,
            kind,
            elements: IndexSet::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    pub(crate) fn contains(&self, element: &Element) -> bool {
        self.elements.contains(element)
    }

    pub(crate) fn insert(&mut self, element: Element) {
        self.elements.insert(element);
    }

    pub(crate) fn remove(&mut self, element: &Element) {
        self.elements.swap_remove(element);
    }

    pub(crate) fn get(&self, index: usize) -> Option<Element> {
        self.elements.get_index(index).copied()
    }

    pub(crate) fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.elements.iter().copied()
    }

    /// True if this locus tracks edges touching compartment `compartment` at either end.
    pub(crate) fn tracks_edges_touching(&self, compartment: CompartmentId) -> bool {
        match self.kind {
            LocusKind::Edges { from, to } => from == compartment || to == compartment,
            LocusKind::Nodes(_) => false,
        }
    }

    /// The element this locus holds for the edge `(a, b)` given the endpoints'
    /// compartments, if the edge matches the locus.
    pub(crate) fn edge_element(
        &self,
        a: NodeId,
        a_compartment: CompartmentId,
        b: NodeId,
        b_compartment: CompartmentId,
    ) -> Option<Element> {
        let LocusKind::Edges { from, to } = self.kind else {
            return None;
        };
        if from == to {
            (a_compartment == from && b_compartment == to)
                .then(|| Element::Edge(a.min(b), a.max(b)))
        } else if a_compartment == from && b_compartment == to {
            Some(Element::Edge(a, b))
        } else if b_compartment == from && a_compartment == to {
            Some(Element::Edge(b, a))
        } else {
            None
        }
    }
}
