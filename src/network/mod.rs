//! A module for the contact network a model runs on.
//!
//! A network is a simple undirected graph over the nodes `0..order`. Self
//! loops and parallel edges are rejected. Each node keeps an adjacency list,
//! so iterating the neighbors of a node is cheap, which is what compartment
//! transitions need when they update edge loci.
//!
//! Networks are built either by a generator (`Network::erdos_renyi`,
//! `Network::complete`) or loaded from a CSV edge list, and are then handed to
//! a dynamics driver which stores them in its `Context`.

mod generators;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::define_data_plugin;
use crate::error::EpiError;

/// Identifies a node of a `Network`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub const fn new(index: usize) -> NodeId {
        NodeId(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An undirected edge, stored with its endpoints in ascending order so that
/// `Edge::new(a, b) == Edge::new(b, a)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    low: NodeId,
    high: NodeId,
}

impl Edge {
    #[must_use]
    pub fn new(a: NodeId, b: NodeId) -> Edge {
        if a <= b {
            Edge { low: a, high: b }
        } else {
            Edge { low: b, high: a }
        }
    }

    #[must_use]
    pub fn endpoints(self) -> (NodeId, NodeId) {
        (self.low, self.high)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Network {
    adjacency: Vec<Vec<NodeId>>,
    size: usize,
}

impl Network {
    /// Creates a network of `order` isolated nodes.
    #[must_use]
    pub fn with_nodes(order: usize) -> Network {
        Network {
            adjacency: vec![Vec::new(); order],
            size: 0,
        }
    }

    /// Number of nodes.
    #[must_use]
    pub fn order(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.adjacency.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.order()).map(NodeId::new)
    }

    /// Adds an undirected edge between `a` and `b`.
    ///
    /// # Errors
    ///
    /// `EpiError::NetworkError` if either node does not exist, `a == b`, or the
    /// edge is already present.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Result<(), EpiError> {
        self.check_node(a)?;
        self.check_node(b)?;
        if a == b {
            return Err(EpiError::NetworkError(format!(
                "Cannot make edge from node {a} to itself"
            )));
        }
        if self.has_edge(a, b) {
            return Err(EpiError::NetworkError(format!(
                "Edge ({a}, {b}) already exists"
            )));
        }
        self.push_edge(a, b);
        Ok(())
    }

    // Callers guarantee both nodes exist and the edge is new.
    fn push_edge(&mut self, a: NodeId, b: NodeId) {
        self.adjacency[a.index()].push(b);
        self.adjacency[b.index()].push(a);
        self.size += 1;
    }

    #[must_use]
    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        if !self.contains_node(a) || !self.contains_node(b) {
            return false;
        }
        // Scan the shorter of the two lists
        let (from, to) = if self.degree(a) <= self.degree(b) {
            (a, b)
        } else {
            (b, a)
        };
        self.adjacency[from.index()].contains(&to)
    }

    /// The neighbors of `node`, in the order their edges were added. Empty for
    /// nodes that do not exist.
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.adjacency
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn degree(&self, node: NodeId) -> usize {
        self.neighbors(node).len()
    }

    /// Every edge exactly once.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(index, neighbors)| {
            let node = NodeId::new(index);
            neighbors
                .iter()
                .filter(move |&&other| node < other)
                .map(move |&other| Edge::new(node, other))
        })
    }

    /// Average degree, `2 * size / order`. Zero for an empty network.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_degree(&self) -> f64 {
        if self.order() == 0 {
            0.0
        } else {
            2.0 * self.size as f64 / self.order() as f64
        }
    }

    fn check_node(&self, node: NodeId) -> Result<(), EpiError> {
        if self.contains_node(node) {
            Ok(())
        } else {
            Err(EpiError::NetworkError(format!(
                "Node {node} is not in a network of order {}",
                self.order()
            )))
        }
    }
}

define_data_plugin!(NetworkPlugin, Network, Network::default());

pub trait ContextNetworkExt {
    /// Installs the network the simulation runs on, replacing any previous one.
    fn set_network(&mut self, network: Network);

    /// The network the simulation runs on, or `None` if none has been installed.
    fn get_network(&self) -> Option<&Network>;

    /// Neighbors of `node` in the installed network. Empty if there is no
    /// network or the node does not exist.
    fn get_neighbors(&self, node: NodeId) -> Vec<NodeId>;
}

impl ContextNetworkExt for Context {
    fn set_network(&mut self, network: Network) {
        log::debug!(
            "installing network with {} nodes and {} edges",
            network.order(),
            network.size()
        );
        *self.get_data_mut(NetworkPlugin) = network;
    }

    fn get_network(&self) -> Option<&Network> {
        self.get_data(NetworkPlugin)
    }

    fn get_neighbors(&self, node: NodeId) -> Vec<NodeId> {
        self.get_network()
            .map(|network| network.neighbors(node).to_vec())
            .unwrap_or_default()
    }
}
