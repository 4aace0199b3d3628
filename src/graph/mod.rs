//! Node/edge graph of a compose manifest
//!
//! [`GraphBuilder`] derives a [`Graph`] from a [`crate::compose::Manifest`];
//! [`GraphExporter`] serializes it as Graphviz DOT or JSON.

pub mod builder;
pub mod export;
pub mod ident;

pub use builder::GraphBuilder;
pub use export::GraphExporter;
pub use ident::nodify;

use serde::Serialize;
use std::collections::BTreeMap;

/// Graphviz attributes, kept sorted so output is stable
pub type Attrs = BTreeMap<String, String>;

/// What a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Fixed key explaining the visual encoding
    Legend,
    /// Top-level network
    Network,
    /// Service
    Service,
}

/// What relationship an edge stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Service attached to a network
    Network,
    /// Service mounting another service's volumes
    VolumesFrom,
    /// Service started after another
    DependsOn,
}

/// A graph node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Graph-safe identifier
    pub id: String,
    /// Node kind
    pub kind: NodeKind,
    /// Display attributes
    pub attrs: Attrs,
}

/// A directed edge. Its target may name no node at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    /// Source node identifier
    pub from: String,
    /// Target node identifier
    pub to: String,
    /// Edge kind
    pub kind: EdgeKind,
    /// Style attributes
    pub attrs: Attrs,
}

/// A named cluster of nodes drawn apart from the main graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subgraph {
    /// Identifier (`cluster_` prefixed so Graphviz draws a box)
    pub id: String,
    /// Subgraph attributes
    pub attrs: Attrs,
    /// Member nodes
    pub nodes: Vec<Node>,
}

/// Directed graph of services, networks and their relationships
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    /// Graph name, if any
    pub name: Option<String>,
    /// Clusters (the legend)
    pub subgraphs: Vec<Subgraph>,
    /// Top-level nodes
    pub nodes: Vec<Node>,
    /// Edges, in emission order
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Create an empty graph
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Find a top-level node by identifier
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges leaving `id`
    pub fn edges_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// Top-level nodes of one kind
    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }
}

/// Build an attribute map from literal pairs
pub(crate) fn attrs<const N: usize>(pairs: [(&str, &str); N]) -> Attrs {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
