//! The resolved dependency graph
//!
//! Nodes live in a petgraph arena and are addressed by [`NodeId`]. An edge
//! runs from a provider to each node it consumes, so parents point at their
//! children; a hoisted node consumed by several providers has several
//! incoming edges and is constructed once.

use std::collections::HashSet;
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::dependency::TypeRef;
use crate::lookup::Provider;

pub type NodeId = NodeIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A parameter of the generated function
    External { dependency: TypeRef, position: usize },
    /// A value built by invoking a provider
    Provider {
        dependency: TypeRef,
        provider: Arc<Provider>,
    },
    /// The `nil` error returned when no provider can fail
    ZeroError,
}

impl Node {
    pub fn dependency(&self) -> Option<&TypeRef> {
        match self {
            Node::External { dependency, .. } | Node::Provider { dependency, .. } => Some(dependency),
            Node::ZeroError => None,
        }
    }

    /// The type of the value this node holds once bound
    pub fn produces(&self) -> Option<&TypeRef> {
        match self {
            Node::External { dependency, .. } => Some(dependency),
            Node::Provider { provider, .. } => Some(&provider.result),
            Node::ZeroError => None,
        }
    }

    pub fn provider(&self) -> Option<&Arc<Provider>> {
        match self {
            Node::Provider { provider, .. } => Some(provider),
            _ => None,
        }
    }

    pub fn is_fallible(&self) -> bool {
        self.provider().is_some_and(|p| p.fallible)
    }
}

/// A consumer's use of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Index of the provider input this edge feeds
    pub position: usize,
    /// The type the consumer declared
    pub requested: TypeRef,
    /// The type after alias substitution, matching the node's base type
    pub resolved: TypeRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    /// The first failing provider's error is returned
    Propagated,
    /// No provider can fail; the error is always `nil`
    Zero(NodeId),
}

/// One result of the generated function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Value {
        node: NodeId,
        requested: TypeRef,
        resolved: TypeRef,
    },
    Error(ErrorSource),
}

/// A resolved function: its nodes, declared params and results, and the
/// order in which values are bound
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) graph: DiGraph<Node, Edge>,
    pub(crate) name: String,
    pub(crate) target: String,
    pub(crate) params: Vec<NodeId>,
    pub(crate) outputs: Vec<Output>,
    pub(crate) order: Vec<NodeId>,
    pub(crate) hoist: bool,
}

impl Graph {
    pub(crate) fn new(
        graph: DiGraph<Node, Edge>,
        name: String,
        target: String,
        params: Vec<NodeId>,
        outputs: Vec<Output>,
        hoist: bool,
    ) -> Self {
        let mut resolved = Self {
            graph,
            name,
            target,
            params,
            outputs,
            order: Vec::new(),
            hoist,
        };
        resolved.order = resolved.topological_order();
        resolved
    }

    /// Children first, params leading in declared order, then every node
    /// reachable from the outputs in declaration order
    fn topological_order(&self) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.graph.node_count());

        for &param in &self.params {
            if visited.insert(param) {
                order.push(param);
            }
        }

        for output in &self.outputs {
            let root = match output {
                Output::Value { node, .. } => *node,
                Output::Error(ErrorSource::Zero(node)) => *node,
                Output::Error(ErrorSource::Propagated) => continue,
            };

            // Iterative post-order: (node, children expanded?)
            let mut stack = vec![(root, false)];
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    order.push(id);
                    continue;
                }
                if !visited.insert(id) {
                    continue;
                }
                stack.push((id, true));
                for (child, _) in self.children(id).into_iter().rev() {
                    if !visited.contains(&child) {
                        stack.push((child, false));
                    }
                }
            }
        }

        order
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn hoist(&self) -> bool {
        self.hoist
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.graph[id]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Nodes consumed by `id`, in the provider's declared input order
    pub fn children(&self, id: NodeId) -> Vec<(NodeId, &Edge)> {
        let mut children: Vec<_> = self
            .graph
            .edges_directed(id, Direction::Outgoing)
            .map(|e| (e.target(), e.weight()))
            .collect();
        children.sort_by_key(|(_, edge)| edge.position);
        children
    }

    /// Number of consumers of `id`, counting the function's results
    pub fn consumers(&self, id: NodeId) -> usize {
        let parents = self.graph.edges_directed(id, Direction::Incoming).count();
        let outputs = self
            .outputs
            .iter()
            .filter(|o| matches!(o, Output::Value { node, .. } if *node == id))
            .count();
        parents + outputs
    }

    /// External nodes in declared parameter order
    pub fn params(&self) -> &[NodeId] {
        &self.params
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Every node, children before parents
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Provider nodes in binding order
    pub fn providers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|id| matches!(self.graph[*id], Node::Provider { .. }))
    }

    /// Nodes without children
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph
            .node_indices()
            .filter(|id| self.graph.edges_directed(*id, Direction::Outgoing).next().is_none())
    }

    pub fn is_fallible(&self) -> bool {
        self.graph.node_weights().any(Node::is_fallible)
    }

    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph)
    }

    pub(crate) fn inner(&self) -> &DiGraph<Node, Edge> {
        &self.graph
    }
}
