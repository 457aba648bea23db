//! Graph resolution
//!
//! Turns a [`Function`] into a [`Graph`] by resolving each result depth-first:
//!
//! 1. Every param is registered as an external leaf.
//! 2. Each requested type is substituted through the alias map.
//! 3. A type matching a param resolves to that leaf.
//! 4. Otherwise its provider is located, marked *visiting*, and its inputs are
//!    resolved as children; revisiting a *visiting* type is a cycle.
//! 5. With hoisting, a *resolved* type reuses its node; without, it is built
//!    again as an independent subtree.
//!
//! Every error is raised before a graph is returned, so callers never see a
//! partially resolved function.

use std::collections::{HashMap, HashSet};

use petgraph::graph::DiGraph;
use tracing::{debug, instrument, trace};

use crate::dependency::{Dependency, TypeRef};
use crate::error::InjectError;
use crate::function::Function;
use crate::graph::{Edge, ErrorSource, Graph, Node, NodeId, Output};
use crate::lookup::Lookup;
use crate::package::PackageSource;

/// Resolves functions against a source of package declarations
pub struct Injector<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: PackageSource + ?Sized> Injector<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    #[instrument(skip_all, fields(function = %function.name, target = %function.target))]
    pub fn load(&self, function: &Function) -> Result<Graph, InjectError> {
        let mut resolution = Resolution::new(function, Lookup::new(self.source));
        let params = resolution.register_params()?;

        let mut outputs = Vec::with_capacity(function.results.len() + 1);
        let mut error_slot = None;
        for result in &function.results {
            match result {
                Dependency::Error => {
                    if error_slot.is_some() {
                        return Err(InjectError::DuplicateErrorResult);
                    }
                    error_slot = Some(outputs.len());
                    // Placeholder until we know whether anything can fail
                    outputs.push(Output::Error(ErrorSource::Propagated));
                }
                Dependency::Type(requested) | Dependency::Param(requested) => {
                    let (node, resolved) = resolution.resolve(requested)?;
                    outputs.push(Output::Value {
                        node,
                        requested: requested.clone(),
                        resolved,
                    });
                }
            }
        }

        resolution.check_unused()?;

        let has_values = outputs.iter().any(|o| matches!(o, Output::Value { .. }));
        if error_slot.is_none() && resolution.fallible && has_values {
            debug!("appending implicit error result");
            error_slot = Some(outputs.len());
            outputs.push(Output::Error(ErrorSource::Propagated));
        }

        if let Some(slot) = error_slot {
            if !resolution.fallible {
                let zero = resolution.graph.add_node(Node::ZeroError);
                outputs[slot] = Output::Error(ErrorSource::Zero(zero));
            }
        }

        let graph = Graph::new(
            resolution.graph,
            function.name.clone(),
            function.target.clone(),
            params,
            outputs,
            function.hoist,
        );
        debug_assert!(graph.is_acyclic());
        debug!(
            nodes = graph.node_count(),
            fallible = graph.is_fallible(),
            "resolved function"
        );
        Ok(graph)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Resolved(NodeId),
}

/// State local to one `load` call
struct Resolution<'f, 'a, S: ?Sized> {
    function: &'f Function,
    lookup: Lookup<'a, S>,
    graph: DiGraph<Node, Edge>,
    externals: Vec<(TypeRef, NodeId)>,
    used: HashSet<NodeId>,
    /// Keyed by base type
    marks: HashMap<TypeRef, Mark>,
    /// Dependencies currently being resolved, outermost first
    path: Vec<TypeRef>,
    fallible: bool,
}

impl<'f, 'a, S: PackageSource + ?Sized> Resolution<'f, 'a, S> {
    fn new(function: &'f Function, lookup: Lookup<'a, S>) -> Self {
        Self {
            function,
            lookup,
            graph: DiGraph::new(),
            externals: Vec::new(),
            used: HashSet::new(),
            marks: HashMap::new(),
            path: Vec::new(),
            fallible: false,
        }
    }

    fn register_params(&mut self) -> Result<Vec<NodeId>, InjectError> {
        let mut params = Vec::with_capacity(self.function.params.len());
        for (position, param) in self.function.params.iter().enumerate() {
            let dependency = param.type_ref().ok_or(InjectError::ErrorParam)?;
            if self.externals.iter().any(|(t, _)| t == dependency) {
                return Err(InjectError::DuplicateParam(dependency.clone()));
            }
            let id = self.graph.add_node(Node::External {
                dependency: dependency.clone(),
                position,
            });
            trace!("registered external {}", dependency);
            self.externals.push((dependency.clone(), id));
            params.push(id);
        }
        Ok(params)
    }

    /// Exact match first, then a match ignoring indirection
    fn external(&self, dependency: &TypeRef) -> Option<NodeId> {
        self.externals
            .iter()
            .find(|(t, _)| t == dependency)
            .or_else(|| self.externals.iter().find(|(t, _)| t.same_base(dependency)))
            .map(|(_, id)| *id)
    }

    /// Resolve `requested`, returning its node and the type after aliasing
    fn resolve(&mut self, requested: &TypeRef) -> Result<(NodeId, TypeRef), InjectError> {
        let dependency = self.function.aliases.resolve(requested)?;
        if dependency != *requested {
            trace!("aliased {} to {}", requested, dependency);
        }

        if let Some(id) = self.external(&dependency) {
            self.used.insert(id);
            return Ok((id, dependency));
        }

        // One provider serves a type and its pointer, so marks are per base type
        let key = dependency.base();
        match self.marks.get(&key) {
            Some(Mark::Visiting) => {
                let start = self
                    .path
                    .iter()
                    .position(|t| t.same_base(&dependency))
                    .unwrap_or(0);
                let mut cycle = self.path[start..].to_vec();
                cycle.push(dependency);
                return Err(InjectError::Cycle { cycle });
            }
            Some(Mark::Resolved(id)) if self.function.hoist => {
                trace!("reusing hoisted {}", dependency);
                return Ok((*id, dependency));
            }
            _ => {}
        }

        let provider = self.lookup.find(&dependency, &self.path)?;
        self.marks.insert(key.clone(), Mark::Visiting);
        self.path.push(dependency.clone());

        let mut children = Vec::with_capacity(provider.inputs.len());
        for (position, input) in provider.inputs.iter().enumerate() {
            let (child, resolved) = self.resolve(&input.dependency)?;
            children.push((
                child,
                Edge {
                    position,
                    requested: input.dependency.clone(),
                    resolved,
                },
            ));
        }

        self.path.pop();
        self.fallible |= provider.fallible;

        let id = self.graph.add_node(Node::Provider {
            dependency: dependency.clone(),
            provider,
        });
        for (child, edge) in children {
            self.graph.add_edge(id, child, edge);
        }
        trace!("resolved {}", dependency);
        self.marks.insert(key, Mark::Resolved(id));
        Ok((id, dependency))
    }

    /// Every declared param must be consumed somewhere in the graph
    fn check_unused(&self) -> Result<(), InjectError> {
        match self.externals.iter().find(|(_, id)| !self.used.contains(id)) {
            Some((dependency, _)) => Err(InjectError::UnusedParam(dependency.clone())),
            None => Ok(()),
        }
    }
}
