//! Human-readable dumps of a resolved [`Graph`]
//!
//! ## Tree
//!
//! ```text
//! Load in "app/web"
//!   "app/http".Server <- http.NewServer
//!     "app/db".*Conn <- db.New (fallible)
//!     "app/log".*Logger <- log.New
//!   error (propagated)
//! ```
//!
//! Each output is a root; children are listed in the provider's input order.
//! In a hoisted graph a node already printed is shown once more, tagged
//! `(shared)`, without repeating its subtree.

use std::collections::HashSet;
use std::fmt::Write;

use petgraph::dot::{Config, Dot};

use crate::dependency::TypeRef;
use crate::graph::{ErrorSource, Graph, Node, NodeId, Output};

const INDENT: &str = "  ";

impl Graph {
    /// Indented tree of every output and the nodes it depends on
    pub fn print(&self) -> String {
        let mut lines = vec![format!("{} in \"{}\"", self.name(), self.target())];
        let mut printed = HashSet::new();

        for output in self.outputs() {
            match output {
                Output::Value {
                    node,
                    requested,
                    resolved,
                } => self.print_node(*node, requested, resolved, 1, &mut printed, &mut lines),
                Output::Error(ErrorSource::Propagated) => {
                    lines.push(format!("{}error (propagated)", INDENT));
                }
                Output::Error(ErrorSource::Zero(_)) => {
                    lines.push(format!("{}error <- nil", INDENT));
                }
            }
        }

        lines.join("\n")
    }

    fn print_node(
        &self,
        id: NodeId,
        requested: &TypeRef,
        resolved: &TypeRef,
        depth: usize,
        printed: &mut HashSet<NodeId>,
        lines: &mut Vec<String>,
    ) {
        let mut line = INDENT.repeat(depth);
        line.push_str(&requested.to_string());
        if requested != resolved {
            let _ = write!(line, " => {}", resolved);
        }

        match self.node(id) {
            Node::External { .. } => line.push_str(" (external)"),
            Node::ZeroError => line.push_str(" <- nil"),
            Node::Provider { provider, .. } => {
                let _ = write!(line, " <- {}", provider);
                if provider.fallible {
                    line.push_str(" (fallible)");
                }
                if self.hoist() && !printed.insert(id) {
                    line.push_str(" (shared)");
                    lines.push(line);
                    return;
                }
            }
        }
        lines.push(line);

        for (child, edge) in self.children(id) {
            self.print_node(child, &edge.requested, &edge.resolved, depth + 1, printed, lines);
        }
    }

    /// Graphviz rendering, edges pointing from consumer to dependency
    pub fn to_dot(&self) -> String {
        let labelled = self.inner().map(
            |_, node| match node {
                Node::External { dependency, .. } => format!("{} (external)", dependency),
                Node::Provider {
                    dependency,
                    provider,
                } => format!("{} <- {}", dependency, provider),
                Node::ZeroError => "nil error".to_string(),
            },
            |_, edge| edge.position,
        );
        format!("{}", Dot::with_config(&labelled, &[Config::EdgeNoLabel]))
    }
}
