//! Dependency identities, provider lookup and graph resolution for weld

pub mod dependency;
pub mod error;
pub mod function;
pub mod graph;
pub mod lookup;
pub mod naming;
pub mod package;
pub mod printer;
pub mod registry;
pub mod resolver;

pub use dependency::{Dependency, TypeRef};
pub use error::{Chain, CoreError, InjectError};
pub use function::{Aliases, Function};
pub use graph::{Edge, ErrorSource, Graph, Node, NodeId, Output};
pub use lookup::{Input, Lookup, Provider, ProviderKind};
pub use package::{FieldDecl, FunctionDecl, Package, PackageSource, TypeDecl, TypeKind};
pub use registry::PackageRegistry;
pub use resolver::Injector;
