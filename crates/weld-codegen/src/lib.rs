//! Code generation for resolved dependency graphs

pub mod error;
pub mod go;
pub mod import_tracker;

use weld_core::{Graph, PackageSource};

pub use error::CodegenError;
pub use go::{Artifact, GoCodegen, Import};

/// Common trait for all code generators
pub trait Codegen {
    fn generate(&mut self, graph: &Graph) -> Result<Artifact, CodegenError>;
}

/// Generate Go source for `graph` using the metadata it was resolved against
pub fn generate<S: PackageSource + ?Sized>(source: &S, graph: &Graph) -> Result<Artifact, CodegenError> {
    GoCodegen::new(source).generate(graph)
}
