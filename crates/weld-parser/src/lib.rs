//! Package metadata and module resolution for weld
//!
//! The resolver only sees [`weld_core::PackageSource`]; this crate fills one
//! from package index files and maps module directories to import paths.

pub mod error;
pub mod index;
pub mod module;

pub use error::ParserError;
pub use index::{Format, PackageIndex};
pub use module::Module;
