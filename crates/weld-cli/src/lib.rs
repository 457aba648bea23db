//! Command-line glue for weld
//!
//! Builds a [`weld_core::Function`] from command-line references, resolves it
//! against the module's package indexes and renders the result.

pub mod config;
pub mod di;

pub use config::Config;
pub use di::{Command, Generated};
