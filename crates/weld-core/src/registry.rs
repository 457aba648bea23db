//! In-memory registry of package declarations
//!
//! Maps canonical import paths to their declared packages. A registry is
//! read-only during resolution, so one instance can back any number of
//! concurrent `Injector::load` calls.

use std::collections::BTreeMap;

use crate::package::{Package, PackageSource};

#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    packages: BTreeMap<String, Package>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package, returning the declaration it replaced
    pub fn register(&mut self, package: Package) -> Option<Package> {
        let package = package.qualify();
        tracing::trace!(
            "PackageRegistry: registering {} ({} types, {} functions)",
            package.import,
            package.types.len(),
            package.functions.len()
        );
        self.packages.insert(package.import.clone(), package)
    }

    pub fn with_package(mut self, package: Package) -> Self {
        self.register(package);
        self
    }

    pub fn get(&self, import: &str) -> Option<&Package> {
        self.packages.get(import)
    }

    pub fn contains(&self, import: &str) -> bool {
        self.packages.contains_key(import)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Packages in import path order
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }
}

impl PackageSource for PackageRegistry {
    fn package(&self, import: &str) -> Option<&Package> {
        self.get(import)
    }
}

impl FromIterator<Package> for PackageRegistry {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        let mut registry = Self::new();
        for package in iter {
            registry.register(package);
        }
        registry
    }
}
