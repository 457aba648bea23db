//! Import tracking for Go code generation
//!
//! Every qualified identifier in the generated function goes through the
//! tracker, which hands out one alias per import path and records which type
//! names were reached through it.
//!
//! ## Aliases
//!
//! An import is aliased by its Go package name. When two import paths share a
//! package name, the later one gets a numeric suffix (`db`, `db2`, `db3`).
//! Aliases are assigned in order of first use, so the same graph always gets
//! the same aliases.
//!
//! ## Usage
//!
//! ```
//! use weld_codegen::import_tracker::ImportTracker;
//!
//! let mut tracker = ImportTracker::new("app/web");
//! assert_eq!(tracker.add_type_reference("app/db", "db", "Conn"), Some("db".to_string()));
//! assert_eq!(tracker.add_type_reference("legacy/db", "db", "Conn"), Some("db2".to_string()));
//! assert_eq!(tracker.add_type_reference("app/web", "web", "Handler"), None);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Information about a single import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    /// The canonical import path (e.g., "app/db")
    pub path: String,
    /// The alias used to qualify identifiers (e.g., "db")
    pub alias: String,
    /// Type names referenced through this import
    pub types: BTreeSet<String>,
    /// Whether the alias differs from the package name
    pub renamed: bool,
}

#[derive(Debug, Clone)]
pub struct ImportTracker {
    /// Import path of the package being generated; never imported
    target: String,
    /// All imports keyed by their alias
    imports_by_alias: BTreeMap<String, ImportInfo>,
    /// Reverse lookup: import path -> alias
    path_to_alias: HashMap<String, String>,
}

impl ImportTracker {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            imports_by_alias: BTreeMap::new(),
            path_to_alias: HashMap::new(),
        }
    }

    /// Reset the tracker for a new target package
    pub fn reset(&mut self, target: &str) {
        self.target = target.to_string();
        self.imports_by_alias.clear();
        self.path_to_alias.clear();
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Record a reference to `type_name` declared in `import`
    ///
    /// Returns the alias to qualify it with, or None for builtins and types
    /// of the target package.
    pub fn add_type_reference(&mut self, import: &str, package_name: &str, type_name: &str) -> Option<String> {
        let alias = self.add_import(import, package_name)?;
        if let Some(info) = self.imports_by_alias.get_mut(&alias) {
            info.types.insert(type_name.to_string());
        }
        Some(alias)
    }

    /// Record an import without naming a type, returning its alias
    pub fn add_import(&mut self, import: &str, package_name: &str) -> Option<String> {
        if import.is_empty() || import == self.target {
            return None;
        }
        if let Some(alias) = self.path_to_alias.get(import) {
            return Some(alias.clone());
        }

        let alias = self.generate_alias(package_name);
        tracing::trace!("ImportTracker: {} imported as {}", import, alias);
        self.imports_by_alias.insert(
            alias.clone(),
            ImportInfo {
                path: import.to_string(),
                alias: alias.clone(),
                types: BTreeSet::new(),
                renamed: alias != package_name,
            },
        );
        self.path_to_alias.insert(import.to_string(), alias.clone());
        Some(alias)
    }

    fn generate_alias(&self, package_name: &str) -> String {
        let mut alias = package_name.to_string();
        let mut suffix = 2;
        while self.imports_by_alias.contains_key(&alias) {
            alias = format!("{}{}", package_name, suffix);
            suffix += 1;
        }
        alias
    }

    /// Whether `name` is taken by an import alias
    pub fn is_alias(&self, name: &str) -> bool {
        self.imports_by_alias.contains_key(name)
    }

    /// All imports, sorted by import path
    pub fn all_imports(&self) -> Vec<&ImportInfo> {
        let mut imports: Vec<_> = self.imports_by_alias.values().collect();
        imports.sort_by(|a, b| a.path.cmp(&b.path));
        imports
    }

    pub fn stats(&self) -> ImportStats {
        ImportStats {
            imports: self.imports_by_alias.len(),
            renamed: self.imports_by_alias.values().filter(|i| i.renamed).count(),
            total_types: self.imports_by_alias.values().map(|i| i.types.len()).sum(),
        }
    }
}

/// Statistics about imports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub imports: usize,
    pub renamed: usize,
    pub total_types: usize,
}
