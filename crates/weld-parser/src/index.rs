//! Package index files
//!
//! A package index lists the exported declarations of Go packages in the
//! shape [`weld_core::Package`] expects. Whatever extracts declarations from
//! Go sources writes these files; weld only reads them.
//!
//! ```yaml
//! packages:
//!   - import: app/db
//!     types:
//!       - name: Conn
//!     functions:
//!       - name: New
//!         results: ["*Conn", error]
//! ```
//!
//! Files named `*.weld.yaml`, `*.weld.yml` or `*.weld.json` below a module
//! root are picked up by [`PackageIndex::discover`].

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;
use weld_core::{Package, PackageRegistry};

use crate::ParserError;

const INDEX_SUFFIXES: &[&str] = &[".weld.yaml", ".weld.yml", ".weld.json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIndex {
    #[serde(default)]
    pub packages: Vec<Package>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(content: &str, format: Format) -> Result<Self, ParserError> {
        let index = match format {
            Format::Json => serde_json::from_str(content)?,
            Format::Yaml => serde_yaml::from_str(content)?,
        };
        Ok(index)
    }

    /// Load an index file, picking the format from its extension
    pub fn from_file(path: &Path) -> Result<Self, ParserError> {
        let format = Format::from_path(path).ok_or_else(|| ParserError::InvalidIndex {
            path: path.to_path_buf(),
            message: "expected a .json, .yaml or .yml file".to_string(),
        })?;
        let content = fs::read_to_string(path)?;
        let index = Self::from_str(&content, format)?;

        if let Some(package) = index.packages.iter().find(|p| p.import.trim().is_empty()) {
            return Err(ParserError::InvalidIndex {
                path: path.to_path_buf(),
                message: format!("package {:?} has an empty import path", package.name),
            });
        }
        tracing::debug!("PackageIndex: loaded {} packages from {}", index.packages.len(), path.display());
        Ok(index)
    }

    /// Index files below `root`, sorted by path
    pub fn discover(root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                INDEX_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
            })
            .map(|e| e.into_path())
            .collect();
        files.sort();
        tracing::debug!("PackageIndex: discovered {} index files under {}", files.len(), root.display());
        files
    }

    /// Load and merge several index files
    pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ParserError> {
        let mut merged = Self::new();
        for path in paths {
            merged.merge(Self::from_file(path.as_ref())?);
        }
        Ok(merged)
    }

    pub fn merge(&mut self, other: PackageIndex) {
        self.packages.extend(other.packages);
    }

    /// Build a registry, rejecting import paths declared more than once
    pub fn into_registry(self) -> Result<PackageRegistry, ParserError> {
        let mut seen = BTreeSet::new();
        let mut registry = PackageRegistry::new();
        for package in self.packages {
            if !seen.insert(package.import.clone()) {
                return Err(ParserError::DuplicatePackage(package.import));
            }
            registry.register(package);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weld_core::{PackageSource, TypeRef};

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a.weld.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("a.weld.yml")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("a.toml")), None);
        assert_eq!(Format::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_from_str_json() {
        let json = r#"{"packages": [{"import": "app/log", "functions": [{"name": "New", "results": ["*Logger"]}]}]}"#;
        let registry = PackageIndex::from_str(json, Format::Json).unwrap().into_registry().unwrap();

        let package = registry.package("app/log").unwrap();
        assert_eq!(package.functions[0].results, vec![TypeRef::pointer("app/log", "Logger")]);
    }

    #[test]
    fn test_duplicate_package_rejected() {
        let yaml = "packages:\n  - import: app/db\n  - import: app/db\n";
        let err = PackageIndex::from_str(yaml, Format::Yaml)
            .unwrap()
            .into_registry()
            .unwrap_err();
        assert!(matches!(err, ParserError::DuplicatePackage(ref import) if import == "app/db"));
    }

    #[test]
    fn test_malformed_reference_rejected() {
        let yaml = "packages:\n  - import: app/db\n    functions:\n      - name: New\n        results: [\"app/db.\"]\n";
        assert!(matches!(
            PackageIndex::from_str(yaml, Format::Yaml),
            Err(ParserError::Yaml(_))
        ));
    }
}
