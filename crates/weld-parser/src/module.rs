//! Go module resolution
//!
//! Maps directories inside a module to canonical import paths using the
//! `module` directive of the nearest `go.mod`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::ParserError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Directory containing go.mod
    dir: PathBuf,
    /// Module path declared by go.mod (e.g., "github.com/acme/shop")
    path: String,
}

impl Module {
    pub fn new(dir: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            path: path.into(),
        }
    }

    /// Find the module containing `start`, walking up to the nearest go.mod
    pub fn find(start: &Path) -> Result<Self, ParserError> {
        let start = start.canonicalize()?;
        for dir in start.ancestors() {
            let go_mod = dir.join("go.mod");
            if go_mod.is_file() {
                let content = fs::read_to_string(&go_mod)?;
                let path = parse_module_path(&content).ok_or_else(|| ParserError::InvalidModule {
                    path: go_mod.clone(),
                    message: "missing module directive".to_string(),
                })?;
                tracing::debug!("Module: found {} at {}", path, dir.display());
                return Ok(Self::new(dir, path));
            }
        }
        Err(ParserError::ModuleNotFound(start))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute location of a module-relative path
    pub fn directory(&self, relative: &str) -> PathBuf {
        let mut dir = self.dir.clone();
        dir.extend(relative.split('/').filter(|s| !s.is_empty() && *s != "."));
        dir
    }

    /// Canonical import path of a directory inside the module
    pub fn resolve_import(&self, dir: &Path) -> Result<String, ParserError> {
        let relative = dir.strip_prefix(&self.dir).map_err(|_| ParserError::ImportResolution {
            path: dir.to_path_buf(),
            message: format!("not inside module {}", self.path),
        })?;

        let mut import = self.path.clone();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    import.push('/');
                    import.push_str(&segment.to_string_lossy());
                }
                Component::CurDir => {}
                _ => {
                    return Err(ParserError::ImportResolution {
                        path: dir.to_path_buf(),
                        message: "path escapes the module".to_string(),
                    })
                }
            }
        }
        Ok(import)
    }
}

/// The path named by the `module` directive of a go.mod file
fn parse_module_path(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then(|| path.to_string())
    })
}
