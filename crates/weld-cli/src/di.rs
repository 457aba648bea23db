//! The `di` command
//!
//! Turns user-facing references such as `"app/db".Conn`, `db.Conn` or
//! `*web.Handler` into a [`Function`], resolves it against the package
//! indexes of the current module and generates the wiring function.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info, warn};
use weld_codegen::{generate, Artifact};
use weld_core::{CoreError, Function, Injector, PackageRegistry, TypeRef};
use weld_parser::{Module, PackageIndex};

use crate::config::Config;

#[derive(Args, Debug, Clone, Default)]
pub struct Command {
    /// Name of the generated function
    #[arg(long)]
    pub name: String,

    /// Package the function is generated into (import path or module directory)
    #[arg(long)]
    pub target: String,

    /// Supply `to` wherever `from` is needed, as `from=to`
    #[arg(long = "map", value_name = "FROM=TO", value_parser = parse_mapping)]
    pub map: Vec<(String, String)>,

    /// Value the generated function returns, e.g. `"app/http".Server`
    #[arg(long = "dependency", value_name = "REF")]
    pub dependencies: Vec<String>,

    /// Value the generated function accepts as a parameter
    #[arg(long = "external", value_name = "REF")]
    pub externals: Vec<String>,

    /// Build each dependency once and share it
    #[arg(long)]
    pub hoist: bool,

    /// Print the resolved graph to stderr
    #[arg(long)]
    pub verbose: bool,

    /// Print the resolved graph as Graphviz instead of Go source
    #[arg(long)]
    pub dot: bool,

    /// Package index files to load in addition to weld.toml and discovery
    #[arg(long, env = "WELD_INDEX", value_delimiter = ',')]
    pub index: Vec<PathBuf>,

    /// Directory inside the Go module
    #[arg(long, env = "WELD_DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Write the output here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Everything one `di` invocation produced
#[derive(Debug, Clone)]
pub struct Generated {
    pub artifact: Artifact,
    /// Indented graph printout, when `--verbose` was given
    pub tree: Option<String>,
    /// Graphviz rendering, when `--dot` was given
    pub dot: Option<String>,
}

impl Generated {
    /// What goes to stdout or `--output`
    pub fn output(&self) -> String {
        match &self.dot {
            Some(dot) => dot.clone(),
            None => self.artifact.file(),
        }
    }
}

fn parse_mapping(s: &str) -> Result<(String, String), String> {
    let (from, to) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid mapping {:?}: expected FROM=TO", s))?;
    if from.trim().is_empty() || to.trim().is_empty() {
        return Err(format!("invalid mapping {:?}: expected FROM=TO", s));
    }
    Ok((from.trim().to_string(), to.trim().to_string()))
}

impl Command {
    pub fn run(&self) -> Result<Generated> {
        let module = Module::find(&self.dir)
            .with_context(|| format!("Failed to find a Go module from {}", self.dir.display()))?;
        info!("Generating {} in module {}", self.name, module.path());

        let config = Config::load(module.dir())?;
        let function = self.build_function(&module, &config)?;
        let registry = self.load_registry(&module, &config)?;

        let graph = Injector::new(&registry)
            .load(&function)
            .with_context(|| format!("Failed to resolve {}", function.name))?;
        debug!(
            "Resolved {} into {} nodes ({} providers)",
            function.name,
            graph.node_count(),
            graph.providers().count()
        );

        let artifact = generate(&registry, &graph)
            .with_context(|| format!("Failed to generate {}", function.name))?;

        Ok(Generated {
            artifact,
            tree: self.verbose.then(|| graph.print()),
            dot: self.dot.then(|| graph.to_dot()),
        })
    }

    /// Canonical import path for `path`
    ///
    /// A path naming a directory inside the module maps to that directory's
    /// import path; anything else is taken verbatim.
    pub fn to_import_path(&self, module: &Module, path: &str) -> Result<String> {
        let path = path.trim().trim_matches('"');
        let dir = module.directory(path);
        if !dir.is_dir() {
            return Ok(path.to_string());
        }
        let dir = dir
            .canonicalize()
            .with_context(|| format!("Failed to resolve directory {}", dir.display()))?;
        let import = module.resolve_import(&dir)?;
        debug!("Mapped {:?} to {}", path, import);
        Ok(import)
    }

    /// Parse `<import>.<type>`, with an optional `*` before either part
    pub fn to_dependency(&self, module: &Module, reference: &str) -> Result<TypeRef> {
        let trimmed = reference.trim();
        let (pointer, rest) = match trimmed.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let malformed = || CoreError::MalformedReference(reference.to_string());
        let idx = rest.rfind('.').ok_or_else(malformed)?;
        let (import, name) = (&rest[..idx], &rest[idx + 1..]);
        if import.trim().trim_matches('"').is_empty() {
            return Err(malformed().into());
        }

        let import = self.to_import_path(module, import)?;
        let type_ref = TypeRef::parse_qualified(&format!("\"{}\".{}", import, name))?;
        Ok(if pointer { type_ref.with_pointer(true) } else { type_ref })
    }

    pub fn build_function(&self, module: &Module, config: &Config) -> Result<Function> {
        let target = self.to_import_path(module, &self.target)?;
        let mut function = Function::new(&self.name, target).hoisted(self.hoist || config.generate.hoist);

        for (from, to) in &self.map {
            let from = self.to_dependency(module, from)?;
            let to = self.to_dependency(module, to)?;
            function = function.with_alias(from, to)?;
        }
        for reference in &self.externals {
            function = function.with_param(self.to_dependency(module, reference)?);
        }
        for reference in &self.dependencies {
            function = function.with_result(self.to_dependency(module, reference)?);
        }
        if !self.dependencies.is_empty() {
            function = function.with_error();
        }
        Ok(function)
    }

    /// Index files from `--index`, weld.toml and discovery, in that order
    pub fn index_files(&self, module: &Module, config: &Config) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self.index.clone();
        files.extend(config.index.paths.iter().map(|p| module.dir().join(p)));
        if config.index.discover {
            files.extend(PackageIndex::discover(module.dir()));
        }

        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for file in files {
            let canonical = canonical(&file)?;
            if seen.insert(canonical.clone()) {
                unique.push(canonical);
            }
        }
        Ok(unique)
    }

    pub fn load_registry(&self, module: &Module, config: &Config) -> Result<PackageRegistry> {
        let files = self.index_files(module, config)?;
        if files.is_empty() {
            warn!("No package index files found under {}", module.dir().display());
        }
        for file in &files {
            debug!("Using package index {}", file.display());
        }

        let registry = PackageIndex::load_all(&files)
            .context("Failed to load package indexes")?
            .into_registry()?;
        info!("Loaded {} packages from {} index files", registry.len(), files.len());
        Ok(registry)
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("Failed to read package index {}", path.display()))
}
