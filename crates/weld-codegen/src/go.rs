//! Go code generator
//!
//! Emits one function per resolved [`Graph`]: a binding per provider node in
//! the graph's order, an early return after every fallible call, and a final
//! return of the requested values.
//!
//! ```text
//! func Load() (http.Server, error) {
//! 	dbConn, err := db.New()
//! 	if err != nil {
//! 		return http.Server{}, err
//! 	}
//! 	logLogger := log.New()
//! 	httpServer := http.NewServer(dbConn, logLogger)
//! 	return *httpServer, nil
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write};

use weld_core::naming;
use weld_core::{ErrorSource, Graph, Node, NodeId, Output, PackageSource, Provider, ProviderKind, TypeKind, TypeRef};

use crate::import_tracker::{ImportStats, ImportTracker};
use crate::{Codegen, CodegenError};

const HEADER: &str = "// Code generated by weld. DO NOT EDIT.";

/// One entry of the artifact's import block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub alias: String,
    pub path: String,
}

/// A generated function together with what it needs to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Name of the target package
    pub package: String,
    /// Imports used by the function, sorted by path
    pub imports: Vec<Import>,
    /// The function declaration
    pub function: String,
}

impl Artifact {
    /// The complete source file
    pub fn file(&self) -> String {
        let mut file = format!("{}\n\npackage {}\n\n", HEADER, self.package);
        if !self.imports.is_empty() {
            file.push_str("import (\n");
            for import in &self.imports {
                file.push_str(&format!("\t{} \"{}\"\n", import.alias, import.path));
            }
            file.push_str(")\n\n");
        }
        file.push_str(&self.function);
        file
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file())
    }
}

/// Go generator backed by the package metadata used for resolution
pub struct GoCodegen<'a, S: ?Sized> {
    source: &'a S,
    imports: ImportTracker,
}

impl<'a, S: PackageSource + ?Sized> GoCodegen<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            imports: ImportTracker::new(""),
        }
    }

    /// Imports of the most recently generated function
    pub fn import_stats(&self) -> ImportStats {
        self.imports.stats()
    }

    /// Go spelling of `ty` as seen from the target package
    fn type_expr(&mut self, ty: &TypeRef) -> String {
        let star = if ty.is_pointer() { "*" } else { "" };
        match self.qualifier(ty) {
            Some(alias) => format!("{}{}.{}", star, alias, ty.name()),
            None => format!("{}{}", star, ty.name()),
        }
    }

    fn qualifier(&mut self, ty: &TypeRef) -> Option<String> {
        let package_name = self.source.package_name(ty.import());
        self.imports.add_type_reference(ty.import(), &package_name, ty.name())
    }

    /// Zero value of `ty`, used for the results skipped by an early return
    fn zero_value(&mut self, ty: &TypeRef) -> String {
        if ty.is_pointer() {
            return "nil".to_string();
        }
        if ty.is_builtin() {
            return builtin_zero(ty.name()).to_string();
        }

        let kind = self.source.type_decl(ty).map(|decl| decl.kind);
        match kind {
            Some(kind) if kind.is_nilable() => "nil".to_string(),
            Some(TypeKind::Struct) => format!("{}{{}}", self.type_expr(ty)),
            Some(TypeKind::String) => "\"\"".to_string(),
            Some(TypeKind::Bool) => "false".to_string(),
            Some(TypeKind::Number) => "0".to_string(),
            _ => format!("*new({})", self.type_expr(ty)),
        }
    }

    /// The constructor invocation for `provider` with already bound `args`
    fn call(&mut self, provider: &Provider, args: &[(Option<String>, String)]) -> String {
        let qualifier = self.imports.add_import(&provider.import, &provider.package);
        let name = match qualifier {
            Some(alias) => format!("{}.{}", alias, provider.name),
            None => provider.name.clone(),
        };

        match provider.kind {
            ProviderKind::Function => {
                let args: Vec<&str> = args.iter().map(|(_, value)| value.as_str()).collect();
                format!("{}({})", name, args.join(", "))
            }
            ProviderKind::Struct => {
                let fields: Vec<String> = args
                    .iter()
                    .map(|(field, value)| match field {
                        Some(field) => format!("{}: {}", field, value),
                        None => value.clone(),
                    })
                    .collect();
                let amp = if provider.result.is_pointer() { "&" } else { "" };
                format!("{}{}{{{}}}", amp, name, fields.join(", "))
            }
        }
    }
}

/// Zero value of a predeclared Go type
fn builtin_zero(name: &str) -> &'static str {
    match name {
        "string" => "\"\"",
        "bool" => "false",
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" | "uintptr" | "float32" | "float64" | "byte" | "rune" | "complex64"
        | "complex128" => "0",
        _ => "nil",
    }
}

/// Adapt a bound value to the indirection a consumer wants
fn adapt(binding: &str, produced: Option<&TypeRef>, wanted: &TypeRef) -> String {
    match produced.map(TypeRef::is_pointer) {
        Some(true) if !wanted.is_pointer() => format!("*{}", binding),
        Some(false) if wanted.is_pointer() => format!("&{}", binding),
        _ => binding.to_string(),
    }
}

/// Local variable names, unique within one function
struct Names {
    used: HashSet<String>,
}

impl Names {
    fn new() -> Self {
        let mut used = HashSet::new();
        used.insert("err".to_string());
        Self { used }
    }

    fn fresh(&mut self, base: &str, imports: &ImportTracker) -> String {
        let mut name = base.to_string();
        let mut suffix = 2;
        while self.used.contains(&name) || imports.is_alias(&name) {
            name = format!("{}{}", base, suffix);
            suffix += 1;
        }
        self.used.insert(name.clone());
        name
    }
}

impl<'a, S: PackageSource + ?Sized> Codegen for GoCodegen<'a, S> {
    fn generate(&mut self, graph: &Graph) -> Result<Artifact, CodegenError> {
        self.imports.reset(graph.target());
        let mut names = Names::new();
        let mut bindings: HashMap<NodeId, String> = HashMap::new();

        // Signature first so its types claim aliases in declaration order
        let mut params = Vec::with_capacity(graph.params().len());
        for &id in graph.params() {
            let dependency = graph
                .node(id)
                .dependency()
                .ok_or_else(|| CodegenError::Generation("external node without a type".to_string()))?;
            let ty = self.type_expr(dependency);
            let package_name = self.source.package_name(dependency.import());
            let package = if dependency.is_builtin() { "" } else { package_name.as_str() };
            let name = names.fresh(&naming::variable_name(package, dependency.name()), &self.imports);
            params.push(format!("{} {}", name, ty));
            bindings.insert(id, name);
        }

        let results: Vec<String> = graph
            .outputs()
            .iter()
            .map(|output| match output {
                Output::Value { requested, .. } => self.type_expr(requested),
                Output::Error(_) => "error".to_string(),
            })
            .collect();

        // Results skipped by an early return
        let mut zeros = Vec::with_capacity(results.len());
        for output in graph.outputs() {
            zeros.push(match output {
                Output::Value { requested, .. } => self.zero_value(requested),
                Output::Error(_) => "err".to_string(),
            });
        }
        let has_error_result = graph.outputs().iter().any(|o| matches!(o, Output::Error(_)));

        let mut body = String::new();
        for &id in graph.order() {
            let (dependency, provider) = match graph.node(id) {
                Node::Provider {
                    dependency,
                    provider,
                } => (dependency, provider),
                Node::External { .. } | Node::ZeroError => continue,
            };

            let mut args = Vec::with_capacity(provider.inputs.len());
            for (child, edge) in graph.children(id) {
                let binding = bindings.get(&child).ok_or_else(|| {
                    CodegenError::Generation(format!("{} used before it is bound", edge.resolved))
                })?;
                let field = provider.inputs.get(edge.position).and_then(|input| input.field.clone());
                args.push((field, adapt(binding, graph.node(child).produces(), &edge.resolved)));
            }

            let call = self.call(provider, &args);
            let name = names.fresh(
                &naming::variable_name(&provider.package, dependency.name()),
                &self.imports,
            );

            if provider.fallible {
                if !has_error_result {
                    return Err(CodegenError::Generation(format!(
                        "{} can fail but {} has no error result",
                        provider,
                        graph.name()
                    )));
                }
                writeln!(body, "\t{}, err := {}", name, call)?;
                writeln!(body, "\tif err != nil {{")?;
                writeln!(body, "\t\treturn {}", zeros.join(", "))?;
                writeln!(body, "\t}}")?;
            } else {
                writeln!(body, "\t{} := {}", name, call)?;
            }
            tracing::trace!("GoCodegen: bound {} to {}", dependency, name);
            bindings.insert(id, name);
        }

        if !graph.outputs().is_empty() {
            let mut values = Vec::with_capacity(graph.outputs().len());
            for output in graph.outputs() {
                values.push(match output {
                    Output::Value { node, resolved, .. } => {
                        let binding = bindings.get(node).ok_or_else(|| {
                            CodegenError::Generation(format!("result {} is never bound", resolved))
                        })?;
                        adapt(binding, graph.node(*node).produces(), resolved)
                    }
                    Output::Error(ErrorSource::Propagated) | Output::Error(ErrorSource::Zero(_)) => {
                        "nil".to_string()
                    }
                });
            }
            writeln!(body, "\treturn {}", values.join(", "))?;
        }

        let signature = match results.as_slice() {
            [] => String::new(),
            [only] => format!(" {}", only),
            many => format!(" ({})", many.join(", ")),
        };

        let mut function = String::new();
        writeln!(function, "func {}({}){} {{", graph.name(), params.join(", "), signature)?;
        function.push_str(&body);
        writeln!(function, "}}")?;

        let imports = self
            .imports
            .all_imports()
            .into_iter()
            .map(|info| Import {
                alias: info.alias.clone(),
                path: info.path.clone(),
            })
            .collect();
        let stats = self.imports.stats();
        tracing::debug!(
            "GoCodegen: generated {} with {} bindings and {} imports ({} renamed)",
            graph.name(),
            bindings.len(),
            stats.imports,
            stats.renamed
        );

        Ok(Artifact {
            package: self.source.package_name(graph.target()),
            imports,
            function,
        })
    }
}
