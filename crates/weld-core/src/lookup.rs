//! Provider lookup
//!
//! Given a dependency, find the one declaration in its package that can
//! construct it: an exported function returning `T` or `(T, error)`, or, when
//! no such function exists, an exported struct built with a composite literal.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dependency::TypeRef;
use crate::error::{Chain, InjectError};
use crate::package::{Package, PackageSource, TypeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// A constructor function call
    Function,
    /// A struct composite literal
    Struct,
}

/// One value a provider needs before it can run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    /// Struct field receiving the value (struct providers only)
    pub field: Option<String>,
    pub dependency: TypeRef,
}

/// A located constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    pub import: String,
    /// Go package name used to qualify the constructor
    pub package: String,
    /// Function name, or type name for struct providers
    pub name: String,
    pub kind: ProviderKind,
    pub inputs: Vec<Input>,
    /// The type the provider produces, including indirection
    pub result: TypeRef,
    pub fallible: bool,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ProviderKind::Function => write!(f, "{}.{}", self.package, self.name),
            ProviderKind::Struct => {
                let amp = if self.result.is_pointer() { "&" } else { "" };
                write!(f, "{}{}.{}{{}}", amp, self.package, self.name)
            }
        }
    }
}

/// Provider lookup with a cache local to one resolution
pub struct Lookup<'a, S: ?Sized> {
    source: &'a S,
    cache: HashMap<TypeRef, Arc<Provider>>,
}

impl<'a, S: PackageSource + ?Sized> Lookup<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    /// Find the provider for `dependency`
    ///
    /// `path` is the chain of dependencies that required it, for diagnostics.
    pub fn find(&mut self, dependency: &TypeRef, path: &[TypeRef]) -> Result<Arc<Provider>, InjectError> {
        if let Some(cached) = self.cache.get(dependency) {
            tracing::trace!("Lookup: cache hit for {}", dependency);
            return Ok(Arc::clone(cached));
        }

        if dependency.is_builtin() {
            return Err(InjectError::NotFound {
                dependency: dependency.clone(),
                chain: Chain::from(path),
            });
        }

        let package = self
            .source
            .package(dependency.import())
            .ok_or_else(|| InjectError::UnknownPackage {
                import: dependency.import().to_string(),
                dependency: dependency.clone(),
                chain: Chain::from(path),
            })?;

        let provider = match Self::function_provider(package, dependency, path)? {
            Some(provider) => provider,
            None => Self::struct_provider(package, dependency).ok_or_else(|| InjectError::NotFound {
                dependency: dependency.clone(),
                chain: Chain::from(path),
            })?,
        };

        tracing::debug!("Lookup: {} is provided by {}", dependency, provider);
        let provider = Arc::new(provider);
        self.cache.insert(dependency.clone(), Arc::clone(&provider));
        Ok(provider)
    }

    fn function_provider(
        package: &Package,
        dependency: &TypeRef,
        path: &[TypeRef],
    ) -> Result<Option<Provider>, InjectError> {
        let mut candidates: Vec<_> = package
            .functions
            .iter()
            .filter(|f| f.is_exported())
            .filter_map(|f| {
                f.constructs()
                    .filter(|(result, _)| result.same_base(dependency))
                    .map(|(result, fallible)| (f, result, fallible))
            })
            .collect();

        if candidates.len() > 1 {
            let package_name = package.package_name();
            let mut names: Vec<String> = candidates
                .iter()
                .map(|(f, _, _)| format!("{}.{}", package_name, f.name))
                .collect();
            names.sort();
            return Err(InjectError::Ambiguous {
                dependency: dependency.clone(),
                candidates: names,
                chain: Chain::from(path),
            });
        }

        Ok(candidates.pop().map(|(decl, result, fallible)| Provider {
            import: package.import.clone(),
            package: package.package_name(),
            name: decl.name.clone(),
            kind: ProviderKind::Function,
            inputs: decl
                .params
                .iter()
                .map(|param| Input {
                    field: None,
                    dependency: param.clone(),
                })
                .collect(),
            result: result.clone(),
            fallible,
        }))
    }

    fn struct_provider(package: &Package, dependency: &TypeRef) -> Option<Provider> {
        let decl = package
            .type_decl(dependency.name())
            .filter(|decl| decl.is_exported() && decl.kind == TypeKind::Struct)?;

        let inputs = decl
            .fields
            .iter()
            .filter(|field| field.is_exported() && !field.ty.is_builtin())
            .map(|field| Input {
                field: Some(field.name.clone()),
                dependency: field.ty.clone(),
            })
            .collect();

        Some(Provider {
            import: package.import.clone(),
            package: package.package_name(),
            name: decl.name.clone(),
            kind: ProviderKind::Struct,
            inputs,
            result: dependency.clone(),
            fallible: false,
        })
    }
}
